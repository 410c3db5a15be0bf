//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve service and clients independently.

use serde::{Deserialize, Serialize};

use crate::domain::SequenceInfo;

/// DTO used for sequence delivery; the CLI client reads the same shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SequenceOut {
    pub text_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub fun_fact: String,
    #[serde(default)]
    pub seed: Vec<i64>,
}

/// Convert the internal record to the public DTO.
pub fn to_out(s: &SequenceInfo) -> SequenceOut {
    SequenceOut {
        text_id: s.text_id.clone(),
        name: s.name.clone(),
        description: s.description.clone(),
        formula: s.formula.clone(),
        expression: s.expression.clone(),
        color: s.color.clone(),
        fun_fact: s.fun_fact.clone(),
        seed: s.seed.clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateOut {
    pub result: Vec<serde_json::Value>,
    pub sequence: SequenceOut,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SequenceCreateIn {
    /// Explicit text id; derived from the name when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub formula: String,
    pub expression: String,
    pub color: String,
    #[serde(default)]
    pub fun_fact: Option<String>,
    #[serde(default)]
    pub seed: Option<Vec<i64>>,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SequenceUpdateIn {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub fun_fact: Option<String>,
    #[serde(default)]
    pub seed: Option<Vec<i64>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginIn {
    pub password: String,
}
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginOut {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateOut {
    pub valid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct HealthOut {
    pub ok: bool,
}
