//! Domain models shared by the service and the client: sequence records and their provenance.

use serde::{Deserialize, Serialize};

/// Where did a stored sequence come from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SequenceSource {
  ConfigBank,  // from user-provided TOML bank
  Created,     // created at runtime through the admin API
  Seed,        // built-in defaults (last resort)
}
impl Default for SequenceSource {
  fn default() -> Self { SequenceSource::Created }
}

/// Core sequence record persisted in-memory.
///
/// `expression` is what the generator evaluates; `formula` and `fun_fact`
/// hold LaTeX source that clients display verbatim.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SequenceInfo {
  pub text_id: String,
  pub name: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub formula: String,
  pub expression: String,
  #[serde(default)] pub color: String,
  #[serde(default)] pub fun_fact: String,
  #[serde(default)] pub seed: Vec<i64>,
  #[serde(default)] pub source: SequenceSource,
}
