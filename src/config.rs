//! Loading service configuration (server, admin auth, sequence bank) from TOML.
//!
//! See `AppConfig` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub server: ServerCfg,
  #[serde(default)]
  pub auth: AuthCfg,
  #[serde(default)]
  pub sequences: Vec<SequenceCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerCfg {
  /// Listen port; the PORT env variable and the --port flag take precedence.
  #[serde(default = "default_port")]
  pub port: u16,
  /// Upper bound accepted for the generate endpoint's `count` query.
  #[serde(default = "default_generate_cap")]
  pub generate_cap: u32,
}

impl Default for ServerCfg {
  fn default() -> Self {
    Self { port: default_port(), generate_cap: default_generate_cap() }
  }
}

fn default_port() -> u16 {
  3000
}

fn default_generate_cap() -> u32 {
  10_000
}

/// Admin auth settings. Login stays disabled until a password digest is
/// provided here or through the environment (see `AdminAuth::from_sources`).
#[derive(Clone, Debug, Deserialize, Default)]
pub struct AuthCfg {
  /// Hex SHA-256 digest of the admin password.
  #[serde(default)]
  pub password_sha256: Option<String>,
  /// HS256 signing secret for session tokens.
  #[serde(default)]
  pub token_secret: Option<String>,
  /// Token lifetime in seconds (default one day).
  #[serde(default)]
  pub token_ttl_secs: Option<u64>,
}

/// Sequence entry accepted in TOML configuration.
/// Only `name` and `expression` are required; everything else has a fallback.
#[derive(Clone, Debug, Deserialize)]
pub struct SequenceCfg {
  #[serde(default)] pub id: Option<String>,
  pub name: String,
  #[serde(default)] pub description: Option<String>,
  #[serde(default)] pub formula: Option<String>,
  pub expression: String,
  #[serde(default)] pub color: Option<String>,
  #[serde(default)] pub fun_fact: Option<String>,
  #[serde(default)] pub seed: Option<Vec<i64>>,
}

/// Attempt to load `AppConfig` from SEQDRILL_CONFIG. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("SEQDRILL_CONFIG").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "seqdrill", %path, "Loaded service config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "seqdrill", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "seqdrill", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
