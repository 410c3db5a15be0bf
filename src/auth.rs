//! Admin authentication: password digest check and HS256 session tokens.
//!
//! Login compares a SHA-256 digest of the submitted password against the
//! configured digest and mints a short-lived JWT. Mutating sequence routes
//! verify that token. When no digest is configured the whole admin surface
//! stays disabled.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::config::AuthCfg;

/// Claims carried by an admin session token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
  pub sub: String,
  pub exp: u64,
  pub iat: u64,
}

/// Admin auth material resolved once at startup.
#[derive(Clone)]
pub struct AdminAuth {
  password_sha256: String,
  token_secret: String,
  token_ttl_secs: u64,
}

impl AdminAuth {
  /// Resolve auth settings from config with environment overrides
  /// (SEQDRILL_ADMIN_SHA256, SEQDRILL_TOKEN_SECRET, SEQDRILL_TOKEN_TTL_SECS).
  /// Returns None when no password digest is available anywhere.
  pub fn from_sources(cfg: &AuthCfg) -> Option<AdminAuth> {
    let password_sha256 = std::env::var("SEQDRILL_ADMIN_SHA256")
      .ok()
      .or_else(|| cfg.password_sha256.clone())?
      .to_lowercase();
    let token_secret = std::env::var("SEQDRILL_TOKEN_SECRET")
      .ok()
      .or_else(|| cfg.token_secret.clone())
      .unwrap_or_else(|| {
        warn!(
          target: "seqdrill",
          "No token secret configured; using a per-process secret, sessions will not survive a restart"
        );
        uuid::Uuid::new_v4().to_string()
      });
    let token_ttl_secs = std::env::var("SEQDRILL_TOKEN_TTL_SECS")
      .ok()
      .and_then(|v| v.parse::<u64>().ok())
      .or(cfg.token_ttl_secs)
      .unwrap_or(86_400);
    Some(AdminAuth { password_sha256, token_secret, token_ttl_secs })
  }

  /// Check the password and mint a session token.
  pub fn login(&self, password: &str) -> Result<String, String> {
    if password_digest(password) != self.password_sha256 {
      return Err("Invalid password".to_string());
    }
    let now = now_secs()?;
    let claims =
      Claims { sub: "admin".to_string(), exp: now + self.token_ttl_secs, iat: now };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(self.token_secret.as_bytes()))
      .map_err(|e| e.to_string())
  }

  /// Verify a bearer token (signature and expiry).
  pub fn verify(&self, token: &str) -> Result<Claims, String> {
    decode::<Claims>(
      token,
      &DecodingKey::from_secret(self.token_secret.as_bytes()),
      &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
  }
}

/// Hex SHA-256 of a password, the format stored in config.
pub fn password_digest(password: &str) -> String {
  format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn now_secs() -> Result<u64, String> {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs())
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn auth_for(password: &str) -> AdminAuth {
    AdminAuth {
      password_sha256: password_digest(password),
      token_secret: "test-secret".to_string(),
      token_ttl_secs: 600,
    }
  }

  #[test]
  fn digest_matches_the_known_vector() {
    assert_eq!(
      password_digest("admin"),
      "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918"
    );
  }

  #[test]
  fn login_mints_a_verifiable_token() {
    let auth = auth_for("hunter2");
    let token = auth.login("hunter2").expect("login");
    let claims = auth.verify(&token).expect("verify");
    assert_eq!(claims.sub, "admin");
    assert_eq!(claims.exp, claims.iat + 600);
  }

  #[test]
  fn wrong_password_is_rejected() {
    let auth = auth_for("hunter2");
    assert_eq!(auth.login("*******"), Err("Invalid password".to_string()));
  }

  #[test]
  fn expired_tokens_fail_verification() {
    let auth = auth_for("hunter2");
    let now = now_secs().expect("clock");
    // Expired an hour ago, well past the default validation leeway.
    let claims = Claims { sub: "admin".to_string(), exp: now - 3_600, iat: now - 7_200 };
    let token = encode(
      &Header::default(),
      &claims,
      &EncodingKey::from_secret("test-secret".as_bytes()),
    )
    .expect("encode");
    assert!(auth.verify(&token).is_err());
  }

  #[test]
  fn tokens_from_another_secret_fail_verification() {
    let auth = auth_for("hunter2");
    let token = auth.login("hunter2").expect("login");
    let other = AdminAuth {
      password_sha256: password_digest("hunter2"),
      token_secret: "other-secret".to_string(),
      token_ttl_secs: 600,
    };
    assert!(other.verify(&token).is_err());
  }

  #[test]
  fn from_sources_requires_a_digest() {
    let cfg = crate::config::AuthCfg::default();
    assert!(AdminAuth::from_sources(&cfg).is_none());

    let cfg = crate::config::AuthCfg {
      password_sha256: Some(password_digest("hunter2").to_uppercase()),
      token_secret: Some("s".to_string()),
      token_ttl_secs: Some(60),
    };
    let auth = AdminAuth::from_sources(&cfg).expect("auth");
    assert!(auth.login("hunter2").is_ok());
  }
}
