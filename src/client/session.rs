//! Admin token persistence between CLI invocations.
//!
//! The token minted by `/auth/login` is written to a small file so that
//! `admin create` and friends work without logging in every time. On load
//! the token's `exp` claim is inspected (no signature check, the server
//! does that) and stale files are discarded.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use tracing::{info, warn};

pub struct AdminSession {
  token: Option<String>,
  path: PathBuf,
}

impl AdminSession {
  pub fn load(path: PathBuf) -> Self {
    let token = match std::fs::read_to_string(&path) {
      Ok(raw) => {
        let tok = raw.trim().to_string();
        if tok.is_empty() {
          None
        } else {
          match token_expiry(&tok) {
            Some(exp) if exp > now_secs() => Some(tok),
            _ => {
              warn!(target: "seqdrill", path = %path.display(), "Stored admin token expired or unreadable; removing.");
              let _ = std::fs::remove_file(&path);
              None
            }
          }
        }
      }
      Err(_) => None,
    };
    Self { token, path }
  }

  pub fn token(&self) -> Option<&str> {
    self.token.as_deref()
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn set_token(&mut self, token: &str) -> Result<(), String> {
    if let Some(parent) = self.path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
      }
    }
    write_token_file(&self.path, token).map_err(|e| e.to_string())?;
    self.token = Some(token.to_string());
    info!(target: "seqdrill", path = %self.path.display(), "Admin token saved.");
    Ok(())
  }

  pub fn clear(&mut self) -> Result<(), String> {
    if self.path.exists() {
      std::fs::remove_file(&self.path).map_err(|e| e.to_string())?;
    }
    self.token = None;
    Ok(())
  }
}

/// The token is a credential: recreate the file so it is owner-only
/// (0600) even when an older, looser file is already there.
#[cfg(unix)]
fn write_token_file(path: &Path, token: &str) -> std::io::Result<()> {
  use std::io::Write as _;
  use std::os::unix::fs::OpenOptionsExt;

  let _ = std::fs::remove_file(path);
  let mut file = std::fs::OpenOptions::new()
    .write(true)
    .create_new(true)
    .mode(0o600)
    .open(path)?;
  file.write_all(token.as_bytes())
}

#[cfg(not(unix))]
fn write_token_file(path: &Path, token: &str) -> std::io::Result<()> {
  std::fs::write(path, token)
}

/// Where the admin token lives: `SEQDRILL_TOKEN_FILE`, else
/// `$HOME/.seqdrill/token`, else a dotfile in the working directory.
pub fn default_token_path() -> PathBuf {
  if let Ok(p) = std::env::var("SEQDRILL_TOKEN_FILE") {
    if !p.is_empty() {
      return PathBuf::from(p);
    }
  }
  if let Ok(home) = std::env::var("HOME") {
    if !home.is_empty() {
      return PathBuf::from(home).join(".seqdrill").join("token");
    }
  }
  PathBuf::from(".seqdrill-token")
}

/// Pull the `exp` claim out of a JWT without verifying the signature.
fn token_expiry(token: &str) -> Option<u64> {
  #[derive(Deserialize)]
  struct TokenPayload {
    exp: u64,
  }
  let payload = token.split('.').nth(1)?;
  let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
  let parsed: TokenPayload = serde_json::from_slice(&bytes).ok()?;
  Some(parsed.exp)
}

fn now_secs() -> u64 {
  std::time::SystemTime::now()
    .duration_since(std::time::UNIX_EPOCH)
    .map(|d| d.as_secs())
    .unwrap_or(0)
}
