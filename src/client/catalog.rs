//! Local snapshot of the server's sequence catalog.
//!
//! The CLI pulls the id list first, then fans out one descriptor fetch per
//! id. A sequence whose descriptor cannot be loaded is skipped with a
//! warning instead of failing the whole catalog.

use futures::future::join_all;
use tracing::{info, warn};

use crate::client::api::ApiClient;
use crate::protocol::SequenceOut;

#[derive(Debug, Default)]
pub struct Catalog {
  pub sequences: Vec<SequenceOut>,
}

impl Catalog {
  pub fn get(&self, id: &str) -> Option<&SequenceOut> {
    self.sequences.iter().find(|s| s.text_id == id)
  }

  /// First listed sequence with a loaded descriptor; the default selection.
  pub fn default_sequence(&self) -> Option<&SequenceOut> {
    self.sequences.first()
  }

  pub fn ids(&self) -> Vec<&str> {
    self.sequences.iter().map(|s| s.text_id.as_str()).collect()
  }

  pub fn is_empty(&self) -> bool {
    self.sequences.is_empty()
  }
}

pub async fn load_catalog(api: &ApiClient) -> Catalog {
  let ids = match api.list_sequences().await {
    Ok(ids) => ids,
    Err(e) => {
      warn!(target: "seqdrill", error = %e, "Could not list sequences.");
      return Catalog::default();
    }
  };

  let fetches = ids.iter().map(|id| api.get_sequence(id));
  let mut sequences = Vec::with_capacity(ids.len());
  for (id, fetched) in ids.iter().zip(join_all(fetches).await) {
    match fetched {
      Ok(seq) => sequences.push(seq),
      Err(e) => {
        warn!(target: "seqdrill", %id, error = %e, "Skipping sequence: descriptor fetch failed.");
      }
    }
  }
  info!(target: "seqdrill", loaded = sequences.len(), "Catalog loaded.");
  Catalog { sequences }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  use crate::config::AppConfig;
  use crate::routes::build_router;
  use crate::state::AppState;

  async fn spawn_server() -> String {
    let state = Arc::new(AppState::from_config(&AppConfig::default()));
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
      axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}", addr)
  }

  #[tokio::test]
  async fn loads_every_builtin_descriptor() {
    let base = spawn_server().await;
    let api = ApiClient::new(&base).expect("client");

    let catalog = load_catalog(&api).await;
    assert_eq!(catalog.sequences.len(), 5);
    assert!(catalog.get("fibonacci").is_some());
    assert!(catalog.get("missing").is_none());
    assert!(catalog.ids().contains(&"odd"));
    // ids come back sorted, so the default selection is deterministic
    assert_eq!(catalog.default_sequence().map(|s| s.text_id.as_str()), Some("even"));
  }

  #[tokio::test]
  async fn unreachable_server_yields_an_empty_catalog() {
    let api = ApiClient::new("http://127.0.0.1:1").expect("client");
    let catalog = load_catalog(&api).await;
    assert!(catalog.is_empty());
  }
}
