//! Minimal HTTP client for the sequence service.
//!
//! Calls are instrumented and log endpoints and statuses (not contents).
//! The bearer token is attached only to admin calls and is never logged.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use tracing::instrument;

use crate::protocol::{
  GenerateOut, LoginIn, LoginOut, SequenceCreateIn, SequenceOut, SequenceUpdateIn, ValidateOut,
};
use crate::util::ellipsize;

#[derive(Clone)]
pub struct ApiClient {
  pub client: reqwest::Client,
  pub base_url: String,
}

impl ApiClient {
  /// Construct a client for the given base URL.
  pub fn new(base_url: &str) -> Result<Self, String> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .map_err(|e| e.to_string())?;
    Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn list_sequences(&self) -> Result<Vec<String>, String> {
    let url = format!("{}/sequences", self.base_url);
    let res = self
      .client
      .get(&url)
      .header(USER_AGENT, "seqdrill/0.1")
      .send()
      .await
      .map_err(|e| e.to_string())?;
    let res = error_for_status(res).await?;
    res.json().await.map_err(|e| e.to_string())
  }

  #[instrument(level = "debug", skip(self), fields(%id))]
  pub async fn get_sequence(&self, id: &str) -> Result<SequenceOut, String> {
    let url = format!("{}/sequences/{}", self.base_url, id);
    let res = self
      .client
      .get(&url)
      .header(USER_AGENT, "seqdrill/0.1")
      .send()
      .await
      .map_err(|e| e.to_string())?;
    let res = error_for_status(res).await?;
    res.json().await.map_err(|e| e.to_string())
  }

  #[instrument(level = "debug", skip(self), fields(%id, count))]
  pub async fn generate(&self, id: &str, count: u32) -> Result<GenerateOut, String> {
    let url = format!("{}/sequences/{}/generate", self.base_url, id);
    let res = self
      .client
      .get(&url)
      .query(&[("count", count)])
      .header(USER_AGENT, "seqdrill/0.1")
      .send()
      .await
      .map_err(|e| e.to_string())?;
    let res = error_for_status(res).await?;
    res.json().await.map_err(|e| e.to_string())
  }

  #[instrument(level = "info", skip(self, password))]
  pub async fn login(&self, password: &str) -> Result<String, String> {
    let url = format!("{}/auth/login", self.base_url);
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "seqdrill/0.1")
      .json(&LoginIn { password: password.to_string() })
      .send()
      .await
      .map_err(|e| e.to_string())?;
    let res = error_for_status(res).await?;
    let out: LoginOut = res.json().await.map_err(|e| e.to_string())?;
    Ok(out.token)
  }

  #[instrument(level = "debug", skip(self, formula), fields(formula_len = formula.len()))]
  pub async fn validate(&self, formula: &str) -> Result<bool, String> {
    let url = format!("{}/validate", self.base_url);
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "seqdrill/0.1")
      .header(CONTENT_TYPE, "text/plain")
      .body(formula.to_string())
      .send()
      .await
      .map_err(|e| e.to_string())?;
    let res = error_for_status(res).await?;
    let out: ValidateOut = res.json().await.map_err(|e| e.to_string())?;
    Ok(out.valid)
  }

  #[instrument(level = "info", skip(self, token, body), fields(name = %body.name))]
  pub async fn create_sequence(
    &self,
    token: &str,
    body: &SequenceCreateIn,
  ) -> Result<SequenceOut, String> {
    let url = format!("{}/sequences", self.base_url);
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "seqdrill/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", token))
      .json(body)
      .send()
      .await
      .map_err(|e| e.to_string())?;
    let res = error_for_status(res).await?;
    res.json().await.map_err(|e| e.to_string())
  }

  #[instrument(level = "info", skip(self, token, body), fields(%id))]
  pub async fn update_sequence(
    &self,
    token: &str,
    id: &str,
    body: &SequenceUpdateIn,
  ) -> Result<SequenceOut, String> {
    let url = format!("{}/sequences/{}", self.base_url, id);
    let res = self
      .client
      .put(&url)
      .header(USER_AGENT, "seqdrill/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", token))
      .json(body)
      .send()
      .await
      .map_err(|e| e.to_string())?;
    let res = error_for_status(res).await?;
    res.json().await.map_err(|e| e.to_string())
  }

  #[instrument(level = "info", skip(self, token), fields(%id))]
  pub async fn delete_sequence(&self, token: &str, id: &str) -> Result<(), String> {
    let url = format!("{}/sequences/{}", self.base_url, id);
    let res = self
      .client
      .delete(&url)
      .header(USER_AGENT, "seqdrill/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", token))
      .send()
      .await
      .map_err(|e| e.to_string())?;
    error_for_status(res).await?;
    Ok(())
  }
}

/// Longest error body carried into a message; the overflow marker from
/// `ellipsize` takes over past this.
const ERROR_BODY_MAX: usize = 300;

/// Collapse error responses into "HTTP <status>: <message>", preferring the
/// service's own message field over the raw body. The body is clipped so an
/// upstream error page cannot flood a one-line message.
async fn error_for_status(res: reqwest::Response) -> Result<reqwest::Response, String> {
  if res.status().is_success() {
    return Ok(res);
  }
  let status = res.status();
  let body = res.text().await.unwrap_or_default();
  let msg = extract_message(&body).unwrap_or(body);
  Err(format!("HTTP {}: {}", status, ellipsize(&msg, ERROR_BODY_MAX)))
}

fn extract_message(body: &str) -> Option<String> {
  #[derive(serde::Deserialize)]
  struct EWrap {
    message: String,
  }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  use crate::auth::password_digest;
  use crate::config::{AppConfig, AuthCfg};
  use crate::routes::build_router;
  use crate::state::AppState;

  async fn spawn_server(cfg: AppConfig) -> String {
    let state = Arc::new(AppState::from_config(&cfg));
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
      axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}", addr)
  }

  fn cfg_with_auth() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth = AuthCfg {
      password_sha256: Some(password_digest("hunter2")),
      token_secret: Some("test-secret".to_string()),
      token_ttl_secs: Some(600),
    };
    cfg
  }

  #[tokio::test]
  async fn lists_and_fetches_descriptors() {
    let base = spawn_server(AppConfig::default()).await;
    let api = ApiClient::new(&base).expect("client");

    let ids = api.list_sequences().await.expect("list");
    assert!(ids.contains(&"squares".to_string()));

    let seq = api.get_sequence("squares").await.expect("get");
    assert_eq!(seq.name, "Perfect Squares");
    assert_eq!(seq.expression, "n^2");

    let err = api.get_sequence("missing").await.expect_err("should fail");
    assert!(err.contains("Sequence not found"), "{}", err);
  }

  #[tokio::test]
  async fn generates_values_through_the_wire() {
    let base = spawn_server(AppConfig::default()).await;
    let api = ApiClient::new(&base).expect("client");

    let out = api.generate("fibonacci", 10).await.expect("generate");
    let values: Vec<i64> = out.result.iter().filter_map(|v| v.as_i64()).collect();
    assert_eq!(values, vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
    assert_eq!(out.sequence.text_id, "fibonacci");
  }

  #[tokio::test]
  async fn validates_formulas() {
    let base = spawn_server(AppConfig::default()).await;
    let api = ApiClient::new(&base).expect("client");
    assert!(api.validate("2*n+1").await.expect("validate"));
    assert!(!api.validate("2*$").await.expect("validate"));
  }

  #[tokio::test]
  async fn admin_flow_end_to_end() {
    let base = spawn_server(cfg_with_auth()).await;
    let api = ApiClient::new(&base).expect("client");

    let err = api.login("wrong").await.expect_err("should fail");
    assert!(err.contains("Invalid password"), "{}", err);
    let token = api.login("hunter2").await.expect("login");

    let created = api
      .create_sequence(
        &token,
        &SequenceCreateIn {
          id: None,
          name: "Triangular Numbers".to_string(),
          description: "Sums of the first n naturals.".to_string(),
          formula: "a_n = n(n+1)/2".to_string(),
          expression: "history[n-1]+n".to_string(),
          color: "#f43f5e".to_string(),
          fun_fact: None,
          seed: Some(vec![0]),
        },
      )
      .await
      .expect("create");
    assert_eq!(created.text_id, "triangular-numbers");

    let updated = api
      .update_sequence(
        &token,
        "triangular-numbers",
        &SequenceUpdateIn { name: Some("Triangulars".to_string()), ..Default::default() },
      )
      .await
      .expect("update");
    assert_eq!(updated.name, "Triangulars");
    assert_eq!(updated.seed, vec![0]);

    api.delete_sequence(&token, "triangular-numbers").await.expect("delete");
    assert!(api.get_sequence("triangular-numbers").await.is_err());

    let err = api
      .delete_sequence("not-a-token", "even")
      .await
      .expect_err("should fail");
    assert!(err.contains("Invalid or expired token"), "{}", err);
  }

  #[tokio::test]
  async fn oversized_error_bodies_are_clipped() {
    use axum::{http::StatusCode, routing::get, Router};

    // Stand-in for a proxy in front of the service: error status, huge
    // non-JSON body.
    let noise = "x".repeat(5000);
    let app = Router::new().route(
      "/sequences",
      get(move || {
        let body = noise.clone();
        async move { (StatusCode::BAD_GATEWAY, body) }
      }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
      axum::serve(listener, app).await.expect("serve");
    });

    let api = ApiClient::new(&format!("http://{}", addr)).expect("client");
    let err = api.list_sequences().await.expect_err("should fail");
    assert!(err.starts_with("HTTP 502"), "{}", err);
    assert!(err.contains("of 5000 bytes"), "{}", err);
    assert!(err.len() < 500, "not clipped: {} bytes", err.len());
  }
}
