//! HTTP endpoint handlers. These are thin wrappers that forward to the store
//! and the expression engine. Each handler is instrumented and logs basic
//! result info.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::{header, HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, info, instrument, warn};

use crate::domain::{SequenceInfo, SequenceSource};
use crate::expr;
use crate::protocol::*;
use crate::state::AppState;

fn error_response(status: StatusCode, message: &str) -> Response {
  (status, Json(ErrorOut { message: message.to_string() })).into_response()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
}

/// Gate for mutating routes. Err carries the ready-to-send error response.
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
  let auth = match &state.auth {
    Some(auth) => auth,
    None => {
      return Err(error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "Admin auth is not configured",
      ))
    }
  };
  let token = match bearer_token(headers) {
    Some(token) => token,
    None => return Err(error_response(StatusCode::UNAUTHORIZED, "Missing bearer token")),
  };
  match auth.verify(token) {
    Ok(_) => Ok(()),
    Err(e) => {
      warn!(target: "seqdrill", error = %e, "Rejected admin request");
      Err(error_response(StatusCode::UNAUTHORIZED, "Invalid or expired token"))
    }
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_sequences(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.list_ids().await)
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_sequence(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Response {
  match state.get_sequence(&id).await {
    Some(seq) => Json(to_out(&seq)).into_response(),
    None => error_response(StatusCode::NOT_FOUND, "Sequence not found"),
  }
}

#[instrument(level = "info", skip(state), fields(%id, count = q.count))]
pub async fn http_generate_sequence(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Query(q): Query<GenerateQuery>,
) -> Response {
  let seq = match state.get_sequence(&id).await {
    Some(seq) => seq,
    None => return error_response(StatusCode::NOT_FOUND, "Sequence not found"),
  };
  if q.count > state.generate_cap {
    return error_response(
      StatusCode::UNPROCESSABLE_ENTITY,
      &format!("count must be at most {}", state.generate_cap),
    );
  }
  match expr::generate_values(&seq.expression, &seq.seed, q.count as usize) {
    Ok(values) => {
      info!(target: "sequence", %id, count = q.count, "Generated sequence values");
      let result = values.iter().map(expr::Value::to_json).collect();
      Json(GenerateOut { result, sequence: to_out(&seq) }).into_response()
    }
    Err(e) => {
      error!(target: "sequence", %id, error = %e, "Sequence generation failed");
      error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
    }
  }
}

#[instrument(level = "info", skip(state, headers, body), fields(name = %body.name))]
pub async fn http_create_sequence(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<SequenceCreateIn>,
) -> Response {
  if let Err(resp) = require_admin(&state, &headers) {
    return resp;
  }
  if !expr::validate(&body.expression) {
    return error_response(StatusCode::UNPROCESSABLE_ENTITY, "Invalid expression");
  }
  let id = match body.id.as_deref() {
    Some(id) if !id.is_empty() => {
      if state.get_sequence(id).await.is_some() {
        return error_response(StatusCode::CONFLICT, "Sequence id already exists");
      }
      id.to_string()
    }
    _ => state.unique_text_id(&body.name).await,
  };
  let seq = SequenceInfo {
    text_id: id.clone(),
    name: body.name,
    description: body.description,
    formula: body.formula,
    expression: body.expression,
    color: body.color,
    fun_fact: body.fun_fact.unwrap_or_default(),
    seed: body.seed.unwrap_or_default(),
    source: SequenceSource::Created,
  };
  let out = to_out(&seq);
  state.insert_sequence(seq).await;
  info!(target: "sequence", %id, "Sequence created");
  (StatusCode::CREATED, Json(out)).into_response()
}

#[instrument(level = "info", skip(state, headers, body), fields(%id))]
pub async fn http_update_sequence(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(id): Path<String>,
  Json(body): Json<SequenceUpdateIn>,
) -> Response {
  if let Err(resp) = require_admin(&state, &headers) {
    return resp;
  }
  if let Some(expression) = &body.expression {
    if !expr::validate(expression) {
      return error_response(StatusCode::UNPROCESSABLE_ENTITY, "Invalid expression");
    }
  }
  let updated = state
    .update_sequence(&id, |seq| {
      if let Some(name) = body.name {
        seq.name = name;
      }
      if let Some(description) = body.description {
        seq.description = description;
      }
      if let Some(formula) = body.formula {
        seq.formula = formula;
      }
      if let Some(expression) = body.expression {
        seq.expression = expression;
      }
      if let Some(color) = body.color {
        seq.color = color;
      }
      if let Some(fun_fact) = body.fun_fact {
        seq.fun_fact = fun_fact;
      }
      if let Some(seed) = body.seed {
        seq.seed = seed;
      }
    })
    .await;
  match updated {
    Some(seq) => {
      info!(target: "sequence", %id, "Sequence updated");
      Json(to_out(&seq)).into_response()
    }
    None => error_response(StatusCode::NOT_FOUND, "Sequence not found"),
  }
}

#[instrument(level = "info", skip(state, headers), fields(%id))]
pub async fn http_delete_sequence(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(id): Path<String>,
) -> Response {
  if let Err(resp) = require_admin(&state, &headers) {
    return resp;
  }
  if state.remove_sequence(&id).await {
    info!(target: "sequence", %id, "Sequence deleted");
    StatusCode::NO_CONTENT.into_response()
  } else {
    error_response(StatusCode::NOT_FOUND, "Sequence not found")
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_login(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LoginIn>,
) -> Response {
  let auth = match &state.auth {
    Some(auth) => auth,
    None => {
      return error_response(StatusCode::SERVICE_UNAVAILABLE, "Admin auth is not configured")
    }
  };
  match auth.login(&body.password) {
    Ok(token) => {
      info!(target: "seqdrill", "Admin login succeeded");
      Json(LoginOut { token }).into_response()
    }
    Err(_) => {
      warn!(target: "seqdrill", "Admin login rejected");
      error_response(StatusCode::UNAUTHORIZED, "Invalid password")
    }
  }
}

#[instrument(level = "info", skip(body), fields(formula_len = body.len()))]
pub async fn http_validate(body: String) -> impl IntoResponse {
  Json(ValidateOut { valid: expr::validate(&body) })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::auth::password_digest;
  use crate::config::{AppConfig, AuthCfg};
  use crate::routes::build_router;
  use axum::body::Body;
  use axum::http::Request;
  use tower::ServiceExt;

  fn test_state(with_auth: bool) -> Arc<AppState> {
    let mut cfg = AppConfig::default();
    if with_auth {
      cfg.auth = AuthCfg {
        password_sha256: Some(password_digest("hunter2")),
        token_secret: Some("test-secret".to_string()),
        token_ttl_secs: Some(600),
      };
    }
    Arc::new(AppState::from_config(&cfg))
  }

  async fn send(router: &axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = router.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let json = if bytes.is_empty() {
      serde_json::Value::Null
    } else {
      serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
  }

  fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
  }

  fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).expect("request")
  }

  #[tokio::test]
  async fn health_list_and_descriptor() {
    let router = build_router(test_state(false));

    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"ok": true}));

    let (status, body) = send(&router, get("/sequences")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = serde_json::from_value(body).expect("ids");
    assert!(ids.contains(&"fibonacci".to_string()));

    let (status, body) = send(&router, get("/sequences/fibonacci")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text_id"], "fibonacci");
    assert_eq!(body["seed"], serde_json::json!([0, 1]));

    let (status, body) = send(&router, get("/sequences/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Sequence not found");
  }

  #[tokio::test]
  async fn generate_returns_values_and_descriptor() {
    let router = build_router(test_state(false));
    let (status, body) = send(&router, get("/sequences/fibonacci/generate?count=10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], serde_json::json!([0, 1, 1, 2, 3, 5, 8, 13, 21, 34]));
    assert_eq!(body["sequence"]["text_id"], "fibonacci");

    let (status, _) = send(&router, get("/sequences/nope/generate?count=10")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn generate_rejects_counts_over_the_cap() {
    let mut cfg = AppConfig::default();
    cfg.server.generate_cap = 5;
    let router = build_router(Arc::new(AppState::from_config(&cfg)));
    let (status, body) = send(&router, get("/sequences/even/generate?count=6")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "count must be at most 5");
    let (status, _) = send(&router, get("/sequences/even/generate?count=5")).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn validate_endpoint_checks_formulas() {
    let router = build_router(test_state(false));
    let req = Request::builder()
      .method("POST")
      .uri("/validate")
      .body(Body::from("sum(history[n-1], 1)"))
      .expect("request");
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    let req = Request::builder()
      .method("POST")
      .uri("/validate")
      .body(Body::from("((("))
      .expect("request");
    let (_, body) = send(&router, req).await;
    assert_eq!(body["valid"], false);
  }

  #[tokio::test]
  async fn admin_routes_are_disabled_without_a_digest() {
    let router = build_router(test_state(false));
    let (status, body) =
      send(&router, post_json("/auth/login", None, serde_json::json!({"password": "x"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Admin auth is not configured");

    let payload = serde_json::json!({
      "name": "Lucas", "description": "", "formula": "", "expression": "n", "color": "#fff"
    });
    let (status, _) = send(&router, post_json("/sequences", Some("t"), payload)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  }

  #[tokio::test]
  async fn login_then_full_crud_round_trip() {
    let router = build_router(test_state(true));

    let (status, _) =
      send(&router, post_json("/auth/login", None, serde_json::json!({"password": "wrong"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
      send(&router, post_json("/auth/login", None, serde_json::json!({"password": "hunter2"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token").to_string();

    // Create without a token is rejected.
    let payload = serde_json::json!({
      "name": "Triangular Numbers",
      "description": "Sums of the first n naturals.",
      "formula": "a_n = n(n+1)/2",
      "expression": "history[n-1]+n",
      "color": "#f43f5e",
      "seed": [0]
    });
    let (status, _) = send(&router, post_json("/sequences", None, payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&router, post_json("/sequences", Some(&token), payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["text_id"], "triangular-numbers");

    // Generated values flow straight from the stored expression.
    let (_, body) = send(&router, get("/sequences/triangular-numbers/generate?count=6")).await;
    assert_eq!(body["result"], serde_json::json!([0, 1, 3, 6, 10, 15]));

    // Partial update.
    let req = Request::builder()
      .method("PUT")
      .uri("/sequences/triangular-numbers")
      .header(header::CONTENT_TYPE, "application/json")
      .header(header::AUTHORIZATION, format!("Bearer {}", token))
      .body(Body::from(serde_json::json!({"name": "Triangulars"}).to_string()))
      .expect("request");
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Triangulars");
    assert_eq!(body["expression"], "history[n-1]+n");

    // Delete, then the descriptor is gone.
    let req = Request::builder()
      .method("DELETE")
      .uri("/sequences/triangular-numbers")
      .header(header::AUTHORIZATION, format!("Bearer {}", token))
      .body(Body::empty())
      .expect("request");
    let (status, _) = send(&router, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&router, get("/sequences/triangular-numbers")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn create_rejects_duplicates_and_bad_expressions() {
    let router = build_router(test_state(true));
    let (_, body) =
      send(&router, post_json("/auth/login", None, serde_json::json!({"password": "hunter2"})))
        .await;
    let token = body["token"].as_str().expect("token").to_string();

    let dup = serde_json::json!({
      "id": "even", "name": "Even Again", "description": "", "formula": "",
      "expression": "2*n", "color": "#fff"
    });
    let (status, body) = send(&router, post_json("/sequences", Some(&token), dup)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Sequence id already exists");

    let broken = serde_json::json!({
      "name": "Broken", "description": "", "formula": "",
      "expression": "(1+", "color": "#fff"
    });
    let (status, body) = send(&router, post_json("/sequences", Some(&token), broken)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid expression");

    // Name collisions without an explicit id get a uuid suffix instead.
    let named = serde_json::json!({
      "name": "Even", "description": "", "formula": "",
      "expression": "2*n", "color": "#fff"
    });
    let (status, body) = send(&router, post_json("/sequences", Some(&token), named)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["text_id"].as_str().expect("id");
    assert!(id.starts_with("even-"));
  }
}
