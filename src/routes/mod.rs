//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - sequence catalog, descriptor and generation endpoints (public)
/// - admin login and sequence CRUD (bearer token)
/// - expression validation endpoint
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(http::http_health))
        .route("/sequences", get(http::http_list_sequences).post(http::http_create_sequence))
        .route(
            "/sequences/:id",
            get(http::http_get_sequence)
                .put(http::http_update_sequence)
                .delete(http::http_delete_sequence),
        )
        .route("/sequences/:id/generate", get(http::http_generate_sequence))
        .route("/auth/login", post(http::http_login))
        .route("/validate", post(http::http_validate))
        .with_state(state)
        .layer(cors)
        .layer(trace)
}
