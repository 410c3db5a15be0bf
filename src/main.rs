//! Seqdrill · Numeric Sequence Trainer
//!
//! - Axum HTTP API: sequence catalog, value generation, admin CRUD
//! - Terminal client: learn, fill-in-the-blank play, admin editing
//!
//! Important env variables:
//!   PORT                    : u16 (default 3000)
//!   SEQDRILL_API            : base URL for client commands (default "http://127.0.0.1:3000")
//!   SEQDRILL_CONFIG         : path to TOML config (server, auth, sequence bank)
//!   SEQDRILL_TOKEN_FILE     : where the client stores the admin token
//!   SEQDRILL_ADMIN_SHA256   : hex password digest; enables admin login
//!   SEQDRILL_TOKEN_SECRET   : HS256 secret for admin session tokens
//!   SEQDRILL_TOKEN_TTL_SECS : admin token lifetime in seconds (default 86400)
//!   LOG_LEVEL               : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT              : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod expr;
mod auth;
mod seeds;
mod state;
mod protocol;
mod routes;
mod game;
mod client;
mod cli;

use std::{net::SocketAddr, sync::Arc};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::cli::{Cli, Commands};
use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let args = Cli::parse();

  // The server logs verbosely; interactive commands stay quiet unless
  // LOG_LEVEL says otherwise.
  match args.command {
    Commands::Serve { .. } => telemetry::init_tracing(telemetry::SERVER_DIRECTIVES),
    _ => telemetry::init_tracing(telemetry::CLIENT_DIRECTIVES),
  }

  match args.command {
    Commands::Serve { port } => serve(port).await,
    Commands::Learn { sequence } => cli::run_learn(sequence).await,
    Commands::Play { sequence } => cli::run_play(sequence).await,
    Commands::Admin { command } => cli::run_admin(command).await,
    Commands::Validate { expression } => cli::run_validate(&expression).await,
  }
}

/// Run the HTTP API until ctrl-c.
async fn serve(port_flag: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
  // Load TOML config if provided (server settings, auth, sequence bank).
  let cfg = config::load_app_config_from_env().unwrap_or_default();

  // Port precedence: --port flag, then PORT env, then config.
  let port = port_flag
    .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()))
    .unwrap_or(cfg.server.port);

  // Build shared application state (in-memory store, auth material).
  let state = Arc::new(AppState::from_config(&cfg));

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "seqdrill", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if tokio::signal::ctrl_c().await.is_ok() {
    info!(target: "seqdrill", "Shutdown signal received");
  }
}
