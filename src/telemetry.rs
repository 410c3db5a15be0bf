//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter and overrides the per-command default
//!   (e.g. "debug" or directives like "info,sequence=debug,game=debug").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! The server runs chatty by default; the interactive commands default to
//! warnings only so log lines do not interleave with prompts. Targets
//! ("seqdrill", "sequence", "game") disambiguate sources either way.

use tracing_subscriber::EnvFilter;

/// Default directives for `seqdrill serve`.
pub const SERVER_DIRECTIVES: &str =
    "info,sequence=debug,game=debug,seqdrill=debug,tower_http=info,axum=info";

/// Default directives for the interactive client commands.
pub const CLIENT_DIRECTIVES: &str = "warn";

pub fn init_tracing(default_directives: &str) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Choose JSON vs pretty; don't try to store different layer types.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}
