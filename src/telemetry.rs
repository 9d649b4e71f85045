//! Logging initialization (§6 "Observability"). Structured `tracing` output
//! to stdout using the project's target-first event format, filtered by
//! `RUST_LOG` (defaults to `info`).

use tracing_subscriber::EnvFilter;

use crate::log_format::TargetFirstFormat;

/// Installs the global `tracing` subscriber. Must be called once, before any
/// other component logs.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(TargetFirstFormat)
        .init();
}
