//! Medbook: validated, authenticated medicine records behind a JSON HTTP API.

pub mod api;
pub mod config;
pub mod core_state;
pub mod db;
pub mod identity;
pub mod medicines;
pub mod models;
pub mod validation;

use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber. Logs go to stderr so command
/// output on stdout stays machine-readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}
