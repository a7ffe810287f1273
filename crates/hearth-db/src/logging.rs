//! # Logging
//!
//! Tracing subscriber setup shared by binaries.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages (per-row repository work)
//! - `RUST_LOG=hearth_db=trace` - Trace for the database crate only
//! - Otherwise the `[logging] filter` from [`crate::config::HearthConfig`]

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns `false` if a
/// subscriber was already installed (tests, embedding applications).
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
