//! Structured logging initialisation.
//!
//! Sets up the `tracing` subscriber used by the binary and the
//! integration tests: an `EnvFilter` (so `RUST_LOG` keeps working)
//! with a JSON fmt layer for machine-readable output in production.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with structured tracing.
///
/// # Arguments
///
/// * `log_level` - Log level: "trace", "debug", "info", "warn", "error".
///   Parsed case-insensitively; anything else falls back to `info`.
///   `RUST_LOG`, when set, wins over this value.
pub fn init_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
