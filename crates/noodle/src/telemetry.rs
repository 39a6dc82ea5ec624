//! Log output for the `noodle` binary.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `default_filter`; a malformed filter falls back to
/// `info`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(default_filter: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_names(true))
        .try_init()
}
