//! Logging setup
//!
//! Installs a global tracing subscriber writing to stderr, so progress
//! bars and tables on stdout stay readable. The filter comes from `RUST_LOG`
//! when set, otherwise `info` (or `debug` with `--verbose`).

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to set the global tracing subscriber.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Initialize tracing. Call once at startup.
pub fn init(verbose: bool) -> Result<(), LoggingError> {
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let subscriber = Registry::default()
        .with(build_env_filter(verbose))
        .with(stderr_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::debug!("logging initialized");
    Ok(())
}

fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn build_env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbose)))
}
