/*!
 * Logging functionality for hwbench.
 *
 * Diagnostics are written to stderr: stdout is reserved for command results.
 */
use std::env;

use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use crate::error::{Error, Result};

/// Handle to the filter of the installed subscriber
///
/// Logging is set up before the configuration is loaded, so the configured
/// level is applied afterwards through this handle.
#[derive(Debug, Clone)]
pub struct FilterHandle {
    inner: reload::Handle<EnvFilter, Registry>,
}

impl FilterHandle {
    /// Replace the active filter.
    ///
    /// Does nothing when `RUST_LOG` is set, since it takes precedence.
    pub fn set_filter(&self, filter: &str) -> Result<()> {
        if env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
            return Ok(());
        }

        self.inner
            .reload(EnvFilter::new(filter))
            .map_err(|e| Error::runtime(format!("Failed to change log filter: {}", e)))
    }
}

/// Initialize the logging system with a specific filter
///
/// `RUST_LOG`, when set, takes precedence over `filter`.
///
/// # Arguments
///
/// * `filter` - The log filter string (e.g., "info", "debug", "hwbench_engine=trace")
pub fn init_with_filter(filter: &str) -> Result<FilterHandle> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let (filter, inner) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| Error::runtime(format!("Failed to initialize logging: {}", e)))?;

    Ok(FilterHandle { inner })
}

/// A type alias for a tracing span
pub type Span = tracing::Span;

/// Create a span covering one command of a bench session
///
/// # Arguments
///
/// * `verb` - The command verb
/// * `sequence` - Position of the command in submission order
pub fn command_span(verb: &str, sequence: u64) -> Span {
    tracing::debug_span!("command", verb = %verb, seq = sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        // Only the first initialization in the process succeeds
        if let Ok(handle) = init_with_filter("warn") {
            assert!(handle.set_filter("debug").is_ok());
        }
        assert!(init_with_filter("debug").is_err());
    }

    #[test]
    fn test_command_span() {
        let span = command_span("addDev", 3);
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "command");
        }
    }
}
