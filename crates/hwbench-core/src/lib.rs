/*!
 * hwbench Core
 *
 * This crate provides the shared foundation of the hwbench simulator:
 * the error type, the bench configuration and its loader, and logging setup.
 */

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod prelude;

pub use config::{BenchConfig, Config, ConfigBuilder, LoggingConfig};
pub use error::{Error, Result};

/// hwbench core crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
