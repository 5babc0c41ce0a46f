/*!
 * Prelude module for hwbench core.
 *
 * Re-exports commonly used types so that downstream crates need a single import.
 */

// Re-export error types
pub use crate::error::{Error, Result};

// Re-export config types
pub use crate::config::{BenchConfig, Config, ConfigBuilder, LoggingConfig};

// Re-export logging macros
pub use tracing::{debug, error, info, trace, warn};
