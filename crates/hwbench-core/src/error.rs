/*!
 * Error types for the hwbench core crate.
 */
use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration loading and runtime setup
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration could not be parsed or assembled
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configuration file was named but does not exist
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Runtime setup error (logging and the like)
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hwbench core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config<S: AsRef<str>>(msg: S) -> Self {
        Error::Config(msg.as_ref().to_string())
    }

    /// Create a new runtime error
    pub fn runtime<S: AsRef<str>>(msg: S) -> Self {
        Error::Runtime(msg.as_ref().to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
