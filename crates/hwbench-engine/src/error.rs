/*!
 * Error types for the hwbench engine crate.
 */
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use hwbench_devices::DeviceError;

/// Error raised while parsing or executing one command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Wrong number of arguments
    #[error("Usage: {usage}")]
    BadArguments {
        /// The expected command form
        usage: &'static str,
    },

    /// An argument that should be an integer is not one
    #[error("Invalid {field} format.")]
    BadInteger {
        /// The argument name
        field: &'static str,
        /// The offending token
        token: String,
    },

    /// The verb is not known
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The command was rejected by the bench
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl CommandError {
    /// Create a new usage error
    pub fn usage(usage: &'static str) -> Self {
        CommandError::BadArguments { usage }
    }

    /// Create a new integer format error
    pub fn bad_integer<S: AsRef<str>>(field: &'static str, token: S) -> Self {
        CommandError::BadInteger {
            field,
            token: token.as_ref().to_string(),
        }
    }

    /// The line reported for this error.
    ///
    /// Usage hints and unknown commands are reported as they are, every
    /// other failure carries the `Error: ` prefix.
    pub fn report(&self) -> String {
        match self {
            CommandError::BadArguments { .. } | CommandError::UnknownCommand(_) => self.to_string(),
            _ => format!("Error: {}", self),
        }
    }
}

/// Error raised while persisting a port log
#[derive(Error, Debug)]
pub enum SinkError {
    /// The log directory could not be created
    #[error("Error creating log directory: {}", path.display())]
    CreateDir {
        /// The directory
        path: PathBuf,
        /// The cause
        #[source]
        source: io::Error,
    },

    /// The log file of a port could not be written
    #[error("Error writing log file for port: {port}")]
    Write {
        /// The port name, e.g. `I2C_0`
        port: String,
        /// The cause
        #[source]
        source: io::Error,
    },
}

/// Error type for hwbench engine operations
#[derive(Error, Debug)]
pub enum Error {
    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] hwbench_core::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for hwbench engine operations
pub type Result<T> = std::result::Result<T, Error>;
