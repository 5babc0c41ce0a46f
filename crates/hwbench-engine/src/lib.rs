/*!
 * hwbench Engine
 *
 * This crate turns command lines into bench operations: command parsing,
 * the dispatcher, the two-phase session runner and the sinks that persist
 * port logs on `exit`.
 */

#![warn(missing_docs)]

// Re-export core types
pub use hwbench_core::prelude;

pub mod bench;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod sink;

// Re-export main types for convenience
pub use bench::{Bench, ReadOutcome, RunSummary, SharedBench};
pub use command::{Command, ListTarget};
pub use dispatcher::{Dispatcher, Line};
pub use error::{CommandError, Error, Result, SinkError};
pub use sink::{FileLogSink, LogSink, MemoryLogSink};

/// hwbench engine crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
