/*!
 * Log sinks.
 *
 * On `exit` the drained log of every port is handed to a [`LogSink`]. The
 * file sink writes one `<Protocol>_<index>.log` file per port; the memory
 * sink keeps the logs for inspection.
 */
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use hwbench_devices::PortLog;

use crate::error::SinkError;

/// Destination of drained port logs
pub trait LogSink: Debug + Send {
    /// Persist the log of one port
    fn persist(&mut self, log: &PortLog) -> Result<(), SinkError>;
}

/// Writes port logs to files in a directory
#[derive(Debug, Clone)]
pub struct FileLogSink {
    dir: PathBuf,
}

impl FileLogSink {
    /// Create a sink writing into `dir`; the directory is created on first use
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The log directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `log`
    pub fn path_for(&self, log: &PortLog) -> PathBuf {
        self.dir.join(log.file_name())
    }
}

impl LogSink for FileLogSink {
    fn persist(&mut self, log: &PortLog) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir).map_err(|source| SinkError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(log);
        fs::write(&path, log.to_text()).map_err(|source| SinkError::Write {
            port: log.port_name(),
            source,
        })?;

        debug!(path = %path.display(), entries = log.entries.len(), "Wrote port log");
        Ok(())
    }
}

/// Keeps port logs in memory.
///
/// Clones share the same storage, so a clone kept by the caller sees the
/// logs persisted through the one handed to the bench.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogSink {
    logs: Arc<Mutex<Vec<PortLog>>>,
}

impl MemoryLogSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Every log persisted so far, in order
    pub fn logs(&self) -> Vec<PortLog> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recently persisted log of the named port, e.g. `I2C_0`
    pub fn latest(&self, port_name: &str) -> Option<PortLog> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|log| log.port_name() == port_name)
            .cloned()
    }
}

impl LogSink for MemoryLogSink {
    fn persist(&mut self, log: &PortLog) -> Result<(), SinkError> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(log.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwbench_devices::ProtocolKind;
    use tempfile::tempdir;

    fn sample() -> PortLog {
        PortLog {
            index: 1,
            kind: ProtocolKind::SPI,
            entries: vec!["Writing \"turnON\".".into(), "Port Opened.".into()],
        }
    }

    #[test]
    fn test_file_sink_creates_directory() {
        let dir = tempdir().unwrap();
        let mut sink = FileLogSink::new(dir.path().join("logs").join("run"));

        sink.persist(&sample()).unwrap();

        let text = fs::read_to_string(sink.dir().join("SPI_1.log")).unwrap();
        assert_eq!(text, "Writing \"turnON\".\nPort Opened.\n");
    }

    #[test]
    fn test_file_sink_overwrites() {
        let dir = tempdir().unwrap();
        let mut sink = FileLogSink::new(dir.path());

        sink.persist(&sample()).unwrap();
        sink.persist(&PortLog {
            entries: Vec::new(),
            ..sample()
        })
        .unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("SPI_1.log")).unwrap(), "");
    }

    #[test]
    fn test_file_sink_reports_port() {
        let dir = tempdir().unwrap();
        // A directory where the log file should go makes the write fail
        fs::create_dir(dir.path().join("SPI_1.log")).unwrap();
        let mut sink = FileLogSink::new(dir.path());

        let err = sink.persist(&sample()).unwrap_err();
        assert_eq!(err.to_string(), "Error writing log file for port: SPI_1");
    }

    #[test]
    fn test_memory_sink_clones_share_storage() {
        let observer = MemoryLogSink::new();
        let mut sink = observer.clone();
        sink.persist(&sample()).unwrap();

        assert_eq!(observer.logs().len(), 1);
        assert_eq!(observer.latest("SPI_1"), Some(sample()));
        assert_eq!(observer.latest("I2C_0"), None);
    }
}
