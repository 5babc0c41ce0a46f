/*!
 * Protocol ports for hwbench.
 *
 * A port is one communication channel of the bench, bound to a protocol kind
 * and a fixed index. Every port keeps an append-only activity log that is
 * drained most-recent-first when the session ends.
 */
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::DeviceError;

/// The protocol carried by a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolKind {
    /// Inter-Integrated Circuit bus
    I2C,
    /// Serial Peripheral Interface bus
    SPI,
    /// Universal asynchronous receiver-transmitter
    UART,
    /// Dallas 1-Wire bus
    OneWire,
}

impl ProtocolKind {
    /// All protocol kinds
    pub const ALL: [ProtocolKind; 4] = [
        ProtocolKind::I2C,
        ProtocolKind::SPI,
        ProtocolKind::UART,
        ProtocolKind::OneWire,
    ];

    /// The protocol name as used in configuration and output
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolKind::I2C => "I2C",
            ProtocolKind::SPI => "SPI",
            ProtocolKind::UART => "UART",
            ProtocolKind::OneWire => "OneWire",
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProtocolKind {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProtocolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| DeviceError::UnknownProtocol(s.to_string()))
    }
}

/// A protocol port with its activity log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolPort {
    index: usize,
    kind: ProtocolKind,
    /// Oldest entry first; the head of the log is the last element
    log: Vec<String>,
}

impl ProtocolPort {
    /// The entry every port log starts with
    pub const OPENED: &'static str = "Port Opened.";

    /// The entry written by every read
    pub const READING: &'static str = "Reading.";

    /// Open a port
    pub fn new(index: usize, kind: ProtocolKind) -> Self {
        Self {
            index,
            kind,
            log: vec![Self::OPENED.to_string()],
        }
    }

    /// The port index
    pub fn index(&self) -> usize {
        self.index
    }

    /// The protocol kind
    pub fn kind(&self) -> ProtocolKind {
        self.kind
    }

    /// The protocol name
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Record a read on the port
    pub fn read(&mut self) {
        self.log(Self::READING);
    }

    /// Record a write on the port
    pub fn write(&mut self, data: &str) -> Result<(), DeviceError> {
        if data.is_empty() {
            return Err(DeviceError::EmptyWrite(self.kind));
        }

        self.log(data);
        Ok(())
    }

    /// Push an entry onto the head of the log
    pub fn log<S: Into<String>>(&mut self, entry: S) {
        self.log.push(entry.into());
    }

    /// Log entries, most recent first
    pub fn entries(&self) -> impl Iterator<Item = &str> + '_ {
        self.log.iter().rev().map(String::as_str)
    }

    /// Number of entries in the log
    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// Take every entry out of the log
    pub fn drain(&mut self) -> PortLog {
        let mut entries = std::mem::take(&mut self.log);
        entries.reverse();

        PortLog {
            index: self.index,
            kind: self.kind,
            entries,
        }
    }
}

/// The drained log of one port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortLog {
    /// The port index
    pub index: usize,
    /// The protocol kind
    pub kind: ProtocolKind,
    /// Entries, most recent first
    pub entries: Vec<String>,
}

impl PortLog {
    /// Port name, e.g. `I2C_0`
    pub fn port_name(&self) -> String {
        format!("{}_{}", self.kind, self.index)
    }

    /// Log file name, e.g. `I2C_0.log`
    pub fn file_name(&self) -> String {
        format!("{}.log", self.port_name())
    }

    /// The log as text, one entry per line
    pub fn to_text(&self) -> String {
        self.entries.iter().fold(String::new(), |mut text, entry| {
            text.push_str(entry);
            text.push('\n');
            text
        })
    }
}
