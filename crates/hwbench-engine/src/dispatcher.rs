/*!
 * Command dispatcher.
 *
 * The dispatcher owns the device registry and the log sink. It executes one
 * command line at a time and returns the lines the command produced, each
 * tagged with the stream it belongs to. A failing command produces exactly
 * one error line and leaves the bench unchanged.
 */
use std::fmt;

use tracing::{debug, error, info};

use hwbench_core::config::BenchConfig;
use hwbench_devices::{Category, DeviceRegistry};

use crate::command::{Command, ListTarget};
use crate::error::CommandError;
use crate::sink::LogSink;

/// One line of command output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A result, for stdout
    Out(String),
    /// A diagnostic, for stderr
    Err(String),
}

impl Line {
    /// The text of the line
    pub fn text(&self) -> &str {
        match self {
            Line::Out(text) | Line::Err(text) => text,
        }
    }

    /// Whether the line belongs on stderr
    pub fn is_err(&self) -> bool {
        matches!(self, Line::Err(_))
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Executes commands against a device registry
#[derive(Debug)]
pub struct Dispatcher {
    registry: DeviceRegistry,
    sink: Box<dyn LogSink>,
    flushes: usize,
}

impl Dispatcher {
    /// Create a dispatcher over `registry`, flushing logs into `sink`
    pub fn new<S: LogSink + 'static>(registry: DeviceRegistry, sink: S) -> Self {
        Self {
            registry,
            sink: Box::new(sink),
            flushes: 0,
        }
    }

    /// Create a dispatcher for a bench configuration
    pub fn from_config<S: LogSink + 'static>(config: &BenchConfig, sink: S) -> Self {
        Self::new(DeviceRegistry::from_config(config), sink)
    }

    /// The device registry
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Number of `exit` commands executed
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Execute one command line
    pub fn execute(&mut self, line: &str) -> Vec<Line> {
        match Command::parse(line).and_then(|command| self.apply(command)) {
            Ok(lines) => lines,
            Err(err) => {
                debug!(line = %line.trim(), error = ?err, "Command rejected");
                vec![Line::Err(err.report())]
            }
        }
    }

    /// Execute a parsed command
    pub fn apply(&mut self, command: Command) -> Result<Vec<Line>, CommandError> {
        let registry = &mut self.registry;

        let lines: Vec<Line> = match command {
            Command::TurnOn { port } => registry
                .turn_on(port.into())?
                .map(Line::Out)
                .into_iter()
                .collect(),
            Command::TurnOff { port } => registry
                .turn_off(port.into())?
                .map(Line::Out)
                .into_iter()
                .collect(),
            Command::AddDev { kind, port, dev_id } => {
                registry.attach(&kind, port.into(), dev_id.into())?;
                vec![Line::Out("Device added.".to_string())]
            }
            Command::RmDev { port } => {
                registry.detach(port.into())?;
                vec![Line::Out("Device removed.".to_string())]
            }
            Command::List(ListTarget::Ports) => {
                let mut lines = vec![Line::Out("list of ports:".to_string())];
                lines.extend(
                    registry
                        .list_ports()
                        .iter()
                        .map(|listing| Line::Out(listing.to_string())),
                );
                lines
            }
            Command::List(ListTarget::Category(category)) => {
                let mut lines = vec![Line::Out(format!("list of {}:", category.heading()))];
                lines.extend(
                    registry
                        .list_by_category(category)
                        .iter()
                        .map(|listing| Line::Out(listing.to_string())),
                );
                lines
            }
            Command::ReadSensor { dev_id } => {
                let (device, port) = registry.device_by_id_mut(Category::Sensor, dev_id.into())?;
                vec![Line::Out(device.read_sensor(port)?)]
            }
            Command::PrintDisplay { dev_id, text } => {
                let (device, port) = registry.device_by_id_mut(Category::Display, dev_id.into())?;
                vec![Line::Out(device.print(port, &text)?)]
            }
            Command::ReadWireless { dev_id } => {
                let (device, port) =
                    registry.device_by_id_mut(Category::WirelessAdapter, dev_id.into())?;
                let received = device.receive(port)?;
                vec![Line::Out(received.echo), Line::Out(received.message)]
            }
            Command::WriteWireless { dev_id, text } => {
                let (device, port) =
                    registry.device_by_id_mut(Category::WirelessAdapter, dev_id.into())?;
                vec![Line::Out(device.send(port, &text)?)]
            }
            Command::SetMotorSpeed { dev_id, speed } => {
                let (device, port) =
                    registry.device_by_id_mut(Category::MotorDriver, dev_id.into())?;
                vec![Line::Out(device.set_speed(port, speed)?)]
            }
            Command::Exit => {
                let mut lines = vec![Line::Out("Exiting ...".to_string())];
                lines.extend(self.flush());
                lines
            }
        };

        Ok(lines)
    }

    /// Drain every port log into the sink.
    ///
    /// A port whose log cannot be persisted yields one error line; the
    /// remaining ports are still flushed.
    pub fn flush(&mut self) -> Vec<Line> {
        self.flushes += 1;
        let mut lines = Vec::new();

        for log in self.registry.drain_logs() {
            if let Err(err) = self.sink.persist(&log) {
                error!(port = %log.port_name(), error = ?err, "Failed to persist port log");
                lines.push(Line::Err(format!(
                    "Error writing log file for port: {}",
                    log.port_name()
                )));
            }
        }

        info!(
            ports = self.registry.ports().len(),
            failed = lines.len(),
            flush = self.flushes,
            "Flushed port logs"
        );
        lines
    }
}
