/*!
 * Devices and their errors.
 *
 * A device is one instance of a catalog kind, bound to a port and to a slot
 * of its category. Category-specific state lives in [`DeviceBody`]; the
 * operations of every category are methods on [`Device`] that check the
 * category, then the power state, and only then touch the bound port.
 */
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Category, DeviceKind, SensorModel};
use crate::power::{Operation, PowerEvent, PowerState};
use crate::protocol::{ProtocolKind, ProtocolPort};

/// Error type for device and registry operations
///
/// Messages are the user-facing text reported for a failed command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The port index is out of range
    #[error("Invalid portID.")]
    UnknownPort(i64),

    /// A device already occupies the port
    #[error("Port {0} is already occupied.")]
    PortOccupied(usize),

    /// The device kind is not in the catalog
    #[error("Unknown device type: {0}.")]
    UnknownDeviceKind(String),

    /// The protocol token is not known
    #[error("Unknown protocol in configuration: {0}")]
    UnknownProtocol(String),

    /// The device kind cannot be attached to a port of this protocol
    #[error("Device and protocol mismatch.")]
    ProtocolMismatch {
        /// The device kind
        kind: DeviceKind,
        /// The port protocol
        protocol: ProtocolKind,
    },

    /// The device id is not below the category capacity
    #[error("All slots are full for {kind}. Maximum limit reached: {max}")]
    CapacityExceeded {
        /// The device kind
        kind: DeviceKind,
        /// The configured capacity of the category
        max: usize,
    },

    /// The category slot already holds a device
    #[error("devID already in use for {category}.")]
    SlotInUse {
        /// The category
        category: Category,
        /// The slot
        dev_id: usize,
    },

    /// No device is attached to the port
    #[error("No device connected to this port.")]
    NoDeviceAtPort(usize),

    /// Removal of a powered device was requested
    #[error("Device is ON. Turn it OFF before removal.")]
    DeviceMustBeOff(usize),

    /// The device id is outside the category slots
    #[error("Invalid devID for {category}.")]
    InvalidDeviceId {
        /// The category
        category: Category,
        /// The requested id
        dev_id: i64,
    },

    /// The category slot is empty
    #[error("No {category} found at this devID.")]
    NoDeviceWithId {
        /// The category
        category: Category,
        /// The requested id
        dev_id: usize,
    },

    /// A data operation was attempted on a device that is off
    #[error("Device is OFF. Turn it ON to {}.", .0.purpose())]
    DeviceOff(Operation),

    /// The `list` target is neither `ports` nor a category
    #[error("Unknown device type: {0}. Valid types: Sensor, Display, WirelessIO, MotorDriver.")]
    UnknownCategory(String),

    /// Empty data was written to a port
    #[error("Cannot write empty data to the {0} port.")]
    EmptyWrite(ProtocolKind),

    /// The operation does not belong to the device category
    #[error("{kind} is not a {expected}.")]
    WrongCategory {
        /// The device kind
        kind: DeviceKind,
        /// The category the operation needs
        expected: Category,
    },
}

/// Result type for device operations
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Category-specific device state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceBody {
    /// A sensor and its simulated reading
    Sensor(SensorModel),
    /// A display
    Display,
    /// A wireless adapter and its outgoing messages, last sent on top
    WirelessAdapter {
        /// Message stack
        outbox: Vec<String>,
    },
    /// A motor driver
    MotorDriver {
        /// Last speed set, if any
        speed: Option<i32>,
    },
}

impl DeviceBody {
    fn for_kind(kind: DeviceKind) -> Self {
        let entry = kind.entry();
        match entry.category {
            Category::Sensor => match entry.sensor {
                Some(model) => DeviceBody::Sensor(model),
                None => unreachable!("catalog row {} has no reading model", entry.name),
            },
            Category::Display => DeviceBody::Display,
            Category::WirelessAdapter => DeviceBody::WirelessAdapter { outbox: Vec::new() },
            Category::MotorDriver => DeviceBody::MotorDriver { speed: None },
        }
    }
}

/// A message taken from a wireless adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    /// The adapter's report line
    pub echo: String,
    /// The message, or `null` when nothing was pending
    pub message: String,
}

/// The payload returned when a wireless adapter has nothing pending
pub const NO_MESSAGE: &str = "null";

/// An attached device
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    kind: DeviceKind,
    port: usize,
    dev_id: usize,
    power: PowerState,
    body: DeviceBody,
}

impl Device {
    /// Create a powered-down device bound to `port` and slot `dev_id`
    pub fn new(kind: DeviceKind, port: usize, dev_id: usize) -> Self {
        Self {
            kind,
            port,
            dev_id,
            power: PowerState::Off,
            body: DeviceBody::for_kind(kind),
        }
    }

    /// The device kind
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// The device name
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// The device category
    pub fn category(&self) -> Category {
        self.kind.category()
    }

    /// Index of the bound port
    pub fn port(&self) -> usize {
        self.port
    }

    /// The category slot
    pub fn dev_id(&self) -> usize {
        self.dev_id
    }

    /// The power state
    pub fn power(&self) -> PowerState {
        self.power
    }

    /// The category-specific state
    pub fn body(&self) -> &DeviceBody {
        &self.body
    }

    /// Apply a power event.
    ///
    /// Returns the report line of a transition, or `None` when the device
    /// was already in the requested state.
    pub fn apply_power(
        &mut self,
        event: PowerEvent,
        port: &mut ProtocolPort,
    ) -> Result<Option<String>> {
        let Some(next) = self.power.next(event) else {
            return Ok(None);
        };

        port.write(&format!("Writing \"{}\".", event.command()))?;
        self.power = next;

        Ok(Some(format!("{}: {}.", self.name(), event.progress())))
    }

    /// Switch the device on
    pub fn turn_on(&mut self, port: &mut ProtocolPort) -> Result<Option<String>> {
        self.apply_power(PowerEvent::TurnOn, port)
    }

    /// Switch the device off
    pub fn turn_off(&mut self, port: &mut ProtocolPort) -> Result<Option<String>> {
        self.apply_power(PowerEvent::TurnOff, port)
    }

    fn expect_category(&self, expected: Category) -> Result<()> {
        if self.category() == expected {
            Ok(())
        } else {
            Err(DeviceError::WrongCategory {
                kind: self.kind,
                expected,
            })
        }
    }

    /// Take a sensor reading
    pub fn read_sensor(&mut self, port: &mut ProtocolPort) -> Result<String> {
        let DeviceBody::Sensor(model) = self.body else {
            return Err(DeviceError::WrongCategory {
                kind: self.kind,
                expected: Category::Sensor,
            });
        };
        self.power.require_on(Operation::ReadSensor)?;

        port.read();
        Ok(format!(
            "{} {}: {}.",
            self.name(),
            self.kind.type_label(),
            model.data()
        ))
    }

    /// Print a message on a display
    pub fn print(&mut self, port: &mut ProtocolPort, text: &str) -> Result<String> {
        self.expect_category(Category::Display)?;
        self.power.require_on(Operation::PrintDisplay)?;

        port.write(&format!("printDisplay {}", text))?;
        Ok(format!("{}: Printing \"{}\".", self.name(), text))
    }

    /// Send a message through a wireless adapter
    pub fn send(&mut self, port: &mut ProtocolPort, text: &str) -> Result<String> {
        self.expect_category(Category::WirelessAdapter)?;
        self.power.require_on(Operation::WriteWireless)?;

        port.write(&format!("Writing \"{}\".", text))?;
        if let DeviceBody::WirelessAdapter { outbox } = &mut self.body {
            outbox.push(text.to_string());
        }

        Ok(format!("{}: Sending \"{}\".", self.name(), text))
    }

    /// Receive the most recently sent message of a wireless adapter
    pub fn receive(&mut self, port: &mut ProtocolPort) -> Result<Received> {
        self.expect_category(Category::WirelessAdapter)?;
        self.power.require_on(Operation::ReadWireless)?;

        port.read();
        let message = match &mut self.body {
            DeviceBody::WirelessAdapter { outbox } => outbox.pop(),
            _ => None,
        }
        .unwrap_or_else(|| NO_MESSAGE.to_string());

        Ok(Received {
            echo: format!("{}: Received \"{}\".", self.name(), message),
            message,
        })
    }

    /// Set the speed of a motor driver
    pub fn set_speed(&mut self, port: &mut ProtocolPort, speed: i32) -> Result<String> {
        self.expect_category(Category::MotorDriver)?;
        self.power.require_on(Operation::SetMotorSpeed)?;

        port.write(&format!("setMotorSpeed {}", speed))?;
        if let DeviceBody::MotorDriver { speed: last } = &mut self.body {
            *last = Some(speed);
        }

        Ok(format!("{}: Setting speed to {}.", self.name(), speed))
    }

    /// Messages waiting in a wireless adapter
    pub fn pending_messages(&self) -> usize {
        match &self.body {
            DeviceBody::WirelessAdapter { outbox } => outbox.len(),
            _ => 0,
        }
    }

    /// Last speed set on a motor driver
    pub fn speed(&self) -> Option<i32> {
        match self.body {
            DeviceBody::MotorDriver { speed } => speed,
            _ => None,
        }
    }
}
