/*!
 * Device power state machine.
 *
 * Devices start `Off`. Only the two transitions `Off -> On` and `On -> Off`
 * exist; an event that does not change the state is a no-op. Every data
 * operation is gated on the `On` state.
 */
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::DeviceError;

/// Device power state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerState {
    /// Powered down
    #[default]
    Off,
    /// Powered up
    On,
}

/// A power event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerEvent {
    /// Switch the device on
    TurnOn,
    /// Switch the device off
    TurnOff,
}

/// An operation that needs a powered device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Read a sensor
    ReadSensor,
    /// Print on a display
    PrintDisplay,
    /// Receive on a wireless adapter
    ReadWireless,
    /// Send on a wireless adapter
    WriteWireless,
    /// Set a motor speed
    SetMotorSpeed,
}

impl PowerState {
    /// `ON` or `OFF`
    pub fn label(&self) -> &'static str {
        match self {
            PowerState::Off => "OFF",
            PowerState::On => "ON",
        }
    }

    /// Whether the device is on
    pub fn is_on(&self) -> bool {
        matches!(self, PowerState::On)
    }

    /// The state reached by applying `event`, or `None` when nothing changes
    pub fn next(self, event: PowerEvent) -> Option<PowerState> {
        match (self, event) {
            (PowerState::Off, PowerEvent::TurnOn) => Some(PowerState::On),
            (PowerState::On, PowerEvent::TurnOff) => Some(PowerState::Off),
            _ => None,
        }
    }

    /// Gate a data operation on the `On` state
    pub fn require_on(self, operation: Operation) -> Result<(), DeviceError> {
        if self.is_on() {
            Ok(())
        } else {
            Err(DeviceError::DeviceOff(operation))
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl PowerEvent {
    /// The command word written to the port on a transition
    pub fn command(&self) -> &'static str {
        match self {
            PowerEvent::TurnOn => "turnON",
            PowerEvent::TurnOff => "turnOFF",
        }
    }

    /// The progress word reported on a transition
    pub fn progress(&self) -> &'static str {
        match self {
            PowerEvent::TurnOn => "Turning ON",
            PowerEvent::TurnOff => "Turning OFF",
        }
    }
}

impl Operation {
    /// What the operation needs power for, as used in error messages
    pub fn purpose(&self) -> &'static str {
        match self {
            Operation::ReadSensor => "read data",
            Operation::PrintDisplay => "print",
            Operation::ReadWireless => "read",
            Operation::WriteWireless => "write",
            Operation::SetMotorSpeed => "set speed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert_eq!(PowerState::default(), PowerState::Off);
        assert_eq!(PowerState::Off.next(PowerEvent::TurnOn), Some(PowerState::On));
        assert_eq!(PowerState::On.next(PowerEvent::TurnOff), Some(PowerState::Off));
    }

    #[test]
    fn test_repeated_events_are_no_ops() {
        assert_eq!(PowerState::On.next(PowerEvent::TurnOn), None);
        assert_eq!(PowerState::Off.next(PowerEvent::TurnOff), None);
    }

    #[test]
    fn test_require_on() {
        assert!(PowerState::On.require_on(Operation::ReadSensor).is_ok());
        assert!(matches!(
            PowerState::Off.require_on(Operation::SetMotorSpeed),
            Err(DeviceError::DeviceOff(Operation::SetMotorSpeed))
        ));
    }
}
