/*!
 * hwbench Devices
 *
 * This crate provides the simulated hardware of the bench: protocol ports,
 * the device catalog, the power state machine, devices and the registry
 * that binds devices to ports and category slots.
 */

#![warn(missing_docs)]

// Re-export core types
pub use hwbench_core::prelude;

pub mod catalog;
pub mod device;
pub mod power;
pub mod protocol;
pub mod registry;

pub use catalog::{Category, DeviceKind, SensorModel, CATALOG};
pub use device::{Device, DeviceBody, DeviceError, Received};
pub use power::{Operation, PowerEvent, PowerState};
pub use protocol::{PortLog, ProtocolKind, ProtocolPort};
pub use registry::{CategoryLimits, DeviceListing, DeviceRegistry, PortListing};

/// hwbench devices crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
