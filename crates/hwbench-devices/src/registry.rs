/*!
 * Device registry for hwbench.
 *
 * The registry owns the protocol ports and every attached device. Devices
 * live in one arena keyed by [`DeviceHandle`] and are indexed twice: by the
 * port they are bound to and by their `(category, dev_id)` slot. Both
 * indexes are updated together, so a device is reachable through both or
 * through neither.
 */
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use hwbench_core::config::BenchConfig;

use crate::catalog::{Category, DeviceKind};
use crate::device::{Device, DeviceError, Result};
use crate::power::PowerState;
use crate::protocol::{PortLog, ProtocolKind, ProtocolPort};

/// Arena key of an attached device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(u64);

/// Slot capacity of every category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLimits {
    /// Sensor slots
    pub sensors: usize,
    /// Display slots
    pub displays: usize,
    /// Wireless adapter slots
    pub wireless_adapters: usize,
    /// Motor driver slots
    pub motor_drivers: usize,
}

impl CategoryLimits {
    /// The capacity of `category`
    pub fn max(&self, category: Category) -> usize {
        match category {
            Category::Sensor => self.sensors,
            Category::Display => self.displays,
            Category::WirelessAdapter => self.wireless_adapters,
            Category::MotorDriver => self.motor_drivers,
        }
    }
}

impl From<&BenchConfig> for CategoryLimits {
    fn from(config: &BenchConfig) -> Self {
        Self {
            sensors: config.max_sensors,
            displays: config.max_displays,
            wireless_adapters: config.max_wireless_adapters,
            motor_drivers: config.max_motor_drivers,
        }
    }
}

/// A device as shown by `list ports`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedDevice {
    /// Device name
    pub name: &'static str,
    /// Type label
    pub type_label: &'static str,
    /// Category slot
    pub dev_id: usize,
    /// Power state
    pub power: PowerState,
}

/// One line of `list ports`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortListing {
    /// Port index
    pub index: usize,
    /// Port protocol
    pub protocol: ProtocolKind,
    /// The device on the port, if any
    pub device: Option<AttachedDevice>,
}

impl fmt::Display for PortListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.device {
            None => write!(f, "{} {} empty", self.index, self.protocol),
            Some(device) => write!(
                f,
                "{} {} occupied {} {} {} {}",
                self.index,
                self.protocol,
                device.name,
                device.type_label,
                device.dev_id,
                device.power
            ),
        }
    }
}

/// One line of a category listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceListing {
    /// Device name
    pub name: &'static str,
    /// Category slot
    pub dev_id: usize,
    /// Port index
    pub port: usize,
    /// Port protocol
    pub protocol: ProtocolKind,
}

impl fmt::Display for DeviceListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.name, self.dev_id, self.port, self.protocol)
    }
}

/// Device registry
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    ports: Vec<ProtocolPort>,
    limits: CategoryLimits,
    devices: HashMap<DeviceHandle, Device>,
    by_port: HashMap<usize, DeviceHandle>,
    by_slot: BTreeMap<(Category, usize), DeviceHandle>,
    next_handle: u64,
}

impl DeviceRegistry {
    /// Create a registry over the given port protocols
    pub fn new<I>(protocols: I, limits: CategoryLimits) -> Self
    where
        I: IntoIterator<Item = ProtocolKind>,
    {
        let ports = protocols
            .into_iter()
            .enumerate()
            .map(|(index, kind)| ProtocolPort::new(index, kind))
            .collect();

        Self {
            ports,
            limits,
            ..Self::default()
        }
    }

    /// Create a registry from a bench configuration.
    ///
    /// Unknown protocol tokens are skipped with a warning and consume no
    /// port index.
    pub fn from_config(config: &BenchConfig) -> Self {
        let protocols = config
            .ports
            .iter()
            .filter_map(|token| match token.parse::<ProtocolKind>() {
                Ok(kind) => Some(kind),
                Err(err) => {
                    warn!(token = %token, "{}", err);
                    None
                }
            })
            .collect::<Vec<_>>();

        let registry = Self::new(protocols, CategoryLimits::from(config));
        debug!(
            ports = registry.ports.len(),
            limits = ?registry.limits,
            "Created device registry"
        );
        registry
    }

    /// All ports, in index order
    pub fn ports(&self) -> &[ProtocolPort] {
        &self.ports
    }

    /// The category capacities
    pub fn limits(&self) -> CategoryLimits {
        self.limits
    }

    /// Number of attached devices
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no device is attached
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn port_index(&self, port: i64) -> Result<usize> {
        usize::try_from(port)
            .ok()
            .filter(|index| *index < self.ports.len())
            .ok_or(DeviceError::UnknownPort(port))
    }

    /// Resolve a port by index
    pub fn port(&self, port: i64) -> Result<&ProtocolPort> {
        let index = self.port_index(port)?;
        Ok(&self.ports[index])
    }

    fn slot(&self, category: Category, dev_id: i64) -> Result<usize> {
        usize::try_from(dev_id)
            .ok()
            .filter(|slot| *slot < self.limits.max(category))
            .ok_or(DeviceError::InvalidDeviceId { category, dev_id })
    }

    /// Attach a device of kind `kind` to `port` in slot `dev_id`
    pub fn attach(&mut self, kind: &str, port: i64, dev_id: i64) -> Result<DeviceHandle> {
        let index = self.port_index(port)?;
        if self.by_port.contains_key(&index) {
            return Err(DeviceError::PortOccupied(index));
        }

        let kind = kind.parse::<DeviceKind>()?;
        let protocol = self.ports[index].kind();
        if !kind.accepts(protocol) {
            return Err(DeviceError::ProtocolMismatch { kind, protocol });
        }

        let category = kind.category();
        let max = self.limits.max(category);
        let slot = usize::try_from(dev_id)
            .ok()
            .filter(|slot| *slot < max)
            .ok_or(DeviceError::CapacityExceeded { kind, max })?;
        if self.by_slot.contains_key(&(category, slot)) {
            return Err(DeviceError::SlotInUse {
                category,
                dev_id: slot,
            });
        }

        let handle = DeviceHandle(self.next_handle);
        self.next_handle += 1;

        self.devices.insert(handle, Device::new(kind, index, slot));
        self.by_port.insert(index, handle);
        self.by_slot.insert((category, slot), handle);

        debug!(kind = %kind, port = index, dev_id = slot, "Attached device");
        Ok(handle)
    }

    /// Detach the device on `port`; it must be off
    pub fn detach(&mut self, port: i64) -> Result<Device> {
        let index = self.port_index(port)?;
        let handle = *self
            .by_port
            .get(&index)
            .ok_or(DeviceError::NoDeviceAtPort(index))?;

        if self.devices.get(&handle).map_or(false, |d| d.power().is_on()) {
            return Err(DeviceError::DeviceMustBeOff(index));
        }

        let device = self
            .devices
            .remove(&handle)
            .ok_or(DeviceError::NoDeviceAtPort(index))?;
        self.by_port.remove(&index);
        self.by_slot.remove(&(device.category(), device.dev_id()));

        debug!(kind = %device.kind(), port = index, dev_id = device.dev_id(), "Detached device");
        Ok(device)
    }

    /// The device on `port`
    pub fn lookup_by_port(&self, port: i64) -> Result<&Device> {
        let index = self.port_index(port)?;
        self.by_port
            .get(&index)
            .and_then(|handle| self.devices.get(handle))
            .ok_or(DeviceError::NoDeviceAtPort(index))
    }

    /// The device in slot `dev_id` of `category`
    pub fn lookup_by_id(&self, category: Category, dev_id: i64) -> Result<&Device> {
        let slot = self.slot(category, dev_id)?;
        self.by_slot
            .get(&(category, slot))
            .and_then(|handle| self.devices.get(handle))
            .ok_or(DeviceError::NoDeviceWithId {
                category,
                dev_id: slot,
            })
    }

    /// The device on `port` together with the port itself
    pub fn device_at_port_mut(&mut self, port: i64) -> Result<(&mut Device, &mut ProtocolPort)> {
        let index = self.port_index(port)?;
        let device = self
            .by_port
            .get(&index)
            .and_then(|handle| self.devices.get_mut(handle))
            .ok_or(DeviceError::NoDeviceAtPort(index))?;

        Ok((device, &mut self.ports[index]))
    }

    /// The device in slot `dev_id` of `category` together with its port
    pub fn device_by_id_mut(
        &mut self,
        category: Category,
        dev_id: i64,
    ) -> Result<(&mut Device, &mut ProtocolPort)> {
        let slot = self.slot(category, dev_id)?;
        let device = self
            .by_slot
            .get(&(category, slot))
            .and_then(|handle| self.devices.get_mut(handle))
            .ok_or(DeviceError::NoDeviceWithId {
                category,
                dev_id: slot,
            })?;

        let port = &mut self.ports[device.port()];
        Ok((device, port))
    }

    /// Switch on the device on `port`
    pub fn turn_on(&mut self, port: i64) -> Result<Option<String>> {
        let (device, port) = self.device_at_port_mut(port)?;
        device.turn_on(port)
    }

    /// Switch off the device on `port`
    pub fn turn_off(&mut self, port: i64) -> Result<Option<String>> {
        let (device, port) = self.device_at_port_mut(port)?;
        device.turn_off(port)
    }

    /// One listing per port, in index order
    pub fn list_ports(&self) -> Vec<PortListing> {
        self.ports
            .iter()
            .map(|port| PortListing {
                index: port.index(),
                protocol: port.kind(),
                device: self
                    .by_port
                    .get(&port.index())
                    .and_then(|handle| self.devices.get(handle))
                    .map(|device| AttachedDevice {
                        name: device.name(),
                        type_label: device.kind().type_label(),
                        dev_id: device.dev_id(),
                        power: device.power(),
                    }),
            })
            .collect()
    }

    /// The devices of `category`, in slot order
    pub fn list_by_category(&self, category: Category) -> Vec<DeviceListing> {
        self.by_slot
            .range((category, 0)..=(category, usize::MAX))
            .filter_map(|(_, handle)| self.devices.get(handle))
            .map(|device| DeviceListing {
                name: device.name(),
                dev_id: device.dev_id(),
                port: device.port(),
                protocol: self.ports[device.port()].kind(),
            })
            .collect()
    }

    /// Empty every port log
    pub fn drain_logs(&mut self) -> Vec<PortLog> {
        self.ports.iter_mut().map(ProtocolPort::drain).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(n: usize) -> CategoryLimits {
        CategoryLimits {
            sensors: n,
            displays: n,
            wireless_adapters: n,
            motor_drivers: n,
        }
    }

    fn registry() -> DeviceRegistry {
        DeviceRegistry::new(ProtocolKind::ALL, limits(2))
    }

    #[test]
    fn test_from_config_skips_unknown_tokens() {
        let config = BenchConfig {
            ports: vec!["I2C".into(), "CAN".into(), "I2C".into(), "UART".into()],
            max_sensors: 3,
            ..BenchConfig::default()
        };

        let registry = DeviceRegistry::from_config(&config);
        let kinds = registry.ports().iter().map(|p| p.kind()).collect::<Vec<_>>();
        assert_eq!(kinds, vec![ProtocolKind::I2C, ProtocolKind::I2C, ProtocolKind::UART]);
        assert_eq!(registry.ports()[2].index(), 2);
        assert_eq!(registry.limits().max(Category::Sensor), 3);
    }

    #[test]
    fn test_attach_and_lookup() {
        let mut registry = registry();
        registry.attach("MPU6050", 0, 1).unwrap();

        let device = registry.lookup_by_port(0).unwrap();
        assert_eq!(device.kind(), DeviceKind::Mpu6050);
        assert_eq!(device.power(), PowerState::Off);
        assert_eq!(registry.lookup_by_id(Category::Sensor, 1).unwrap(), device);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.ports()[0].log_len(), 1);
    }

    #[test]
    fn test_attach_check_order() {
        let mut registry = registry();
        registry.attach("LCD", 0, 0).unwrap();

        assert_eq!(registry.attach("LCD", 9, 0), Err(DeviceError::UnknownPort(9)));
        assert_eq!(registry.attach("LCD", -1, 0), Err(DeviceError::UnknownPort(-1)));
        assert_eq!(registry.attach("Nope", 0, 0), Err(DeviceError::PortOccupied(0)));
        assert_eq!(
            registry.attach("Nope", 1, 0),
            Err(DeviceError::UnknownDeviceKind("Nope".into()))
        );
        assert_eq!(
            registry.attach("LCD", 1, 7),
            Err(DeviceError::ProtocolMismatch {
                kind: DeviceKind::Lcd,
                protocol: ProtocolKind::SPI
            })
        );
        assert_eq!(
            registry.attach("OLED", 1, 2),
            Err(DeviceError::CapacityExceeded {
                kind: DeviceKind::Oled,
                max: 2
            })
        );
        assert_eq!(
            registry.attach("OLED", 1, -1),
            Err(DeviceError::CapacityExceeded {
                kind: DeviceKind::Oled,
                max: 2
            })
        );
        assert_eq!(
            registry.attach("OLED", 1, 0),
            Err(DeviceError::SlotInUse {
                category: Category::Display,
                dev_id: 0
            })
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_protocol_mismatch_leaves_registry_unchanged() {
        for kind in DeviceKind::all() {
            for protocol in ProtocolKind::ALL {
                if kind.accepts(protocol) {
                    continue;
                }
                let mut registry = DeviceRegistry::new([protocol], limits(1));
                let before = registry.list_ports();

                assert_eq!(
                    registry.attach(kind.name(), 0, 0),
                    Err(DeviceError::ProtocolMismatch { kind, protocol })
                );
                assert_eq!(registry.list_ports(), before);
                assert!(registry.is_empty());
            }
        }
    }

    #[test]
    fn test_attach_detach_restores_listing() {
        let mut registry = registry();
        let ports = registry.list_ports();
        let sensors = registry.list_by_category(Category::Sensor);

        registry.attach("BME280", 1, 0).unwrap();
        assert_ne!(registry.list_ports(), ports);

        let device = registry.detach(1).unwrap();
        assert_eq!(device.kind(), DeviceKind::Bme280);
        assert_eq!(registry.list_ports(), ports);
        assert_eq!(registry.list_by_category(Category::Sensor), sensors);
        assert!(registry.lookup_by_id(Category::Sensor, 0).is_err());

        // Both the port and the slot are free again
        registry.attach("BME280", 1, 0).unwrap();
    }

    #[test]
    fn test_detach_requires_off() {
        let mut registry = registry();
        registry.attach("Wifi", 2, 0).unwrap();
        registry.turn_on(2).unwrap();

        assert_eq!(registry.detach(2), Err(DeviceError::DeviceMustBeOff(2)));
        assert_eq!(registry.len(), 1);

        registry.turn_off(2).unwrap();
        assert!(registry.detach(2).is_ok());
        assert_eq!(registry.detach(2), Err(DeviceError::NoDeviceAtPort(2)));
        assert_eq!(registry.detach(4), Err(DeviceError::UnknownPort(4)));
    }

    #[test]
    fn test_lookup_by_id_errors() {
        let registry = registry();
        assert_eq!(
            registry.lookup_by_id(Category::MotorDriver, 2).err(),
            Some(DeviceError::InvalidDeviceId {
                category: Category::MotorDriver,
                dev_id: 2
            })
        );
        assert_eq!(
            registry.lookup_by_id(Category::MotorDriver, -3).err(),
            Some(DeviceError::InvalidDeviceId {
                category: Category::MotorDriver,
                dev_id: -3
            })
        );
        assert_eq!(
            registry.lookup_by_id(Category::MotorDriver, 1).err(),
            Some(DeviceError::NoDeviceWithId {
                category: Category::MotorDriver,
                dev_id: 1
            })
        );
    }

    #[test]
    fn test_power_through_port() {
        let mut registry = registry();
        registry.attach("GY951", 2, 0).unwrap();

        assert_eq!(
            registry.turn_on(2).unwrap().as_deref(),
            Some("GY951: Turning ON.")
        );
        assert_eq!(registry.turn_on(2).unwrap(), None);
        assert_eq!(registry.turn_on(0), Err(DeviceError::NoDeviceAtPort(0)));
        assert_eq!(
            registry.ports()[2].entries().collect::<Vec<_>>(),
            vec!["Writing \"turnON\".", "Port Opened."]
        );
    }

    #[test]
    fn test_list_formats() {
        let mut registry = registry();
        registry.attach("SparkFunMD", 1, 1).unwrap();
        registry.attach("PCA9685", 0, 0).unwrap();
        registry.turn_on(1).unwrap();

        let lines = registry
            .list_ports()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                "0 I2C occupied PCA9685 MotorDriver 0 OFF",
                "1 SPI occupied SparkFunMD MotorDriver 1 ON",
                "2 UART empty",
                "3 OneWire empty",
            ]
        );

        let drivers = registry
            .list_by_category(Category::MotorDriver)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        assert_eq!(drivers, vec!["PCA9685 0 0 I2C", "SparkFunMD 1 1 SPI"]);
        assert!(registry.list_by_category(Category::Sensor).is_empty());
    }

    #[test]
    fn test_drain_logs() {
        let mut registry = registry();
        registry.attach("DHT11", 3, 0).unwrap();
        registry.turn_on(3).unwrap();

        let logs = registry.drain_logs();
        assert_eq!(logs.len(), 4);
        assert_eq!(logs[3].entries, vec!["Writing \"turnON\".", "Port Opened."]);
        assert!(registry.drain_logs().iter().all(|log| log.entries.is_empty()));
    }
}
