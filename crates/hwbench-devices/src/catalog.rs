/*!
 * The device catalog.
 *
 * Static knowledge of every device kind the bench can host: its category,
 * the protocols it can be wired to and, for sensors, the simulated reading.
 */
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::DeviceError;
use crate::protocol::ProtocolKind;

/// Device category, each with its own slot capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Sensors
    Sensor,
    /// Displays
    Display,
    /// Wireless adapters
    WirelessAdapter,
    /// Motor drivers
    MotorDriver,
}

impl Category {
    /// All categories
    pub const ALL: [Category; 4] = [
        Category::Sensor,
        Category::Display,
        Category::WirelessAdapter,
        Category::MotorDriver,
    ];

    /// The label used in command output
    pub fn label(&self) -> &'static str {
        match self {
            Category::Sensor => "Sensor",
            Category::Display => "Display",
            Category::WirelessAdapter => "WirelessIO",
            Category::MotorDriver => "MotorDriver",
        }
    }

    /// Heading of a category listing
    pub fn heading(&self) -> &'static str {
        match self {
            Category::Sensor => "Sensors",
            Category::Display => "Displays",
            Category::WirelessAdapter => "WirelessIOs",
            Category::MotorDriver => "Motor drivers",
        }
    }

    /// Parse a `list` token, case-insensitively
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "sensor" => Some(Category::Sensor),
            "display" => Some(Category::Display),
            "wirelessio" => Some(Category::WirelessAdapter),
            "motordriver" => Some(Category::MotorDriver),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The simulated reading of a sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SensorModel {
    /// A temperature sensor
    Temperature {
        /// Degrees Celsius
        celsius: f32,
    },
    /// An inertial measurement unit
    Imu {
        /// Acceleration
        accel: f32,
        /// Rotation
        rot: f32,
    },
}

impl SensorModel {
    /// Format the reading
    pub fn data(&self) -> String {
        match self {
            SensorModel::Temperature { celsius } => format!("Temp: {:.2}C", celsius),
            SensorModel::Imu { accel, rot } => format!("Accel: {:.2}, Rot: {:.2}", accel, rot),
        }
    }
}

const TEMPERATURE: SensorModel = SensorModel::Temperature { celsius: 24.0 };
const IMU: SensorModel = SensorModel::Imu {
    accel: 1.0,
    rot: 0.5,
};

/// One row of the catalog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    /// The device kind
    pub kind: DeviceKind,
    /// The device name
    pub name: &'static str,
    /// The device category
    pub category: Category,
    /// The type label shown by `list ports` and sensor readings
    pub type_label: &'static str,
    /// Protocols the device can be attached to
    pub protocols: &'static [ProtocolKind],
    /// The simulated reading, for sensors
    pub sensor: Option<SensorModel>,
}

/// Every concrete device kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// DHT11 temperature sensor
    Dht11,
    /// BME280 temperature sensor
    Bme280,
    /// MPU6050 inertial sensor
    Mpu6050,
    /// GY-951 inertial sensor
    Gy951,
    /// Character LCD
    Lcd,
    /// OLED panel
    Oled,
    /// Bluetooth adapter
    Bluetooth,
    /// Wi-Fi adapter
    Wifi,
    /// PCA9685 PWM motor driver
    Pca9685,
    /// SparkFun motor driver
    SparkFunMd,
}

/// The catalog, in `DeviceKind` declaration order
pub static CATALOG: [CatalogEntry; 10] = [
    CatalogEntry {
        kind: DeviceKind::Dht11,
        name: "DHT11",
        category: Category::Sensor,
        type_label: "TempSensor Sensor",
        protocols: &[ProtocolKind::OneWire],
        sensor: Some(TEMPERATURE),
    },
    CatalogEntry {
        kind: DeviceKind::Bme280,
        name: "BME280",
        category: Category::Sensor,
        type_label: "TempSensor Sensor",
        protocols: &[ProtocolKind::I2C, ProtocolKind::SPI],
        sensor: Some(TEMPERATURE),
    },
    CatalogEntry {
        kind: DeviceKind::Mpu6050,
        name: "MPU6050",
        category: Category::Sensor,
        type_label: "IMUSensor Sensor",
        protocols: &[ProtocolKind::I2C],
        sensor: Some(IMU),
    },
    CatalogEntry {
        kind: DeviceKind::Gy951,
        name: "GY951",
        category: Category::Sensor,
        type_label: "IMUSensor Sensor",
        protocols: &[ProtocolKind::SPI, ProtocolKind::UART],
        sensor: Some(IMU),
    },
    CatalogEntry {
        kind: DeviceKind::Lcd,
        name: "LCD",
        category: Category::Display,
        type_label: "Display",
        protocols: &[ProtocolKind::I2C],
        sensor: None,
    },
    CatalogEntry {
        kind: DeviceKind::Oled,
        name: "OLED",
        category: Category::Display,
        type_label: "Display",
        protocols: &[ProtocolKind::SPI],
        sensor: None,
    },
    CatalogEntry {
        kind: DeviceKind::Bluetooth,
        name: "Bluetooth",
        category: Category::WirelessAdapter,
        type_label: "WirelessIO",
        protocols: &[ProtocolKind::UART],
        sensor: None,
    },
    CatalogEntry {
        kind: DeviceKind::Wifi,
        name: "Wifi",
        category: Category::WirelessAdapter,
        type_label: "WirelessIO",
        protocols: &[ProtocolKind::SPI, ProtocolKind::UART],
        sensor: None,
    },
    CatalogEntry {
        kind: DeviceKind::Pca9685,
        name: "PCA9685",
        category: Category::MotorDriver,
        type_label: "MotorDriver",
        protocols: &[ProtocolKind::I2C],
        sensor: None,
    },
    CatalogEntry {
        kind: DeviceKind::SparkFunMd,
        name: "SparkFunMD",
        category: Category::MotorDriver,
        type_label: "MotorDriver",
        protocols: &[ProtocolKind::SPI],
        sensor: None,
    },
];

impl DeviceKind {
    /// All device kinds
    pub fn all() -> impl Iterator<Item = DeviceKind> {
        CATALOG.iter().map(|entry| entry.kind)
    }

    /// The catalog row for this kind
    pub fn entry(&self) -> &'static CatalogEntry {
        &CATALOG[*self as usize]
    }

    /// The device name
    pub fn name(&self) -> &'static str {
        self.entry().name
    }

    /// The device category
    pub fn category(&self) -> Category {
        self.entry().category
    }

    /// The type label
    pub fn type_label(&self) -> &'static str {
        self.entry().type_label
    }

    /// Protocols this kind can be attached to
    pub fn protocols(&self) -> &'static [ProtocolKind] {
        self.entry().protocols
    }

    /// Whether this kind can be attached to a port of the given protocol
    pub fn accepts(&self, protocol: ProtocolKind) -> bool {
        self.protocols().contains(&protocol)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceKind {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATALOG
            .iter()
            .find(|entry| entry.name == s)
            .map(|entry| entry.kind)
            .ok_or_else(|| DeviceError::UnknownDeviceKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_kinds() {
        for entry in CATALOG.iter() {
            assert_eq!(entry.kind.entry(), entry);
        }
        assert_eq!(DeviceKind::all().count(), 10);
    }

    #[test]
    fn test_only_sensors_carry_a_reading_model() {
        for entry in CATALOG.iter() {
            assert_eq!(
                entry.sensor.is_some(),
                entry.category == Category::Sensor,
                "{}",
                entry.name
            );
        }
    }

    #[test]
    fn test_kind_from_name_is_case_sensitive() {
        assert_eq!("SparkFunMD".parse::<DeviceKind>().unwrap(), DeviceKind::SparkFunMd);
        assert!(matches!(
            "lcd".parse::<DeviceKind>(),
            Err(DeviceError::UnknownDeviceKind(name)) if name == "lcd"
        ));
    }

    #[test]
    fn test_accepted_protocols() {
        assert!(DeviceKind::Dht11.accepts(ProtocolKind::OneWire));
        assert!(!DeviceKind::Dht11.accepts(ProtocolKind::I2C));
        assert!(DeviceKind::Wifi.accepts(ProtocolKind::SPI));
        assert!(DeviceKind::Wifi.accepts(ProtocolKind::UART));
        assert!(!DeviceKind::Bluetooth.accepts(ProtocolKind::SPI));
    }

    #[test]
    fn test_category_tokens() {
        assert_eq!(Category::from_token("Sensor"), Some(Category::Sensor));
        assert_eq!(Category::from_token("WIRELESSIO"), Some(Category::WirelessAdapter));
        assert_eq!(Category::from_token("motordriver"), Some(Category::MotorDriver));
        assert_eq!(Category::from_token("ports"), None);
    }

    #[test]
    fn test_sensor_data() {
        assert_eq!(DeviceKind::Dht11.entry().sensor.unwrap().data(), "Temp: 24.00C");
        assert_eq!(
            DeviceKind::Gy951.entry().sensor.unwrap().data(),
            "Accel: 1.00, Rot: 0.50"
        );
        assert!(DeviceKind::Lcd.entry().sensor.is_none());
    }
}
