/*!
 * Configuration management for hwbench.
 *
 * A configuration names the protocol ports of the bench, in order, and the
 * number of device slots per device category. It is assembled in layers:
 * built-in defaults, then an optional file, then environment variables.
 *
 * Files ending in `.toml` or `.json` are read natively. Any other file is
 * read as the bench text format:
 *
 * ```text
 * Port Configuration: I2C,SPI,UART
 * # of sensors: 2
 * # of displays: 1
 * # of wireless adapters: 1
 * # of motor drivers: 1
 * ```
 */
use std::fs;
use std::path::{Path, PathBuf};

use config::{Config as ConfigLib, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

const PORTS_KEY: &str = "Port Configuration:";
const SENSORS_KEY: &str = "# of sensors:";
const DISPLAYS_KEY: &str = "# of displays:";
const WIRELESS_KEY: &str = "# of wireless adapters:";
const MOTOR_DRIVERS_KEY: &str = "# of motor drivers:";

/// Top-level hwbench configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Port layout and slot capacities
    #[serde(default)]
    pub bench: BenchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The parsed bench record consumed by the device registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Protocol tokens, one port per token, in declaration order
    #[serde(default)]
    pub ports: Vec<String>,

    /// Number of sensor slots
    #[serde(default)]
    pub max_sensors: usize,

    /// Number of display slots
    #[serde(default)]
    pub max_displays: usize,

    /// Number of wireless adapter slots
    #[serde(default)]
    pub max_wireless_adapters: usize,

    /// Number of motor driver slots
    #[serde(default)]
    pub max_motor_drivers: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl BenchConfig {
    /// Parse the bench text format.
    ///
    /// Lines that match none of the known keys are ignored. Protocol tokens
    /// are kept verbatim, validation happens when ports are built.
    pub fn parse_text(input: &str) -> Result<Self> {
        let mut bench = BenchConfig::default();

        for (number, line) in input.lines().enumerate() {
            let line = line.trim();

            if line.starts_with(PORTS_KEY) {
                let tokens = field_value(line);
                bench.ports.extend(
                    tokens
                        .split(',')
                        .map(str::trim)
                        .filter(|token| !token.is_empty())
                        .map(String::from),
                );
            } else if line.starts_with(SENSORS_KEY) {
                bench.max_sensors = parse_count(line, number)?;
            } else if line.starts_with(DISPLAYS_KEY) {
                bench.max_displays = parse_count(line, number)?;
            } else if line.starts_with(WIRELESS_KEY) {
                bench.max_wireless_adapters = parse_count(line, number)?;
            } else if line.starts_with(MOTOR_DRIVERS_KEY) {
                bench.max_motor_drivers = parse_count(line, number)?;
            }
        }

        Ok(bench)
    }
}

fn field_value(line: &str) -> &str {
    line.split(':').nth(1).unwrap_or_default().trim()
}

fn parse_count(line: &str, number: usize) -> Result<usize> {
    let value = field_value(line);
    value.parse().map_err(|_| {
        Error::config(format!(
            "line {}: `{}` is not a valid slot count",
            number + 1,
            value
        ))
    })
}

impl Config {
    /// An example configuration with every field filled in
    pub fn example() -> Self {
        Self {
            bench: BenchConfig {
                ports: ["I2C", "SPI", "UART", "OneWire"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                max_sensors: 2,
                max_displays: 1,
                max_wireless_adapters: 1,
                max_motor_drivers: 1,
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Serialize the configuration as human-friendly TOML
    pub fn to_toml_pretty(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize configuration: {}", e)))
    }
}

/// How a configuration file is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// TOML or JSON, read by the `config` crate
    Native,
    /// The line-oriented bench text format
    BenchText,
}

impl FileFormat {
    /// Pick the format from the file extension
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") | Some("json") => FileFormat::Native,
            _ => FileFormat::BenchText,
        }
    }
}

/// A builder for creating a configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_file: Option<PathBuf>,
    environment_prefix: Option<String>,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the config file path
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix for configuration
    pub fn with_environment_prefix<S: AsRef<str>>(mut self, prefix: S) -> Self {
        self.environment_prefix = Some(prefix.as_ref().to_string());
        self
    }

    /// Build the configuration
    ///
    /// Fails with [`Error::ConfigNotFound`] when a config file was set but
    /// does not exist.
    pub fn build(self) -> Result<Config> {
        let mut config_builder =
            ConfigLib::builder().add_source(ConfigLib::try_from(&Config::default())?);

        if let Some(path) = self.config_file {
            if !path.exists() {
                return Err(Error::ConfigNotFound(path));
            }

            match FileFormat::detect(&path) {
                FileFormat::Native => {
                    debug!("Loading configuration from {}", path.display());
                    config_builder = config_builder.add_source(File::from(path.as_path()));
                }
                FileFormat::BenchText => {
                    debug!("Loading bench text configuration from {}", path.display());
                    let text = fs::read_to_string(&path)?;
                    let parsed = Config {
                        bench: BenchConfig::parse_text(&text)?,
                        logging: LoggingConfig::default(),
                    };
                    config_builder = config_builder.add_source(ConfigLib::try_from(&parsed)?);
                }
            }
        }

        if let Some(prefix) = self.environment_prefix {
            debug!(
                "Loading configuration from environment variables with prefix {}",
                prefix
            );
            config_builder = config_builder.add_source(
                Environment::with_prefix(&prefix)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: Config = config_builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize configuration: {}", e)))?;

        info!(
            ports = config.bench.ports.len(),
            "Configuration loaded successfully"
        );
        Ok(config)
    }
}
