/*!
 * Bench commands.
 *
 * A command line is trimmed and split on runs of whitespace. The first token
 * is the verb, matched case-sensitively; the remaining tokens are its
 * arguments. Free text arguments are re-joined with single spaces.
 */
use std::fmt;
use std::str::FromStr;

use hwbench_devices::{Category, DeviceError};

use crate::error::CommandError;

/// What `list` shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    /// Every port and its occupant
    Ports,
    /// The devices of one category
    Category(Category),
}

impl FromStr for ListTarget {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ports") {
            return Ok(ListTarget::Ports);
        }

        Category::from_token(s)
            .map(ListTarget::Category)
            .ok_or_else(|| DeviceError::UnknownCategory(s.to_string()))
    }
}

/// A parsed bench command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `turnON <portID>`
    TurnOn {
        /// Port index
        port: i32,
    },
    /// `turnOFF <portID>`
    TurnOff {
        /// Port index
        port: i32,
    },
    /// `addDev <devName> <portID> <devID>`
    AddDev {
        /// Device kind name
        kind: String,
        /// Port index
        port: i32,
        /// Category slot
        dev_id: i32,
    },
    /// `rmDev <portID>`
    RmDev {
        /// Port index
        port: i32,
    },
    /// `list ports` or `list <DeviceType>`
    List(ListTarget),
    /// `readSensor <devID>`
    ReadSensor {
        /// Sensor slot
        dev_id: i32,
    },
    /// `printDisplay <devID> <String>`
    PrintDisplay {
        /// Display slot
        dev_id: i32,
        /// Text to print
        text: String,
    },
    /// `readWireless <devID>`
    ReadWireless {
        /// Wireless adapter slot
        dev_id: i32,
    },
    /// `writeWireless <devID> <String>`
    WriteWireless {
        /// Wireless adapter slot
        dev_id: i32,
        /// Message to send
        text: String,
    },
    /// `setMotorSpeed <devID> <speed>`
    SetMotorSpeed {
        /// Motor driver slot
        dev_id: i32,
        /// Speed to set
        speed: i32,
    },
    /// `exit`
    Exit,
}

const TURN_ON_USAGE: &str = "turnON <portID>";
const TURN_OFF_USAGE: &str = "turnOFF <portID>";
const ADD_DEV_USAGE: &str = "addDev <devName> <portID> <devID>";
const RM_DEV_USAGE: &str = "rmDev <portID>";
const LIST_USAGE: &str = "list ports OR list <DeviceType>";
const READ_SENSOR_USAGE: &str = "readSensor <devID>";
const PRINT_DISPLAY_USAGE: &str = "printDisplay <devID> <String>";
const READ_WIRELESS_USAGE: &str = "readWireless <devID>";
const WRITE_WIRELESS_USAGE: &str = "writeWireless <devID> <String>";
const SET_MOTOR_SPEED_USAGE: &str = "setMotorSpeed <devID> <speed>";

fn int(field: &'static str, token: &str) -> Result<i32, CommandError> {
    token
        .parse::<i32>()
        .map_err(|_| CommandError::bad_integer(field, token))
}

fn exactly<'a>(
    args: &'a [&'a str],
    count: usize,
    usage: &'static str,
) -> Result<&'a [&'a str], CommandError> {
    if args.len() == count {
        Ok(args)
    } else {
        Err(CommandError::usage(usage))
    }
}

impl Command {
    /// Parse one command line
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((verb, args)) = parts.split_first() else {
            return Err(CommandError::UnknownCommand(line.trim().to_string()));
        };

        match *verb {
            "turnON" => {
                let args = exactly(args, 1, TURN_ON_USAGE)?;
                Ok(Command::TurnOn {
                    port: int("portID", args[0])?,
                })
            }
            "turnOFF" => {
                let args = exactly(args, 1, TURN_OFF_USAGE)?;
                Ok(Command::TurnOff {
                    port: int("portID", args[0])?,
                })
            }
            "addDev" => {
                let args = exactly(args, 3, ADD_DEV_USAGE)?;
                Ok(Command::AddDev {
                    kind: args[0].to_string(),
                    port: int("portID", args[1])?,
                    dev_id: int("devID", args[2])?,
                })
            }
            "rmDev" => {
                let args = exactly(args, 1, RM_DEV_USAGE)?;
                Ok(Command::RmDev {
                    port: int("portID", args[0])?,
                })
            }
            "list" => {
                let args = exactly(args, 1, LIST_USAGE)?;
                Ok(Command::List(args[0].parse()?))
            }
            "readSensor" => {
                let args = exactly(args, 1, READ_SENSOR_USAGE)?;
                Ok(Command::ReadSensor {
                    dev_id: int("devID", args[0])?,
                })
            }
            "printDisplay" => {
                if args.len() < 2 {
                    return Err(CommandError::usage(PRINT_DISPLAY_USAGE));
                }
                Ok(Command::PrintDisplay {
                    dev_id: int("devID", args[0])?,
                    text: args[1..].join(" "),
                })
            }
            "readWireless" => {
                let args = exactly(args, 1, READ_WIRELESS_USAGE)?;
                Ok(Command::ReadWireless {
                    dev_id: int("devID", args[0])?,
                })
            }
            "writeWireless" => {
                if args.len() < 2 {
                    return Err(CommandError::usage(WRITE_WIRELESS_USAGE));
                }
                Ok(Command::WriteWireless {
                    dev_id: int("devID", args[0])?,
                    text: args[1..].join(" "),
                })
            }
            "setMotorSpeed" => {
                let args = exactly(args, 2, SET_MOTOR_SPEED_USAGE)?;
                Ok(Command::SetMotorSpeed {
                    dev_id: int("devID", args[0])?,
                    speed: int("speed", args[1])?,
                })
            }
            // Trailing tokens after `exit` are ignored
            "exit" => Ok(Command::Exit),
            _ => Err(CommandError::UnknownCommand(line.trim().to_string())),
        }
    }

    /// The verb of the command
    pub fn verb(&self) -> &'static str {
        match self {
            Command::TurnOn { .. } => "turnON",
            Command::TurnOff { .. } => "turnOFF",
            Command::AddDev { .. } => "addDev",
            Command::RmDev { .. } => "rmDev",
            Command::List(_) => "list",
            Command::ReadSensor { .. } => "readSensor",
            Command::PrintDisplay { .. } => "printDisplay",
            Command::ReadWireless { .. } => "readWireless",
            Command::WriteWireless { .. } => "writeWireless",
            Command::SetMotorSpeed { .. } => "setMotorSpeed",
            Command::Exit => "exit",
        }
    }

    /// Whether the line is the terminating `exit`
    pub fn is_exit_line(line: &str) -> bool {
        line.trim() == "exit"
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

impl fmt::Display for ListTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListTarget::Ports => f.write_str("ports"),
            ListTarget::Category(category) => write!(f, "{}", category),
        }
    }
}
