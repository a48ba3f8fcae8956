//! Decoded telemetry updates.

use std::fmt;

use crate::protocol::Mode;

/// Field updates carried by one telemetry line.
///
/// Each variant only holds fields of its own mode. `None` means the field
/// was absent or malformed and the previous value should be kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryEvent {
    /// Accelerometer axes (mode 0).
    Accelerometer {
        x: Option<i32>,
        y: Option<i32>,
        z: Option<i32>,
    },
    /// Temperature in Celsius, hundredths resolution (mode 1).
    Temperature(f64),
    /// Switch bank (mode 2).
    Switches(u16),
    /// LED state echoed back by the board (mode 3).
    PcLed(u16),
    /// Combined readout (mode 4); temperature in whole degrees.
    Combined {
        x: Option<i32>,
        temperature: Option<f64>,
        switches: Option<u16>,
    },
}

impl TelemetryEvent {
    /// Returns the mode this event belongs to.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Accelerometer { .. } => Mode::Accelerometer,
            Self::Temperature(_) => Mode::Temperature,
            Self::Switches(_) => Mode::Switches,
            Self::PcLed(_) => Mode::PcLed,
            Self::Combined { .. } => Mode::Combined,
        }
    }
}

fn write_opt<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    sep: &str,
    key: &str,
    value: Option<T>,
) -> fmt::Result {
    match value {
        Some(v) => write!(f, "{sep}{key}={v}"),
        None => write!(f, "{sep}{key}=?"),
    }
}

impl fmt::Display for TelemetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Accelerometer { x, y, z } => {
                write_opt(f, "", "X", x)?;
                write_opt(f, " ", "Y", y)?;
                write_opt(f, " ", "Z", z)
            }
            Self::Temperature(t) => write!(f, "T={t:.2}°C"),
            Self::Switches(sw) => write!(f, "SW=0x{sw:04X}"),
            Self::PcLed(led) => write!(f, "LED=0x{led:04X}"),
            Self::Combined {
                x,
                temperature,
                switches,
            } => {
                write_opt(f, "", "X", x)?;
                write_opt(f, " ", "T", temperature)?;
                write_opt(f, " ", "SW", switches.map(|s| format!("0x{s:04X}")))
            }
        }
    }
}
