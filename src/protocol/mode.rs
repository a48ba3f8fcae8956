//! Telemetry mode definitions.
//!
//! The board announces which message family it is streaming with a
//! `M<n>:` prefix on every line. The mode follows the board's push buttons.

use std::fmt;

/// Telemetry message family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Mode {
    /// ADXL362 accelerometer axes (BTNU).
    #[default]
    Accelerometer = 0,
    /// ADT7420 temperature (BTNL).
    Temperature = 1,
    /// Switch bank mirrored onto the LEDs (BTNR).
    Switches = 2,
    /// LEDs driven from the host (BTND).
    PcLed = 3,
    /// Accelerometer X, temperature and switches together (BTNC).
    Combined = 4,
}

impl Mode {
    /// All modes in tag order.
    pub const ALL: [Self; 5] = [
        Self::Accelerometer,
        Self::Temperature,
        Self::Switches,
        Self::PcLed,
        Self::Combined,
    ];

    /// Parses a mode from its number.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Accelerometer),
            1 => Some(Self::Temperature),
            2 => Some(Self::Switches),
            3 => Some(Self::PcLed),
            4 => Some(Self::Combined),
            _ => None,
        }
    }

    /// Line prefix announcing this mode.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Accelerometer => "M0:",
            Self::Temperature => "M1:",
            Self::Switches => "M2:",
            Self::PcLed => "M3:",
            Self::Combined => "M4:",
        }
    }

    /// Splits a line into its mode and the payload after the tag.
    ///
    /// Matching is a case-sensitive literal prefix match.
    #[must_use]
    pub fn split_tag(line: &str) -> Option<(Self, &str)> {
        Self::ALL
            .into_iter()
            .find_map(|mode| line.strip_prefix(mode.tag()).map(|rest| (mode, rest)))
    }

    /// Short human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Accelerometer => "Accel",
            Self::Temperature => "Temp",
            Self::Switches => "SW->LED",
            Self::PcLed => "PC->LED",
            Self::Combined => "Combined",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", *self as u8)
    }
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> Self {
        mode as Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_byte() {
        assert_eq!(Mode::from_byte(0), Some(Mode::Accelerometer));
        assert_eq!(Mode::from_byte(4), Some(Mode::Combined));
        assert_eq!(Mode::from_byte(5), None);
    }

    #[test]
    fn test_split_tag() {
        assert_eq!(
            Mode::split_tag("M2:SW=00FF"),
            Some((Mode::Switches, "SW=00FF"))
        );
        assert_eq!(Mode::split_tag("M4:"), Some((Mode::Combined, "")));
        assert_eq!(Mode::split_tag("m2:SW=00FF"), None);
        assert_eq!(Mode::split_tag("M5:X=1"), None);
        assert_eq!(Mode::split_tag("xM0:X=1"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Mode::PcLed.to_string(), "M3");
        assert_eq!(u8::from(Mode::Combined), 4);
    }
}
