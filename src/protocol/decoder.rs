//! Telemetry line decoding.
//!
//! Each line starts with a mode tag followed by whitespace-separated
//! `KEY=VALUE` fields:
//! ```text
//! M0:X=+012 Y=-003 Z=+256      accelerometer
//! M1:T=23.50C                  temperature, integer and hundredths
//! M2:SW=A5F0                   switches, 4 hex digits
//! M3:RX=F0 L=A5F0              host-driven LEDs (RX is not consumed)
//! M4:X=+012 T=23C S=A5F0       combined, any subset of fields
//! ```
//! Fields are looked up by exact key, independently of their order.

use crate::error::DecodeError;
use crate::protocol::Mode;
use crate::types::TelemetryEvent;

/// Result of decoding one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Line does not start with a known tag.
    Unrecognized,
    /// Line carried a mode tag.
    Recognized {
        /// Mode announced by the tag.
        mode: Mode,
        /// Extracted fields, `None` if nothing could be extracted.
        event: Option<TelemetryEvent>,
        /// Problems with individual fields.
        errors: Vec<DecodeError>,
    },
}

/// Stateful line decoder.
///
/// Tracks the mode of the last tagged line seen.
#[derive(Debug, Default)]
pub struct LineDecoder {
    mode: Mode,
}

impl LineDecoder {
    /// Creates a decoder starting in mode 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mode of the last tagged line.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Decodes a single trimmed line.
    ///
    /// The mode is updated for any tagged line, even if all of its fields
    /// fail to parse.
    pub fn decode(&mut self, line: &str) -> Decoded {
        let Some((mode, payload)) = Mode::split_tag(line) else {
            return Decoded::Unrecognized;
        };
        self.mode = mode;

        let fields = Fields::new(payload);
        let mut errors = Vec::new();

        let event = match mode {
            Mode::Accelerometer => {
                let x = fields.signed("X", &mut errors);
                let y = fields.signed("Y", &mut errors);
                let z = fields.signed("Z", &mut errors);
                (x.is_some() || y.is_some() || z.is_some())
                    .then_some(TelemetryEvent::Accelerometer { x, y, z })
            }
            Mode::Temperature => fields
                .get("T")
                .and_then(|v| record(parse_hundredths(v), &mut errors))
                .map(TelemetryEvent::Temperature),
            Mode::Switches => fields
                .hex16("SW", &mut errors)
                .map(TelemetryEvent::Switches),
            Mode::PcLed => fields.hex16("L", &mut errors).map(TelemetryEvent::PcLed),
            Mode::Combined => {
                let x = fields.signed("X", &mut errors);
                let temperature = fields
                    .get("T")
                    .and_then(|v| record(parse_whole_celsius(v), &mut errors));
                let switches = fields.hex16("S", &mut errors);
                (x.is_some() || temperature.is_some() || switches.is_some()).then_some(
                    TelemetryEvent::Combined {
                        x,
                        temperature,
                        switches,
                    },
                )
            }
        };

        if event.is_none() && errors.is_empty() {
            errors.push(DecodeError::NoFields { mode });
        }

        Decoded::Recognized {
            mode,
            event,
            errors,
        }
    }
}

/// `KEY=VALUE` tokens of a line payload.
struct Fields<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Fields<'a> {
    fn new(payload: &'a str) -> Self {
        let pairs = payload
            .split_whitespace()
            .filter_map(|token| token.split_once('='))
            .collect();
        Self { pairs }
    }

    /// First value for `key`.
    fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .find_map(|&(k, v)| (k == key).then_some(v))
    }

    fn signed(&self, key: &'static str, errors: &mut Vec<DecodeError>) -> Option<i32> {
        self.get(key)
            .and_then(|v| record(parse_signed(key, v), errors))
    }

    fn hex16(&self, key: &'static str, errors: &mut Vec<DecodeError>) -> Option<u16> {
        self.get(key).and_then(|v| record(parse_hex16(key, v), errors))
    }
}

/// Moves a field error into `errors`.
fn record<T>(result: Result<T, DecodeError>, errors: &mut Vec<DecodeError>) -> Option<T> {
    result.map_err(|e| errors.push(e)).ok()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parses `[+-]?digits` into an `i32`.
fn parse_signed(field: &'static str, value: &str) -> Result<i32, DecodeError> {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    if !is_digits(digits) {
        return Err(DecodeError::InvalidInteger {
            field,
            value: value.to_owned(),
        });
    }
    value.parse().map_err(|_| DecodeError::InvalidInteger {
        field,
        value: value.to_owned(),
    })
}

/// Parses exactly four hex digits.
fn parse_hex16(field: &'static str, value: &str) -> Result<u16, DecodeError> {
    if value.len() != 4 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeError::InvalidHex {
            field,
            value: value.to_owned(),
        });
    }
    u16::from_str_radix(value, 16).map_err(|_| DecodeError::InvalidHex {
        field,
        value: value.to_owned(),
    })
}

/// Parses `<int>.<frac>C` as `int + frac / 100`.
///
/// The fractional digits are read as hundredths regardless of how many
/// there are, so `5.7C` and `5.07C` both give 5.07.
fn parse_hundredths(value: &str) -> Result<f64, DecodeError> {
    let invalid = || DecodeError::InvalidTemperature {
        value: value.to_owned(),
    };
    let body = value.strip_suffix('C').ok_or_else(invalid)?;
    let (int_part, frac_part) = body.split_once('.').ok_or_else(invalid)?;
    if !is_digits(int_part) || !is_digits(frac_part) {
        return Err(invalid());
    }
    let int_part: u32 = int_part.parse().map_err(|_| invalid())?;
    let frac_part: u32 = frac_part.parse().map_err(|_| invalid())?;
    Ok(f64::from(int_part) + f64::from(frac_part) / 100.0)
}

/// Parses `<int>C` into whole degrees.
fn parse_whole_celsius(value: &str) -> Result<f64, DecodeError> {
    let invalid = || DecodeError::InvalidTemperature {
        value: value.to_owned(),
    };
    let body = value.strip_suffix('C').ok_or_else(invalid)?;
    if !is_digits(body) {
        return Err(invalid());
    }
    body.parse::<u32>().map(f64::from).map_err(|_| invalid())
}
