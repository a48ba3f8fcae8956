//! Outbound command encoding.
//!
//! The only structured command is the 16-bit LED state, sent as two raw
//! bytes, low byte first:
//! ```text
//! ┌───────────┬───────────┐
//! │ LED[7:0]  │ LED[15:8] │
//! └───────────┴───────────┘
//! ```
//! Everything else is sent verbatim, typed as ASCII or hex.

use bytes::Bytes;

use crate::error::{EncodingError, Error, Result};

/// Encodes a 16-bit LED state as `[low, high]`.
///
/// Values wider than 16 bits are masked.
#[must_use]
pub const fn encode_led16(value: u32) -> [u8; 2] {
    let value = value & 0xFFFF;
    [(value & 0xFF) as u8, ((value >> 8) & 0xFF) as u8]
}

/// Encodes text as 7-bit ASCII bytes.
pub fn encode_ascii_text(text: &str) -> std::result::Result<Bytes, EncodingError> {
    if text.is_empty() {
        return Err(EncodingError::Empty);
    }
    if let Some((index, ch)) = text.char_indices().find(|(_, ch)| !ch.is_ascii()) {
        return Err(EncodingError::NonAscii { ch, index });
    }
    Ok(Bytes::copy_from_slice(text.as_bytes()))
}

/// Decodes typed hex such as `"A5 F0"`, `"0xA5 0xF0"` or `"0xA5F0"`.
///
/// Whitespace and every `0x`/`0X` marker are removed before decoding.
pub fn encode_hex_text(text: &str) -> std::result::Result<Bytes, EncodingError> {
    let cleaned: String = text.split_whitespace().collect();
    let cleaned = cleaned.replace("0x", "").replace("0X", "");
    if cleaned.is_empty() {
        return Err(EncodingError::Empty);
    }
    Ok(Bytes::from(hex::decode(cleaned)?))
}

/// Parses the LED entry field (`"a5f0"`, `"0xA5F0"`, `" 00ff "`).
pub fn decode_led_hex_input(text: &str) -> Result<u16> {
    let cleaned: String = text.split_whitespace().collect::<String>().to_uppercase();
    let digits = cleaned.strip_prefix("0X").unwrap_or(&cleaned);
    let out_of_range = || Error::Range {
        input: text.to_owned(),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(out_of_range());
    }
    let value = u32::from_str_radix(digits, 16).map_err(|_| out_of_range())?;
    u16::try_from(value).map_err(|_| out_of_range())
}

/// A 16-bit LED state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LedCommand(u16);

impl LedCommand {
    /// Number of user LEDs on the board.
    pub const LED_COUNT: usize = 16;

    /// All LEDs off.
    pub const OFF: Self = Self(0x0000);
    /// LEDs 0-7 on.
    pub const LOW8: Self = Self(0x00FF);
    /// LEDs 8-15 on.
    pub const HIGH8: Self = Self(0xFF00);
    /// Even LEDs on.
    pub const ALT1: Self = Self(0x5555);
    /// Odd LEDs on.
    pub const ALT2: Self = Self(0xAAAA);
    /// All LEDs on.
    pub const ALL: Self = Self(0xFFFF);

    /// Creates a command, masking `value` to 16 bits.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self((value & 0xFFFF) as u16)
    }

    /// Builds a command from per-LED states, LED 0 first.
    ///
    /// Entries past the sixteenth are ignored.
    #[must_use]
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let value = bits
            .into_iter()
            .take(Self::LED_COUNT)
            .enumerate()
            .filter(|&(_, on)| on)
            .fold(0u16, |acc, (i, _)| acc | (1 << i));
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Returns true if LED `index` is on.
    #[must_use]
    pub const fn is_lit(self, index: usize) -> bool {
        index < Self::LED_COUNT && self.0 & (1 << index) != 0
    }

    /// Wire bytes, low byte first.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 2] {
        encode_led16(self.0 as u32)
    }
}

impl From<u16> for LedCommand {
    fn from(value: u16) -> Self {
        Self(value)
    }
}
