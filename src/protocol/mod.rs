//! Wire protocol between the host and the board.
//!
//! This module contains the low-level protocol pieces:
//! - Line framing of the inbound byte stream
//! - Mode tags
//! - Telemetry line decoding
//! - Outbound command encoding

pub mod command;
pub mod decoder;
pub mod line;
pub mod mode;

pub use command::{
    LedCommand, decode_led_hex_input, encode_ascii_text, encode_hex_text, encode_led16,
};
pub use decoder::{Decoded, LineDecoder};
pub use line::{LINE_TERMINATOR, LineFramer, decode_ascii_lossy};
pub use mode::Mode;
