//! Error types for the nexys-link library.

use thiserror::Error;

use crate::protocol::Mode;

/// The main error type for nexys-link operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Serial port error.
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device could not be opened (missing, busy, permission denied).
    #[error("cannot open {port}: {reason}")]
    Connection { port: String, reason: String },

    /// Connection is not established.
    #[error("not connected")]
    NotConnected,

    /// Write failed on an open connection.
    #[error("write failed: {reason}")]
    Write { reason: String },

    /// User-supplied payload could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// LED value is not valid hex or does not fit in 16 bits.
    #[error("invalid LED value {input:?}: expected hex 0000-FFFF")]
    Range { input: String },
}

/// Errors raised while turning user text into wire bytes.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// Nothing to send.
    #[error("empty payload")]
    Empty,

    /// Character outside 7-bit ASCII.
    #[error("non-ASCII character {ch:?} at index {index}")]
    NonAscii { ch: char, index: usize },

    /// Odd length or non-hex digit.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Field-level errors on a line with a recognized tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Signed integer field did not parse.
    #[error("{field}: invalid integer {value:?}")]
    InvalidInteger { field: &'static str, value: String },

    /// Hex field is not exactly 4 hex digits.
    #[error("{field}: expected 4 hex digits, got {value:?}")]
    InvalidHex { field: &'static str, value: String },

    /// Temperature field does not match its format.
    #[error("T: invalid temperature {value:?}")]
    InvalidTemperature { value: String },

    /// Line carried the tag but no known field.
    #[error("no fields found for mode {mode}")]
    NoFields { mode: Mode },
}

/// Result type alias for nexys-link operations.
pub type Result<T> = std::result::Result<T, Error>;
