//! # nexys-link
//!
//! Async host-side link to a Nexys A7 FPGA board over its USB-UART bridge.
//!
//! The board streams newline-terminated telemetry lines (`M0:`..`M4:`) and
//! accepts a 2-byte LED command plus raw ASCII/hex payloads.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Background read loop with line reassembly across arbitrary reads
//! - Typed telemetry decoding that tolerates malformed fields
//! - Single-consumer event queue for UI or logging front ends
//!
//! ## Quick Start
//!
//! ```no_run
//! use nexys_link::{Event, NexysLink, TelemetryState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nexys_link::Error> {
//!     let (mut link, mut events) = NexysLink::serial();
//!     link.connect("/dev/ttyUSB1").await?;
//!
//!     // Light LEDs 4-7 and 12-15
//!     link.send_led(0xF0F0).await?;
//!
//!     let mut state = TelemetryState::new();
//!     while let Some(event) = events.recv().await {
//!         println!("{event}");
//!         state.apply(&event);
//!         if matches!(event, Event::Telemetry(_)) {
//!             break;
//!         }
//!     }
//!     println!("switches: {:#06x}", state.switches);
//!
//!     link.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`protocol`] - Line framing, mode tags, line decoding, command encoding
//! - [`types`] - Telemetry updates, consumer state, byte counters
//! - [`transport`] - Transport trait, serial implementation, read loop
//! - [`event`] - Event queue from the read loop to the consumer
//! - [`client`] - High-level [`NexysLink`] client

pub mod client;
pub mod error;
pub mod event;
pub mod protocol;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use client::NexysLink;
pub use error::{DecodeError, EncodingError, Error, Result};
pub use event::{Event, EventDispatcher, EventReceiver, LogKind, TxPayload};
pub use protocol::{
    Decoded, LedCommand, LineDecoder, LineFramer, Mode, decode_led_hex_input, encode_ascii_text,
    encode_hex_text, encode_led16,
};
pub use transport::{
    SerialConfig, SerialTransport, Transport,
    serial::{BAUD_RATE, REFRESH_INTERVAL, list_ports},
};
pub use types::{ByteCounters, CounterSnapshot, TelemetryEvent, TelemetryState, grouped_binary};
