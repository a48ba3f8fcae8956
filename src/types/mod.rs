//! Data types shared between the read loop and the consumer.
//!
//! This module contains:
//! - Decoded telemetry updates
//! - The consumer-owned board state
//! - Byte counters

pub mod counters;
pub mod state;
pub mod telemetry;

pub use counters::{ByteCounters, CounterSnapshot};
pub use state::{TelemetryState, grouped_binary};
pub use telemetry::TelemetryEvent;
