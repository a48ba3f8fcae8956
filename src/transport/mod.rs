//! Transport layer for board communication.
//!
//! This module provides the abstraction over the physical link and the
//! background read loop that drives the protocol engine. Currently only
//! USB/UART is implemented.

pub mod reader;
pub mod serial;

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::io::AsyncRead;

use crate::error::Result;

/// Trait for transport implementations.
pub trait Transport: Send {
    /// Read half handed to the read loop.
    type Reader: AsyncRead + Unpin + Send + 'static;

    /// Opens the device and returns its read half.
    fn connect<'a>(&'a mut self, port: &'a str) -> BoxFuture<'a, Result<Self::Reader>>;

    /// Closes the write half. Does nothing if not connected.
    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Writes `data` in one go, returning the number of bytes written.
    fn send(&mut self, data: Bytes) -> BoxFuture<'_, Result<usize>>;

    /// Returns true if connected.
    fn is_connected(&self) -> bool;
}

pub use reader::ReadLoop;
pub use serial::{SerialConfig, SerialTransport};
