//! Serial/USB transport implementation.
//!
//! The Nexys A7 exposes its UART through the on-board FTDI bridge, which
//! shows up as a regular serial port on the host.

use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Baud rate of the board's UART. Not configurable on the FPGA side.
pub const BAUD_RATE: u32 = 115_200;

/// Default read timeout of the port.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Default idle time of the read loop when no bytes are available.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default time `disconnect` waits for the read loop to stop.
pub const DEFAULT_DISCONNECT_GRACE: Duration = Duration::from_millis(200);

/// Suggested consumer refresh cadence for draining events.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for the serial link.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Read timeout of the port.
    pub read_timeout: Duration,
    /// Idle time between reads when nothing is available.
    pub poll_interval: Duration,
    /// How long `disconnect` waits for the read loop.
    pub disconnect_grace: Duration,
    /// Echo every received chunk as hex.
    pub raw_echo: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialConfig {
    /// Creates a new serial configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            disconnect_grace: DEFAULT_DISCONNECT_GRACE,
            raw_echo: false,
        }
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the read loop poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the disconnect grace period.
    #[must_use]
    pub const fn disconnect_grace(mut self, grace: Duration) -> Self {
        self.disconnect_grace = grace;
        self
    }

    /// Enables or disables the raw hex echo.
    #[must_use]
    pub const fn raw_echo(mut self, enabled: bool) -> Self {
        self.raw_echo = enabled;
        self
    }
}

/// Serial transport for board communication.
///
/// The stream is split; the read half goes to the read loop and the write
/// half stays here. The port closes once both halves are dropped.
pub struct SerialTransport {
    config: SerialConfig,
    writer: Option<WriteHalf<SerialStream>>,
}

impl SerialTransport {
    /// Creates a new serial transport with the given configuration.
    #[must_use]
    pub const fn new(config: SerialConfig) -> Self {
        Self {
            config,
            writer: None,
        }
    }
}

impl Transport for SerialTransport {
    type Reader = ReadHalf<SerialStream>;

    fn connect<'a>(&'a mut self, port: &'a str) -> BoxFuture<'a, Result<Self::Reader>> {
        Box::pin(async move {
            self.writer = None;

            tracing::debug!("opening {} at {} baud", port, BAUD_RATE);

            let stream = tokio_serial::new(port, BAUD_RATE)
                .timeout(self.config.read_timeout)
                .open_native_async()
                .map_err(|e| Error::Connection {
                    port: port.to_owned(),
                    reason: e.to_string(),
                })?;

            let (reader, writer) = tokio::io::split(stream);
            self.writer = Some(writer);
            Ok(reader)
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if let Some(mut writer) = self.writer.take() {
                tracing::debug!("closing serial port");
                // Writer is dropped either way, the error is only reported
                writer.shutdown().await.map_err(Error::Io)?;
            }
            Ok(())
        })
    }

    fn send(&mut self, data: Bytes) -> BoxFuture<'_, Result<usize>> {
        Box::pin(async move {
            let writer = self.writer.as_mut().ok_or(Error::NotConnected)?;

            tracing::trace!("writing {} bytes", data.len());

            let write_failed = |e: std::io::Error| Error::Write {
                reason: e.to_string(),
            };
            writer.write_all(&data).await.map_err(write_failed)?;
            writer.flush().await.map_err(write_failed)?;

            Ok(data.len())
        })
    }

    fn is_connected(&self) -> bool {
        self.writer.is_some()
    }
}

/// Lists available serial ports.
///
/// # Errors
///
/// Returns an error if the port list cannot be retrieved.
pub fn list_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().map_err(Error::Serial)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
