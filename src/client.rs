//! Main [`NexysLink`] client implementation.
//!
//! This module provides the high-level client that combines the transport,
//! the background read loop, byte counters and the event queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::event::{Event, EventDispatcher, EventReceiver, TxPayload};
use crate::protocol::{LedCommand, decode_led_hex_input, encode_ascii_text, encode_hex_text};
use crate::transport::{ReadLoop, SerialConfig, SerialTransport, Transport};
use crate::types::{ByteCounters, CounterSnapshot};

/// Client for communicating with the board.
///
/// Connect, disconnect and every send happen on the caller's task. The only
/// concurrent work is the read loop, which reports back through the
/// [`EventReceiver`] returned alongside the client.
pub struct NexysLink<T> {
    transport: T,
    config: SerialConfig,
    dispatcher: EventDispatcher,
    counters: Arc<ByteCounters>,
    raw_echo: Arc<AtomicBool>,

    // Connection state
    port: Option<String>,
    stop_tx: Option<watch::Sender<bool>>,
    read_task: Option<JoinHandle<()>>,
}

impl NexysLink<SerialTransport> {
    /// Creates a new client for serial ports with default settings.
    ///
    /// # Returns
    ///
    /// A new client (not yet connected) and its event queue.
    #[must_use]
    pub fn serial() -> (Self, EventReceiver) {
        Self::with_serial_config(SerialConfig::new())
    }

    /// Creates a new client with custom serial configuration.
    #[must_use]
    pub fn with_serial_config(config: SerialConfig) -> (Self, EventReceiver) {
        let transport = SerialTransport::new(config.clone());
        Self::new(transport, config)
    }
}

impl<T: Transport> NexysLink<T> {
    /// Creates a new client with the given transport.
    #[must_use]
    pub fn new(transport: T, config: SerialConfig) -> (Self, EventReceiver) {
        let (dispatcher, events) = EventDispatcher::new();
        let raw_echo = Arc::new(AtomicBool::new(config.raw_echo));

        let link = Self {
            transport,
            config,
            dispatcher,
            counters: Arc::new(ByteCounters::new()),
            raw_echo,
            port: None,
            stop_tx: None,
            read_task: None,
        };
        (link, events)
    }

    /// Opens `port` and starts the read loop.
    ///
    /// An existing connection is closed first. Counters start from zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the device cannot be opened.
    pub async fn connect(&mut self, port: &str) -> Result<()> {
        if self.is_connected() {
            self.disconnect().await;
        }

        tracing::info!("connecting to {}", port);

        let reader = match self.transport.connect(port).await {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!("connect to {} failed: {}", port, e);
                return Err(e);
            }
        };

        self.counters.reset();

        let (stop_tx, stop_rx) = watch::channel(false);
        let read_loop = ReadLoop::new(
            Arc::clone(&self.counters),
            self.dispatcher.clone(),
            Arc::clone(&self.raw_echo),
            self.config.poll_interval,
        );
        self.read_task = Some(tokio::spawn(read_loop.run(reader, stop_rx)));
        self.stop_tx = Some(stop_tx);
        self.port = Some(port.to_owned());

        tracing::info!("connected to {}", port);
        self.dispatcher.dispatch(Event::Connected {
            port: port.to_owned(),
        });
        Ok(())
    }

    /// Stops the read loop and closes the port.
    ///
    /// Does nothing if not connected.
    pub async fn disconnect(&mut self) {
        let Some(stop_tx) = self.stop_tx.take() else {
            return;
        };
        stop_tx.send_replace(true);

        if let Some(mut task) = self.read_task.take() {
            if tokio::time::timeout(self.config.disconnect_grace, &mut task)
                .await
                .is_err()
            {
                tracing::warn!("read loop still running after grace period, aborting");
                task.abort();
            }
        }

        if let Err(e) = self.transport.disconnect().await {
            tracing::warn!("error closing port: {}", e);
        }

        let port = self.port.take().unwrap_or_default();
        tracing::info!("disconnected from {}", port);
        self.dispatcher.dispatch(Event::Disconnected);
    }

    /// Returns true if connected.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.stop_tx.is_some()
    }

    /// Returns the port of the open connection.
    #[must_use]
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Returns the RX/TX totals of the current connection.
    #[must_use]
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Turns the raw hex echo of received chunks on or off.
    pub fn set_raw_echo(&self, enabled: bool) {
        self.raw_echo.store(enabled, Ordering::Relaxed);
    }

    /// Returns true if the raw hex echo is on.
    #[must_use]
    pub fn raw_echo(&self) -> bool {
        self.raw_echo.load(Ordering::Relaxed)
    }

    // ==================== Sending ====================

    /// Writes raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] or [`Error::Write`]. The connection
    /// stays open after a failed write.
    pub async fn write_bytes(&mut self, data: &[u8]) -> Result<usize> {
        self.transmit(Bytes::copy_from_slice(data), TxPayload::Raw)
            .await
    }

    /// Sends a 16-bit LED state, masking `value` to 16 bits.
    pub async fn send_led(&mut self, value: u32) -> Result<LedCommand> {
        let cmd = LedCommand::new(value);
        let data = Bytes::copy_from_slice(&cmd.to_bytes());
        self.transmit(data, TxPayload::Led(cmd)).await?;
        Ok(cmd)
    }

    /// Parses an LED entry such as `"A5F0"` or `"0x00ff"` and sends it.
    pub async fn send_led_hex(&mut self, text: &str) -> Result<LedCommand> {
        let value = decode_led_hex_input(text)?;
        self.send_led(u32::from(value)).await
    }

    /// Sends text as ASCII bytes.
    pub async fn send_ascii(&mut self, text: &str) -> Result<usize> {
        let data = encode_ascii_text(text)?;
        self.transmit(data, TxPayload::Ascii(text.to_owned()))
            .await
    }

    /// Sends typed hex (`"A5 F0"`, `"0xA5 0xF0"`) as raw bytes.
    pub async fn send_hex(&mut self, text: &str) -> Result<usize> {
        let data = encode_hex_text(text)?;
        self.transmit(data, TxPayload::Hex).await
    }

    async fn transmit(&mut self, data: Bytes, payload: TxPayload) -> Result<usize> {
        if !self.transport.is_connected() {
            return Err(Error::NotConnected);
        }

        let written = match self.transport.send(data.clone()).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("TX error: {}", e);
                return Err(e);
            }
        };
        self.counters.add_tx(written);

        self.dispatcher
            .dispatch(Event::Transmitted { data, payload });
        Ok(written)
    }
}
