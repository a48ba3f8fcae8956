//! Event queue from the link to its consumer.
//!
//! The read loop runs on its own task. Everything it observes (lines,
//! decoded telemetry, errors) is pushed onto an unbounded queue and the
//! consumer drains it on its own schedule, either by awaiting
//! [`EventReceiver::recv`] or by calling [`EventReceiver::drain`] on a
//! refresh tick.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::DecodeError;
use crate::protocol::{LedCommand, Mode};
use crate::types::TelemetryEvent;

/// What was sent in a [`Event::Transmitted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxPayload {
    /// 16-bit LED command.
    Led(LedCommand),
    /// Text typed as ASCII.
    Ascii(String),
    /// Bytes typed as hex.
    Hex,
    /// Bytes handed to `write_bytes` directly.
    Raw,
}

/// Event types that can be dispatched.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Connection established.
    Connected { port: String },
    /// Connection closed.
    Disconnected,
    /// A complete line was received, verbatim.
    Line(String),
    /// Raw chunk as read from the port (only when raw echo is enabled).
    RawReceived(Bytes),
    /// A tagged line announced a mode.
    Mode(Mode),
    /// Telemetry fields decoded from a line.
    Telemetry(TelemetryEvent),
    /// A tagged line had malformed or missing fields.
    DecodeError { line: String, error: DecodeError },
    /// Reading from the port failed; the read loop keeps going.
    ReadError { message: String },
    /// Bytes were written to the port.
    Transmitted { data: Bytes, payload: TxPayload },
}

/// Log category of an event, matching the log colouring of a UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    /// Outbound data.
    Tx,
    /// Inbound data.
    Rx,
    /// Failures.
    Error,
    /// Lifecycle and state updates.
    Info,
}

impl Event {
    /// Returns the log category of this event.
    #[must_use]
    pub const fn log_kind(&self) -> LogKind {
        match self {
            Self::Transmitted { .. } => LogKind::Tx,
            Self::Line(_) | Self::RawReceived(_) => LogKind::Rx,
            Self::DecodeError { .. } | Self::ReadError { .. } => LogKind::Error,
            Self::Connected { .. } | Self::Disconnected | Self::Mode(_) | Self::Telemetry(_) => {
                LogKind::Info
            }
        }
    }

    /// Returns true for events a log view usually shows.
    ///
    /// Mode and telemetry events are state updates already covered by the
    /// line they came from.
    #[must_use]
    pub const fn is_loggable(&self) -> bool {
        !matches!(self, Self::Mode(_) | Self::Telemetry(_))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected { port } => write!(f, "Connected to {port}"),
            Self::Disconnected => f.write_str("Disconnected"),
            Self::Line(line) => write!(f, "RX <- {line}"),
            Self::RawReceived(data) => write!(f, "RX RAW <- [{}]", hex::encode_upper(data)),
            Self::Mode(mode) => write!(f, "Mode {mode} ({})", mode.name()),
            Self::Telemetry(event) => write!(f, "{} {event}", event.mode()),
            Self::DecodeError { line, error } => write!(f, "Parse error: {error} in {line:?}"),
            Self::ReadError { message } => write!(f, "RX Error: {message}"),
            Self::Transmitted { data, payload } => match payload {
                TxPayload::Led(cmd) => {
                    let [low, high] = cmd.to_bytes();
                    write!(f, "TX -> 0x{:04X} [0x{low:02X}, 0x{high:02X}]", cmd.value())
                }
                TxPayload::Ascii(text) => write!(f, "TX -> '{text}'"),
                TxPayload::Hex | TxPayload::Raw => {
                    write!(f, "TX HEX -> {}", hex::encode_upper(data))
                }
            },
        }
    }
}

/// Dispatches events to the consumer.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    event_tx: mpsc::UnboundedSender<Event>,
}

impl EventDispatcher {
    /// Creates a dispatcher and the matching receiver.
    #[must_use]
    pub fn new() -> (Self, EventReceiver) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self { event_tx }, EventReceiver { event_rx })
    }

    /// Queues an event for the consumer.
    pub fn dispatch(&self, event: Event) {
        // Nobody listening is fine
        if self.event_tx.send(event).is_err() {
            tracing::trace!("event receiver dropped");
        }
    }
}

/// Consumer end of the event queue.
#[derive(Debug)]
pub struct EventReceiver {
    event_rx: mpsc::UnboundedReceiver<Event>,
}

impl EventReceiver {
    /// Receives the next event.
    ///
    /// Returns `None` once the link has been dropped and the queue is empty.
    pub async fn recv(&mut self) -> Option<Event> {
        self.event_rx.recv().await
    }

    /// Returns the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.event_rx.try_recv().ok()
    }

    /// Takes every event currently queued.
    pub fn drain(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Waits for an event matching `filter`, discarding others.
    ///
    /// Returns `None` if the timeout expires or the queue is closed.
    pub async fn wait_for<F>(&mut self, filter: F, timeout: Duration) -> Option<Event>
    where
        F: Fn(&Event) -> bool,
    {
        tokio::select! {
            biased;
            result = async {
                while let Some(event) = self.event_rx.recv().await {
                    if filter(&event) {
                        return Some(event);
                    }
                }
                None
            } => result,
            () = tokio::time::sleep(timeout) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_dispatch() {
        let (dispatcher, mut rx) = EventDispatcher::new();

        dispatcher.dispatch(Event::Disconnected);

        let event = tokio::time::timeout(Duration::from_millis(100), rx.recv())
            .await
            .unwrap();

        assert!(matches!(event, Some(Event::Disconnected)));
    }

    #[tokio::test]
    async fn test_wait_for_skips_other_events() {
        let (dispatcher, mut rx) = EventDispatcher::new();
        dispatcher.dispatch(Event::Line("x".into()));
        dispatcher.dispatch(Event::Mode(Mode::Switches));

        let event = rx
            .wait_for(|e| matches!(e, Event::Mode(_)), Duration::from_millis(100))
            .await;
        assert_eq!(event, Some(Event::Mode(Mode::Switches)));

        let none = rx
            .wait_for(|_| true, Duration::from_millis(10))
            .await;
        assert!(none.is_none());
    }

    #[test]
    fn test_drain_keeps_order() {
        let (dispatcher, mut rx) = EventDispatcher::new();
        dispatcher.dispatch(Event::Line("a".into()));
        dispatcher.dispatch(Event::Line("b".into()));
        assert_eq!(
            rx.drain(),
            [Event::Line("a".into()), Event::Line("b".into())]
        );
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_dispatch_without_receiver() {
        let (dispatcher, rx) = EventDispatcher::new();
        drop(rx);
        dispatcher.dispatch(Event::Disconnected);
    }

    #[test]
    fn test_log_lines() {
        let cmd = LedCommand::new(0xA5F0);
        let led = Event::Transmitted {
            data: Bytes::copy_from_slice(&cmd.to_bytes()),
            payload: TxPayload::Led(cmd),
        };
        assert_eq!(led.to_string(), "TX -> 0xA5F0 [0xF0, 0xA5]");
        assert_eq!(led.log_kind(), LogKind::Tx);

        let hex = Event::Transmitted {
            data: Bytes::from_static(&[0x0a, 0xff]),
            payload: TxPayload::Hex,
        };
        assert_eq!(hex.to_string(), "TX HEX -> 0AFF");

        let raw = Event::RawReceived(Bytes::from_static(b"M2"));
        assert_eq!(raw.to_string(), "RX RAW <- [4D32]");
        assert_eq!(raw.log_kind(), LogKind::Rx);

        let line = Event::Line("M2:SW=0001".into());
        assert_eq!(line.to_string(), "RX <- M2:SW=0001");
        assert!(line.is_loggable());
        assert!(!Event::Mode(Mode::Switches).is_loggable());
    }
}
