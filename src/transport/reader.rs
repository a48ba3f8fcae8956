//! Background read loop.
//!
//! Pulls whatever bytes the device has, frames them into lines, decodes the
//! lines and queues the results for the consumer. The loop only ends when
//! it is told to stop; I/O and data errors are reported and skipped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;

use crate::event::{Event, EventDispatcher};
use crate::protocol::{Decoded, LineDecoder, LineFramer};
use crate::types::ByteCounters;

/// Size of the read buffer; a single read takes at most this much.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Protocol state owned by the read task for the lifetime of a connection.
pub struct ReadLoop {
    framer: LineFramer,
    decoder: LineDecoder,
    counters: Arc<ByteCounters>,
    dispatcher: EventDispatcher,
    raw_echo: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl ReadLoop {
    /// Creates a read loop with a fresh framer and decoder.
    #[must_use]
    pub fn new(
        counters: Arc<ByteCounters>,
        dispatcher: EventDispatcher,
        raw_echo: Arc<AtomicBool>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            framer: LineFramer::new(),
            decoder: LineDecoder::new(),
            counters,
            dispatcher,
            raw_echo,
            poll_interval,
        }
    }

    /// Runs until `stop` turns true or its sender is dropped.
    ///
    /// This should be spawned as a separate task.
    pub async fn run<R>(mut self, mut reader: R, mut stop: watch::Receiver<bool>)
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            if *stop.borrow_and_update() {
                break;
            }

            let read = tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() {
                        tracing::debug!("stop sender dropped");
                        break;
                    }
                    continue;
                }
                read = reader.read(&mut buf) => read,
            };

            match read {
                Ok(0) => tokio::time::sleep(self.poll_interval).await,
                Ok(n) => self.handle_chunk(&buf[..n]),
                Err(e) => {
                    tracing::warn!("serial read error: {}", e);
                    self.dispatcher.dispatch(Event::ReadError {
                        message: e.to_string(),
                    });
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        tracing::debug!(
            "read loop stopped with {} bytes unframed",
            self.framer.buffered()
        );
    }

    /// Processes one chunk exactly as read from the device.
    pub fn handle_chunk(&mut self, chunk: &[u8]) {
        tracing::trace!("received {} bytes", chunk.len());
        self.counters.add_rx(chunk.len());

        if self.raw_echo.load(Ordering::Relaxed) {
            self.dispatcher
                .dispatch(Event::RawReceived(Bytes::copy_from_slice(chunk)));
        }

        for line in self.framer.feed(chunk) {
            self.handle_line(line);
        }
    }

    fn handle_line(&mut self, line: String) {
        tracing::trace!("line: {}", line);

        self.dispatcher.dispatch(Event::Line(line.clone()));

        match self.decoder.decode(&line) {
            Decoded::Unrecognized => tracing::trace!("untagged line ignored"),
            Decoded::Recognized {
                mode,
                event,
                errors,
            } => {
                self.dispatcher.dispatch(Event::Mode(mode));
                if let Some(event) = event {
                    self.dispatcher.dispatch(Event::Telemetry(event));
                }
                for error in errors {
                    tracing::warn!("decode error: {}", error);
                    self.dispatcher.dispatch(Event::DecodeError {
                        line: line.clone(),
                        error,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::event::EventReceiver;
    use crate::protocol::Mode;
    use crate::test_support::init_tracing;
    use crate::types::{CounterSnapshot, TelemetryEvent};
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncWriteExt, ReadBuf};

    /// Fails a number of reads, then yields `data` once, then reads as idle.
    struct FlakyReader {
        failures: usize,
        data: Option<&'static [u8]>,
    }

    impl AsyncRead for FlakyReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.failures > 0 {
                self.failures -= 1;
                return Poll::Ready(Err(io::Error::other("glitch")));
            }
            if let Some(data) = self.data.take() {
                buf.put_slice(data);
            }
            Poll::Ready(Ok(()))
        }
    }

    fn read_loop(raw_echo: bool) -> (ReadLoop, EventReceiver, Arc<ByteCounters>) {
        let (dispatcher, rx) = EventDispatcher::new();
        let counters = Arc::new(ByteCounters::new());
        let read_loop = ReadLoop::new(
            Arc::clone(&counters),
            dispatcher,
            Arc::new(AtomicBool::new(raw_echo)),
            Duration::from_millis(1),
        );
        (read_loop, rx, counters)
    }

    #[test]
    fn test_line_then_decoded_events() {
        let (mut read_loop, mut rx, counters) = read_loop(false);
        read_loop.handle_chunk(b"M2:SW=A5F0\n");

        assert_eq!(
            rx.drain(),
            [
                Event::Line("M2:SW=A5F0".into()),
                Event::Mode(Mode::Switches),
                Event::Telemetry(TelemetryEvent::Switches(0xA5F0)),
            ]
        );
        assert_eq!(counters.snapshot(), CounterSnapshot { rx: 11, tx: 0 });
    }

    #[test]
    fn test_partial_line_across_chunks() {
        let (mut read_loop, mut rx, _) = read_loop(false);
        read_loop.handle_chunk(b"M0:X=+01");
        assert!(rx.drain().is_empty());

        read_loop.handle_chunk(b"0 Y=+020 Z=+030\n");
        let telemetry: Vec<_> = rx
            .drain()
            .into_iter()
            .filter(|e| matches!(e, Event::Telemetry(_)))
            .collect();
        assert_eq!(
            telemetry,
            [Event::Telemetry(TelemetryEvent::Accelerometer {
                x: Some(10),
                y: Some(20),
                z: Some(30)
            })]
        );
    }

    #[test]
    fn test_decode_error_does_not_stop_stream() {
        let (mut read_loop, mut rx, _) = read_loop(false);
        read_loop.handle_chunk(b"M2:SW=XYZ1\nM3:L=0001\n");

        assert_eq!(
            rx.drain(),
            [
                Event::Line("M2:SW=XYZ1".into()),
                Event::Mode(Mode::Switches),
                Event::DecodeError {
                    line: "M2:SW=XYZ1".into(),
                    error: DecodeError::InvalidHex {
                        field: "SW",
                        value: "XYZ1".into()
                    },
                },
                Event::Line("M3:L=0001".into()),
                Event::Mode(Mode::PcLed),
                Event::Telemetry(TelemetryEvent::PcLed(1)),
            ]
        );
    }

    #[test]
    fn test_unrecognized_line_only_logged() {
        let (mut read_loop, mut rx, _) = read_loop(false);
        read_loop.handle_chunk(b"hello board\n");
        assert_eq!(rx.drain(), [Event::Line("hello board".into())]);
    }

    #[test]
    fn test_raw_echo() {
        let (mut read_loop, mut rx, _) = read_loop(true);
        read_loop.handle_chunk(b"M2:");
        assert_eq!(
            rx.drain(),
            [Event::RawReceived(Bytes::from_static(b"M2:"))]
        );
    }

    #[tokio::test]
    async fn test_run_until_stopped() {
        init_tracing();
        let (read_loop, mut rx, counters) = read_loop(false);
        let (host, mut board) = tokio::io::duplex(64);
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(read_loop.run(host, stop_rx));

        board.write_all(b"M4:X=-005 ").await.unwrap();
        board.write_all(b"S=00FF\n").await.unwrap();

        let event = rx
            .wait_for(
                |e| matches!(e, Event::Telemetry(_)),
                Duration::from_secs(1),
            )
            .await;
        assert_eq!(
            event,
            Some(Event::Telemetry(TelemetryEvent::Combined {
                x: Some(-5),
                temperature: None,
                switches: Some(0x00FF)
            }))
        );
        assert_eq!(counters.snapshot().rx, 17);

        stop_tx.send_replace(true);
        tokio::time::timeout(Duration::from_millis(200), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_keeps_running_after_eof() {
        init_tracing();
        let (read_loop, _rx, _) = read_loop(false);
        let (host, board) = tokio::io::duplex(64);
        drop(board);
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(read_loop.run(host, stop_rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        drop(stop_tx);
        tokio::time::timeout(Duration::from_millis(200), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_read_error_reported_and_loop_continues() {
        init_tracing();
        let (read_loop, mut rx, counters) = read_loop(false);
        let reader = FlakyReader {
            failures: 2,
            data: Some(b"M2:SW=00FF\n"),
        };
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(read_loop.run(reader, stop_rx));

        let mut read_errors = 0;
        let telemetry = loop {
            let event = rx
                .wait_for(
                    |e| matches!(e, Event::ReadError { .. } | Event::Telemetry(_)),
                    Duration::from_secs(1),
                )
                .await;
            match event {
                Some(Event::ReadError { message }) => {
                    assert_eq!(message, "glitch");
                    read_errors += 1;
                }
                other => break other,
            }
        };

        assert_eq!(read_errors, 2);
        assert_eq!(
            telemetry,
            Some(Event::Telemetry(TelemetryEvent::Switches(0x00FF)))
        );
        assert_eq!(counters.snapshot().rx, 11);
        assert!(!task.is_finished());

        stop_tx.send_replace(true);
        tokio::time::timeout(Duration::from_millis(200), task)
            .await
            .unwrap()
            .unwrap();
    }
}
