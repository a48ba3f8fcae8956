//! Link byte counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// RX/TX byte totals for the current connection.
///
/// RX is only advanced by the read loop and TX only by the write path.
#[derive(Debug, Default)]
pub struct ByteCounters {
    rx: AtomicU64,
    tx: AtomicU64,
}

/// Point-in-time copy of [`ByteCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// Bytes received.
    pub rx: u64,
    /// Bytes transmitted.
    pub tx: u64,
}

impl ByteCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rx: AtomicU64::new(0),
            tx: AtomicU64::new(0),
        }
    }

    /// Adds received bytes.
    pub fn add_rx(&self, n: usize) {
        self.rx.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Adds transmitted bytes.
    pub fn add_tx(&self, n: usize) {
        self.tx.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Zeroes both counters.
    pub fn reset(&self) {
        self.rx.store(0, Ordering::Relaxed);
        self.tx.store(0, Ordering::Relaxed);
    }

    /// Reads both counters.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            rx: self.rx.load(Ordering::Relaxed),
            tx: self.tx.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let counters = ByteCounters::new();
        counters.add_rx(10);
        counters.add_rx(5);
        counters.add_tx(2);
        assert_eq!(counters.snapshot(), CounterSnapshot { rx: 15, tx: 2 });

        counters.reset();
        assert_eq!(counters.snapshot(), CounterSnapshot::default());
    }
}
