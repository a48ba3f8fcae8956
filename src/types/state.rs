//! Consumer-side view of the board.
//!
//! [`TelemetryState`] is owned by whoever drains the event queue. The read
//! loop never touches it; it only changes through [`TelemetryState::apply`].

use crate::event::{Event, TxPayload};
use crate::protocol::Mode;
use crate::types::TelemetryEvent;

/// Last known board readings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryState {
    /// Mode of the last tagged line.
    pub mode: Mode,
    /// Accelerometer X.
    pub accel_x: i32,
    /// Accelerometer Y.
    pub accel_y: i32,
    /// Accelerometer Z.
    pub accel_z: i32,
    /// Temperature in Celsius.
    pub temperature: f64,
    /// Switch bank, SW0 in bit 0.
    pub switches: u16,
    /// LED state driven from the host.
    pub pc_led: u16,
}

impl TelemetryState {
    /// Creates a zeroed state in mode 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a queued event. Returns true if the state changed.
    ///
    /// Mode and telemetry events update the readings. A sent LED command
    /// updates `pc_led`, the same as the board's own echo would.
    pub fn apply(&mut self, event: &Event) -> bool {
        let before = *self;
        match event {
            Event::Mode(mode) => self.mode = *mode,
            Event::Telemetry(telemetry) => self.apply_telemetry(telemetry),
            Event::Transmitted {
                payload: TxPayload::Led(cmd),
                ..
            } => self.pc_led = cmd.value(),
            _ => {}
        }
        *self != before
    }

    /// Applies the fields of one telemetry update.
    pub fn apply_telemetry(&mut self, event: &TelemetryEvent) {
        match *event {
            TelemetryEvent::Accelerometer { x, y, z } => {
                update(&mut self.accel_x, x);
                update(&mut self.accel_y, y);
                update(&mut self.accel_z, z);
            }
            TelemetryEvent::Temperature(t) => self.temperature = t,
            TelemetryEvent::Switches(sw) => self.switches = sw,
            TelemetryEvent::PcLed(led) => self.pc_led = led,
            TelemetryEvent::Combined {
                x,
                temperature,
                switches,
            } => {
                update(&mut self.accel_x, x);
                update(&mut self.temperature, temperature);
                update(&mut self.switches, switches);
            }
        }
    }

    /// Returns true if switch `index` is on.
    #[must_use]
    pub const fn switch_on(&self, index: usize) -> bool {
        index < 16 && self.switches & (1 << index) != 0
    }
}

fn update<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Formats a 16-bit value as grouped binary, MSB first: `1010_0101_1111_0000`.
#[must_use]
pub fn grouped_binary(value: u16) -> String {
    let bits = format!("{value:016b}");
    bits.as_bytes()
        .chunks(4)
        .map(|nibble| std::str::from_utf8(nibble).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::LedCommand;

    #[test]
    fn test_combined_keeps_absent_fields() {
        let mut state = TelemetryState {
            temperature: 21.25,
            ..TelemetryState::new()
        };

        state.apply(&Event::Mode(Mode::Combined));
        state.apply(&Event::Telemetry(TelemetryEvent::Combined {
            x: Some(-5),
            temperature: None,
            switches: Some(0x00FF),
        }));

        assert_eq!(state.mode, Mode::Combined);
        assert_eq!(state.accel_x, -5);
        assert_eq!(state.switches, 0x00FF);
        assert!((state.temperature - 21.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_accelerometer_partial() {
        let mut state = TelemetryState {
            accel_y: 7,
            ..TelemetryState::new()
        };
        state.apply_telemetry(&TelemetryEvent::Accelerometer {
            x: Some(1),
            y: None,
            z: Some(3),
        });
        assert_eq!((state.accel_x, state.accel_y, state.accel_z), (1, 7, 3));
    }

    #[test]
    fn test_unrelated_events_ignored() {
        let mut state = TelemetryState::new();
        assert!(!state.apply(&Event::Line("hello".into())));
        assert!(!state.apply(&Event::Disconnected));
        assert_eq!(state, TelemetryState::new());
    }

    #[test]
    fn test_led_sent_updates_pc_led() {
        let mut state = TelemetryState::new();
        let cmd = LedCommand::new(0xA5F0);
        assert!(state.apply(&Event::Transmitted {
            data: bytes::Bytes::copy_from_slice(&cmd.to_bytes()),
            payload: TxPayload::Led(cmd),
        }));
        assert_eq!(state.pc_led, 0xA5F0);
    }

    #[test]
    fn test_switch_bits() {
        let state = TelemetryState {
            switches: 0x8001,
            ..TelemetryState::new()
        };
        assert!(state.switch_on(0));
        assert!(!state.switch_on(1));
        assert!(state.switch_on(15));
        assert!(!state.switch_on(16));
    }

    #[test]
    fn test_grouped_binary() {
        assert_eq!(grouped_binary(0xA5F0), "1010_0101_1111_0000");
        assert_eq!(grouped_binary(0), "0000_0000_0000_0000");
    }
}
