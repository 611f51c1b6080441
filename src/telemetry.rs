//! Ground-facing output: the four-line OLED status display and the
//! UART telemetry stream. See spec.md §4.9/§6.
//!
//! Both formatters write into fixed-capacity `heapless::String` buffers —
//! no heap allocation — then hand the rendered bytes to the `CharDisplay`/
//! `ByteSink` trait objects from `hal_iface`. Line layout and field widths
//! for the UART stream are carried over verbatim from
//! `original_source/uartUSB.c`'s `uartSendStatus`; the OLED layout expands
//! that project's single cycling line into the full four-row display
//! described in SPEC_FULL.md §A.2.

use core::fmt::Write as _;

use heapless::String;

use crate::flight_mode::FlightMode;
use crate::hal_iface::{ByteSink, CharDisplay};

/// Maximum rendered length of one OLED row, including the trailing pad.
const DISPLAY_COLS: usize = 16;
/// Maximum rendered length of one UART status line, including `\r\n`.
const UART_LINE_LEN: usize = 24;

/// Everything the display/telemetry formatters need to know about current
/// flight state. Plain data, gathered by the caller from the other modules
/// each time a refresh is due.
#[derive(Clone, Copy)]
pub struct Snapshot {
    pub altitude_percent: i16,
    pub altitude_desired: i16,
    pub altitude_mean_adc: i32,
    pub yaw_degrees: i16,
    pub yaw_desired: i16,
    pub main_duty: u8,
    pub tail_duty: u8,
    pub mode: FlightMode,
}

/// Redraws all four OLED rows from `snap`: altitude and yaw with their
/// set-points, then main and tail duty, per spec.md §6/§4.9. Intended to
/// be called by a scheduler task at `DISPLAY_RATE`.
pub fn update_display(display: &mut dyn CharDisplay, snap: &Snapshot) {
    let mut line: String<DISPLAY_COLS> = String::new();

    line.clear();
    let _ = write!(
        line,
        "Alt:{:4}[{:4}]",
        snap.altitude_percent, snap.altitude_desired
    );
    display.draw_line(0, &line);

    line.clear();
    let _ = write!(line, "Yaw:{:4}[{:4}]", snap.yaw_degrees, snap.yaw_desired);
    display.draw_line(1, &line);

    line.clear();
    let _ = write!(line, "Main:{:3}%", snap.main_duty);
    display.draw_line(2, &line);

    line.clear();
    let _ = write!(line, "Tail:{:3}%", snap.tail_duty);
    display.draw_line(3, &line);
}

/// Sends the five-line status block over UART, matching
/// `original_source/uartUSB.c`'s field layout and `\r\n` line endings.
/// Intended to be called by a scheduler task at `TELEMETRY_RATE`.
pub fn send_telemetry(uart: &mut dyn ByteSink, snap: &Snapshot) {
    let mut line: String<UART_LINE_LEN> = String::new();

    line.clear();
    let _ = write!(
        line,
        "Alt: {:4} [{:4}]\r\n",
        snap.altitude_percent, snap.altitude_desired
    );
    uart.write_all(line.as_bytes());

    line.clear();
    let _ = write!(
        line,
        "Yaw: {:4} [{:4}]\r\n",
        snap.yaw_degrees, snap.yaw_desired
    );
    uart.write_all(line.as_bytes());

    line.clear();
    let _ = write!(line, "Main: {:4}%\r\n", snap.main_duty);
    uart.write_all(line.as_bytes());

    line.clear();
    let _ = write!(line, "Tail: {:4}%\r\n", snap.tail_duty);
    uart.write_all(line.as_bytes());

    line.clear();
    let _ = write!(line, "{:16}\r\n", snap.mode.label());
    uart.write_all(line.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    struct RecordingSink {
        bytes: Vec<u8, 256>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self { bytes: Vec::new() }
        }

        fn as_str(&self) -> &str {
            core::str::from_utf8(&self.bytes).unwrap()
        }
    }

    impl ByteSink for RecordingSink {
        fn write_byte(&mut self, byte: u8) {
            let _ = self.bytes.push(byte);
        }
    }

    struct RecordingDisplay {
        rows: [String<DISPLAY_COLS>; 4],
    }

    impl RecordingDisplay {
        fn new() -> Self {
            Self {
                rows: [String::new(), String::new(), String::new(), String::new()],
            }
        }
    }

    impl CharDisplay for RecordingDisplay {
        fn draw_line(&mut self, row: u8, text: &str) {
            let mut s: String<DISPLAY_COLS> = String::new();
            let _ = s.push_str(text);
            self.rows[row as usize] = s;
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            altitude_percent: 42,
            altitude_desired: 50,
            altitude_mean_adc: 1999,
            yaw_degrees: -15,
            yaw_desired: 0,
            main_duty: 63,
            tail_duty: 30,
            mode: FlightMode::Flying,
        }
    }

    #[test]
    fn telemetry_lines_carry_label_and_brackets() {
        let mut sink = RecordingSink::new();
        send_telemetry(&mut sink, &snapshot());
        let out = sink.as_str();
        assert!(out.contains("Alt:"));
        assert!(out.contains("[  50]"));
        assert!(out.contains("Yaw:"));
        assert!(out.contains("Main:  63%"));
        assert!(out.contains("Tail:  30%"));
        assert!(out.contains("Flying"));
        assert!(out.ends_with("\r\n"));
    }

    #[test]
    fn display_rows_are_populated_independently() {
        let mut disp = RecordingDisplay::new();
        update_display(&mut disp, &snapshot());
        assert!(disp.rows[0].contains("Alt:"));
        assert!(disp.rows[0].contains("[  50]"));
        assert!(disp.rows[1].contains("Yaw:"));
        assert!(disp.rows[1].contains("[   0]"));
        assert_eq!(disp.rows[2].as_str(), "Main: 63%");
        assert_eq!(disp.rows[3].as_str(), "Tail: 30%");
    }

    #[test]
    fn landing_modes_render_as_landing_on_both_outputs() {
        let mut snap = snapshot();
        snap.mode = FlightMode::LandingAltitude;

        let mut sink = RecordingSink::new();
        send_telemetry(&mut sink, &snap);
        assert!(sink.as_str().contains("Landing"));
    }
}
