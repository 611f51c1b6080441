//! Narrow hardware-abstraction contracts the flight-control core depends on.
//!
//! Everything in spec.md §1 calls "external collaborators" — ADC peripheral
//! configuration, PWM generator setup, GPIO pin mapping, the OLED driver,
//! UART byte transmission, clock/SysTick bring-up — lives behind these
//! traits. Board bring-up code in `main.rs` implements them against
//! `stm32-hal2`; the logic modules (`ring_buffer`, `altitude`, `yaw`,
//! `debounce`, `rotors`, `pid`, `flight_mode`, `scheduler`, `telemetry`)
//! only ever see the trait, which is what lets them be unit-tested on the
//! host without any peripheral present.

/// One PWM-driven actuator output: a rotor's speed controller.
///
/// `percent` is always pre-clamped by the caller (`rotors::RotorPwm`)
/// before reaching this trait; implementations just program the duty
/// register.
pub trait PwmOutput {
    /// Enables the PWM output pin.
    fn enable(&mut self);
    /// Disables the PWM output pin (rotor stops).
    fn disable(&mut self);
    /// Programs the duty cycle as an integer percent in `0..=100`.
    fn set_duty_percent(&mut self, percent: u8);
}

/// A single digital input pin, read synchronously.
pub trait DigitalIn {
    /// `true` if the pin currently reads logic-high.
    fn is_high(&self) -> bool;
}

/// One byte-oriented output channel (UART TX).
pub trait ByteSink {
    /// Sends one byte. May block; spec.md §6 explicitly allows this.
    fn write_byte(&mut self, byte: u8);

    /// Sends a full buffer, one byte at a time.
    fn write_all(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_byte(b);
        }
    }
}

/// The character display (16x4 OLED in the reference board).
pub trait CharDisplay {
    /// Writes `text` left-justified into display row `row`, padding or
    /// truncating to the display's column count as the driver requires.
    fn draw_line(&mut self, row: u8, text: &str);
}
