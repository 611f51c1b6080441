//! Clamped duty-cycle control for the two rotor PWM outputs. See spec.md
//! §4.5. Carrier frequency and per-actuator duty limits live in `config.rs`.

use crate::config::{MAIN_DUTY_MAX, MAIN_DUTY_MIN, TAIL_DUTY_MAX, TAIL_DUTY_MIN};
use crate::hal_iface::PwmOutput;

/// Drives the main (lift) and tail (yaw) rotor PWM channels, clamping every
/// commanded duty into the actuator's own limits and caching the
/// last-commanded (post-clamp) value.
pub struct RotorPwm<M: PwmOutput, T: PwmOutput> {
    main: M,
    tail: T,
    main_duty: u8,
    tail_duty: u8,
}

impl<M: PwmOutput, T: PwmOutput> RotorPwm<M, T> {
    pub fn new(main: M, tail: T) -> Self {
        Self {
            main,
            tail,
            main_duty: MAIN_DUTY_MIN,
            tail_duty: TAIL_DUTY_MIN,
        }
    }

    /// Enables the main rotor output and sets it to its minimum duty.
    pub fn start_main(&mut self) {
        self.main.enable();
        self.set_main(MAIN_DUTY_MIN as i16);
    }

    /// Enables the tail rotor output and sets it to its minimum duty.
    pub fn start_tail(&mut self) {
        self.tail.enable();
        self.set_tail(TAIL_DUTY_MIN as i16);
    }

    /// Disables the main rotor output.
    pub fn stop_main(&mut self) {
        self.main.disable();
    }

    /// Disables the tail rotor output.
    pub fn stop_tail(&mut self) {
        self.tail.disable();
    }

    /// Clamps `percent` into `[MAIN_DUTY_MIN, MAIN_DUTY_MAX]`, programs the
    /// main PWM channel, and caches the clamped value.
    pub fn set_main(&mut self, percent: i16) -> u8 {
        let clamped = percent.clamp(MAIN_DUTY_MIN as i16, MAIN_DUTY_MAX as i16) as u8;
        self.main.set_duty_percent(clamped);
        self.main_duty = clamped;
        clamped
    }

    /// Clamps `percent` into `[TAIL_DUTY_MIN, TAIL_DUTY_MAX]`, programs the
    /// tail PWM channel, and caches the clamped value.
    pub fn set_tail(&mut self, percent: i16) -> u8 {
        let clamped = percent.clamp(TAIL_DUTY_MIN as i16, TAIL_DUTY_MAX as i16) as u8;
        self.tail.set_duty_percent(clamped);
        self.tail_duty = clamped;
        clamped
    }

    /// Last-commanded (post-clamp) main rotor duty.
    pub fn get_main(&self) -> u8 {
        self.main_duty
    }

    /// Last-commanded (post-clamp) tail rotor duty.
    pub fn get_tail(&self) -> u8 {
        self.tail_duty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct MockPwm {
        enabled: bool,
        duty: u8,
        set_calls: &'static Cell<u32>,
    }

    impl MockPwm {
        fn new(calls: &'static Cell<u32>) -> Self {
            Self {
                enabled: false,
                duty: 0,
                set_calls: calls,
            }
        }
    }

    impl PwmOutput for MockPwm {
        fn enable(&mut self) {
            self.enabled = true;
        }
        fn disable(&mut self) {
            self.enabled = false;
        }
        fn set_duty_percent(&mut self, percent: u8) {
            self.duty = percent;
            self.set_calls.set(self.set_calls.get() + 1);
        }
    }

    fn rotors() -> RotorPwm<MockPwm, MockPwm> {
        static MAIN_CALLS: Cell<u32> = Cell::new(0);
        static TAIL_CALLS: Cell<u32> = Cell::new(0);
        RotorPwm::new(MockPwm::new(&MAIN_CALLS), MockPwm::new(&TAIL_CALLS))
    }

    #[test]
    fn set_main_clamps_into_actuator_limits() {
        let mut r = rotors();
        assert_eq!(r.set_main(200), MAIN_DUTY_MAX);
        assert_eq!(r.get_main(), MAIN_DUTY_MAX);

        assert_eq!(r.set_main(-5), MAIN_DUTY_MIN);
        assert_eq!(r.get_main(), MAIN_DUTY_MIN);
    }

    #[test]
    fn set_tail_clamps_into_actuator_limits() {
        let mut r = rotors();
        assert_eq!(r.set_tail(200), TAIL_DUTY_MAX);
        assert_eq!(r.set_tail(0), TAIL_DUTY_MIN);
    }

    #[test]
    fn start_main_enables_and_sets_minimum() {
        let mut r = rotors();
        r.start_main();
        assert!(r.main.enabled);
        assert_eq!(r.get_main(), MAIN_DUTY_MIN);
    }

    #[test]
    fn stop_disables_output_without_changing_cached_duty() {
        let mut r = rotors();
        r.set_main(50);
        r.stop_main();
        assert!(!r.main.enabled);
        assert_eq!(r.get_main(), 50);
    }
}
