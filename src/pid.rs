//! Fixed-point PI control with conditional-integration anti-windup. See
//! spec.md §4.6. No derivative term: spec.md explicitly excludes one, and
//! the integer-only Non-goal rules out the floating-point PID the donor
//! project's `pid.rs` used, so this is rebuilt from scratch around
//! `config::PidGains`.

use crate::config::{PidGains, F_CTRL};

/// One PI control loop: `e_int_next = e_int + e·100/F_CTRL`,
/// `u = (KP·e·100 + KI·e_int_next)/1000`. The integrator is carried
/// 100-scaled between steps so the `/F_CTRL` time-scaling stays exact
/// under integer division.
pub struct PiController {
    gains: PidGains,
    integrator: i32,
    output_min: i32,
    output_max: i32,
}

impl PiController {
    /// Creates a controller with the given gains, clamping its output to
    /// `[output_min, output_max]`.
    pub fn new(gains: PidGains, output_min: i32, output_max: i32) -> Self {
        debug_assert!(output_min <= output_max);
        Self {
            gains,
            integrator: 0,
            output_min,
            output_max,
        }
    }

    /// Resets the integrator to zero, e.g. when a control loop is about to
    /// be re-engaged after landing.
    pub fn reset(&mut self) {
        self.integrator = 0;
    }

    /// Replaces the gain set in place, without touching the integrator.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    /// Advances the controller by one control-loop step given the current
    /// `error` (desired minus measured), and returns the clamped output.
    ///
    /// Anti-windup follows spec.md §4.6's conditional-integration rule:
    /// the candidate integrator update is computed first, and applied only
    /// if the resulting raw (pre-clamp) output does not push further past
    /// the limit the error is already driving it toward. An error that
    /// would pull the output back toward the working range always gets to
    /// integrate, even while saturated.
    pub fn step(&mut self, error: i16) -> i32 {
        let error = error as i32;
        let proportional_x100 = self.gains.kp * error * 100;

        let candidate_integrator = self.integrator + error * 100 / F_CTRL as i32;
        let candidate_raw = (proportional_x100 + self.gains.ki * candidate_integrator) / 1000;

        let would_clip_high = candidate_raw > self.output_max && error > 0;
        let would_clip_low = candidate_raw < self.output_min && error < 0;

        if !would_clip_high && !would_clip_low {
            self.integrator = candidate_integrator;
        }

        let raw = (proportional_x100 + self.gains.ki * self.integrator) / 1000;
        raw.clamp(self.output_min, self.output_max)
    }

    /// Current integral contribution to the output, for diagnostics/telemetry.
    pub fn integral_term(&self) -> i32 {
        (self.gains.ki * self.integrator) / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gains(kp: i32, ki: i32) -> PidGains {
        PidGains { kp, ki }
    }

    #[test]
    fn proportional_only_response_with_zero_integral_gain() {
        let mut pid = PiController::new(gains(10, 0), -100, 100);
        assert_eq!(pid.step(5), 5);
        assert_eq!(pid.step(-5), -5);
    }

    #[test]
    fn integrator_accumulates_across_steps() {
        let mut pid = PiController::new(gains(0, 100), -1000, 1000);
        let first = pid.step(50);
        let second = pid.step(50);
        assert!(second > first);
    }

    #[test]
    fn output_is_clamped_to_configured_range() {
        let mut pid = PiController::new(gains(100, 100), -50, 50);
        assert_eq!(pid.step(100), 50);
        assert_eq!(pid.step(-100), -50);
    }

    #[test]
    fn integrator_stops_growing_once_saturated_in_error_direction() {
        let mut pid = PiController::new(gains(0, 10), -50, 50);
        for _ in 0..20 {
            pid.step(100);
        }
        let saturated_integral = pid.integral_term();
        pid.step(100);
        assert_eq!(pid.integral_term(), saturated_integral);
    }

    #[test]
    fn integrator_still_unwinds_when_error_reverses_while_saturated() {
        let mut pid = PiController::new(gains(0, 10), -50, 50);
        for _ in 0..20 {
            pid.step(100);
        }
        let saturated_integral = pid.integral_term();
        pid.step(-100);
        assert!(pid.integral_term() < saturated_integral);
    }

    #[test]
    fn reset_zeroes_the_integrator() {
        let mut pid = PiController::new(gains(0, 4), -1000, 1000);
        pid.step(10);
        pid.reset();
        assert_eq!(pid.integral_term(), 0);
    }
}
