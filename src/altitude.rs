//! Altitude sampling: triggers ADC conversions, averages them through a
//! `RingBuffer`, and reports altitude as a percentage of travel relative to
//! a reference captured at bring-up. See spec.md §4.2.

use crate::config::ADC_RANGE;
use crate::ring_buffer::RingBuffer;

/// State for the altitude channel. The ring buffer, sum/mean, and priming
/// counter are mutated only from the ADC completion ISR; `desired` is
/// foreground-only; `reference` is written once, at bring-up.
pub struct AltitudeState {
    buffer: RingBuffer,
    mean: i32,
    /// Number of samples received so far, saturating at the buffer's
    /// capacity. Reaching capacity means the averager is "primed".
    samples_taken: u32,
    reference: i32,
    desired: i16,
}

impl AltitudeState {
    /// Creates a new, unprimed altitude channel backed by a ring buffer of
    /// `buf_len` slots.
    pub fn new(buf_len: usize) -> Self {
        Self {
            buffer: RingBuffer::new(buf_len),
            mean: 0,
            samples_taken: 0,
            reference: 0,
            desired: 0,
        }
    }

    /// `true` once the ring buffer has received at least `capacity` samples.
    pub fn primed(&self) -> bool {
        self.samples_taken as usize >= self.buffer.capacity()
    }

    /// Called from the ADC completion ISR with one freshly-converted raw
    /// reading. Updates the ring buffer, the cached mean, and the priming
    /// counter (saturating — it never counts past the buffer's capacity).
    pub fn on_conversion_complete(&mut self, raw: u16) {
        self.buffer.write(raw);
        self.mean = self.buffer.mean();

        let cap = self.buffer.capacity() as u32;
        if self.samples_taken < cap {
            self.samples_taken += 1;
        }
    }

    /// Captures `reference` from the current mean. The caller (board
    /// bring-up) must have already spun until `primed()` is true — this
    /// function itself does not block.
    pub fn set_initial_reference(&mut self) {
        self.reference = self.mean;
    }

    /// Recaptures the reference from the current mean on demand. Not wired
    /// to any button by spec.md's final button table (see SPEC_FULL.md §B);
    /// exposed for a ground-service recalibration hook.
    pub fn reset_reference(&mut self) {
        self.reference = self.mean;
    }

    /// Altitude, as signed percent of travel relative to the reference.
    /// Not clamped: small negative readings are possible just after
    /// take-off if sensor noise drifts the mean below the reference.
    pub fn percent(&self) -> i16 {
        ((self.reference - self.mean) * 100 / ADC_RANGE) as i16
    }

    /// Currently-commanded altitude set-point, percent.
    pub fn desired(&self) -> i16 {
        self.desired
    }

    /// Sets the desired altitude directly, clamped to `[0, 100]`.
    pub fn set_desired(&mut self, percent: i16) {
        self.desired = percent.clamp(0, 100);
    }

    /// Adjusts the desired altitude by `delta`, clamped to `[0, 100]`.
    pub fn change_desired(&mut self, delta: i16) {
        self.set_desired(self.desired + delta);
    }

    /// Error between desired and measured altitude, percent.
    pub fn error(&self) -> i16 {
        self.desired - self.percent()
    }

    /// Current mean raw ADC reading, for diagnostics/telemetry.
    pub fn mean_adc(&self) -> i32 {
        self.mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primed_state(mean_value: u16) -> AltitudeState {
        let mut st = AltitudeState::new(4);
        for _ in 0..4 {
            st.on_conversion_complete(mean_value);
        }
        assert!(st.primed());
        st.set_initial_reference();
        st
    }

    #[test]
    fn cold_boot_reference_matches_constant_input() {
        let st = primed_state(2000);
        assert_eq!(st.percent(), 0);
        assert_eq!(st.desired(), 0);
    }

    #[test]
    fn percent_sign_tracks_mean_vs_reference() {
        let mut st = primed_state(2000);
        // Mean drops below reference -> altitude has increased -> percent > 0.
        st.on_conversion_complete(1000);
        assert!(st.percent() > 0);

        // Mean rises above reference -> percent < 0.
        let mut st2 = primed_state(2000);
        st2.on_conversion_complete(3000);
        assert!(st2.percent() < 0);
    }

    #[test]
    fn desired_altitude_clamped() {
        let mut st = AltitudeState::new(4);
        st.change_desired(50);
        st.change_desired(100);
        assert_eq!(st.desired(), 100);

        st.change_desired(-1000);
        assert_eq!(st.desired(), 0);
    }

    #[test]
    fn priming_counter_saturates() {
        let mut st = AltitudeState::new(4);
        assert!(!st.primed());
        for _ in 0..10 {
            st.on_conversion_complete(100);
        }
        assert!(st.primed());
    }

    #[test]
    fn error_is_desired_minus_percent() {
        let mut st = primed_state(2000);
        st.set_desired(10);
        st.on_conversion_complete(2000);
        assert_eq!(st.error(), 10 - st.percent());
    }
}
