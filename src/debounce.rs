//! Debounced edge events for the four momentary buttons and the two-position
//! mode switch. See spec.md §4.4.

use crate::config::DEBOUNCE_THRESHOLD;

/// An edge event a debounced input can report.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Edge {
    /// Committed a transition to the low level (button released / switch down).
    Low,
    /// Committed a transition to the high level (button pushed / switch up).
    High,
    /// No committed transition since the last check.
    NoChange,
}

/// One debounced digital input. Poll with `poll` from the tick ISR at
/// `F_TICK`; read and clear the latched edge with `check` from foreground.
///
/// Invariant: a level transition commits only after `DEBOUNCE_THRESHOLD`
/// consecutive polls observe the new level — single-poll glitches never
/// commit.
pub struct Debouncer {
    committed: bool,
    run: u8,
    pending: Option<bool>,
}

impl Debouncer {
    /// Creates a debouncer whose initial committed level is `initial`.
    pub fn new(initial: bool) -> Self {
        Self {
            committed: initial,
            run: 0,
            pending: None,
        }
    }

    /// Polls one raw reading. Called from the tick ISR. If `raw` matches the
    /// committed level, the opposite-level run resets; otherwise the run
    /// extends, and commits once it reaches `DEBOUNCE_THRESHOLD`.
    pub fn poll(&mut self, raw: bool) {
        if raw == self.committed {
            self.run = 0;
            return;
        }

        self.run += 1;
        if self.run >= DEBOUNCE_THRESHOLD {
            self.committed = raw;
            self.pending = Some(raw);
            self.run = 0;
        }
    }

    /// Returns the pending edge and clears it, or `NoChange` if none is
    /// pending. Safe to call from foreground while `poll` runs in an ISR:
    /// only a single latched value is read-and-cleared here, and it's only
    /// ever written (not read) by `poll`.
    pub fn check(&mut self) -> Edge {
        match self.pending.take() {
            Some(true) => Edge::High,
            Some(false) => Edge::Low,
            None => Edge::NoChange,
        }
    }

    /// Current committed level, without consuming any pending edge.
    pub fn level(&self) -> bool {
        self.committed
    }
}

/// Identifies one of the four momentary buttons.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
}

/// A committed button edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ButtonEvent {
    Pushed,
    Released,
    NoChange,
}

/// Debounced state for all four buttons. Each button's "pushed" level is
/// supplied by the board bring-up code (wiring is active-low or
/// active-high depending on the physical button, per spec.md §6).
pub struct Buttons {
    up: Debouncer,
    down: Debouncer,
    left: Debouncer,
    right: Debouncer,
    up_active_high: bool,
    down_active_high: bool,
    left_active_high: bool,
    right_active_high: bool,
}

impl Buttons {
    /// Creates the four button debouncers. `*_active_high` says which raw
    /// level means "pushed" for that button; `*_initial_raw` is the raw
    /// level read at construction time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        up_initial_raw: bool,
        up_active_high: bool,
        down_initial_raw: bool,
        down_active_high: bool,
        left_initial_raw: bool,
        left_active_high: bool,
        right_initial_raw: bool,
        right_active_high: bool,
    ) -> Self {
        Self {
            up: Debouncer::new(up_initial_raw),
            down: Debouncer::new(down_initial_raw),
            left: Debouncer::new(left_initial_raw),
            right: Debouncer::new(right_initial_raw),
            up_active_high,
            down_active_high,
            left_active_high,
            right_active_high,
        }
    }

    /// Polls all four raw pin levels. Called from the tick ISR.
    pub fn poll(&mut self, up_raw: bool, down_raw: bool, left_raw: bool, right_raw: bool) {
        self.up.poll(up_raw);
        self.down.poll(down_raw);
        self.left.poll(left_raw);
        self.right.poll(right_raw);
    }

    /// Returns and clears the pending event for `button`, translating the
    /// debouncer's raw-level edge into `Pushed`/`Released` according to
    /// that button's active polarity.
    pub fn check(&mut self, button: Button) -> ButtonEvent {
        let (debouncer, active_high) = match button {
            Button::Up => (&mut self.up, self.up_active_high),
            Button::Down => (&mut self.down, self.down_active_high),
            Button::Left => (&mut self.left, self.left_active_high),
            Button::Right => (&mut self.right, self.right_active_high),
        };

        match debouncer.check() {
            Edge::NoChange => ButtonEvent::NoChange,
            Edge::High if active_high => ButtonEvent::Pushed,
            Edge::High => ButtonEvent::Released,
            Edge::Low if active_high => ButtonEvent::Released,
            Edge::Low => ButtonEvent::Pushed,
        }
    }
}

/// The two-position mode switch's committed position.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SwitchEvent {
    Up,
    Down,
    Unchanged,
}

/// Debounced state for the mode switch; `true` means the switch reads
/// physically "up".
pub struct ModeSwitch {
    debouncer: Debouncer,
}

impl ModeSwitch {
    pub fn new(initial_up: bool) -> Self {
        Self {
            debouncer: Debouncer::new(initial_up),
        }
    }

    /// Polls the raw switch pin. Called from the tick ISR.
    pub fn poll(&mut self, raw_up: bool) {
        self.debouncer.poll(raw_up);
    }

    /// Returns and clears the pending switch transition.
    pub fn check(&mut self) -> SwitchEvent {
        match self.debouncer.check() {
            Edge::High => SwitchEvent::Up,
            Edge::Low => SwitchEvent::Down,
            Edge::NoChange => SwitchEvent::Unchanged,
        }
    }

    /// Current committed position, `true` meaning up.
    pub fn is_up(&self) -> bool {
        self.debouncer.level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternating_input_never_commits() {
        let mut d = Debouncer::new(false);
        for i in 0..100 {
            d.poll(i % 2 == 0);
        }
        assert_eq!(d.check(), Edge::NoChange);
    }

    #[test]
    fn stable_run_of_three_commits_once() {
        let mut d = Debouncer::new(false);
        d.poll(true);
        d.poll(true);
        assert_eq!(d.check(), Edge::NoChange);
        d.poll(true);
        assert_eq!(d.check(), Edge::High);
        // Already cleared; no repeat event.
        assert_eq!(d.check(), Edge::NoChange);
    }

    #[test]
    fn glitch_shorter_than_threshold_does_not_commit() {
        let mut d = Debouncer::new(false);
        d.poll(true);
        d.poll(true);
        d.poll(false); // glitch resets the run before committing
        d.poll(true);
        d.poll(true);
        assert_eq!(d.check(), Edge::NoChange);
    }

    #[test]
    fn button_polarity_maps_to_pushed_released() {
        // Active-low button: physical push pulls the pin low.
        let mut buttons = Buttons::new(true, false, true, false, true, false, true, false);
        for _ in 0..3 {
            buttons.poll(false, true, true, true);
        }
        assert_eq!(buttons.check(Button::Up), ButtonEvent::Pushed);
        assert_eq!(buttons.check(Button::Down), ButtonEvent::NoChange);
    }

    #[test]
    fn switch_reports_up_and_down() {
        let mut sw = ModeSwitch::new(false);
        for _ in 0..3 {
            sw.poll(true);
        }
        assert_eq!(sw.check(), SwitchEvent::Up);
        assert!(sw.is_up());

        for _ in 0..3 {
            sw.poll(false);
        }
        assert_eq!(sw.check(), SwitchEvent::Down);
    }
}
