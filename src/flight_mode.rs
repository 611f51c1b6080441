//! Top-level flight-mode state machine. See spec.md §4.7.
//!
//! Transitions are driven by the mode switch, the yaw index pulse, and the
//! two control loops reaching zero error on landing; the side effects
//! (starting/stopping rotors, zeroing set-points) are exposed through
//! `Transition` rather than performed here, since this module has no access
//! to the rotor or PID state.

/// One of the five flight states a controller can be in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlightMode {
    /// On the ground, rotors off, waiting for the switch to go up.
    Landed,
    /// Main rotor spinning up, tail rotor scanning for the yaw index pulse.
    FindingYawReference,
    /// Both control loops active, taking altitude/yaw commands from buttons.
    Flying,
    /// Switch has gone down; yaw is being driven to zero first.
    LandingYaw,
    /// Yaw has reached zero; altitude is being driven to zero next.
    LandingAltitude,
}

impl FlightMode {
    /// Display string per spec.md §6; `LandingYaw` and `LandingAltitude`
    /// both collapse to `"Landing"` so the operator sees one label across
    /// the whole descent (original_source/flightState.c's
    /// `flightStateString()` does the same collapsing).
    pub fn label(self) -> &'static str {
        match self {
            FlightMode::Landed => "Landed",
            FlightMode::FindingYawReference => "Taking off",
            FlightMode::Flying => "Flying",
            FlightMode::LandingYaw | FlightMode::LandingAltitude => "Landing",
        }
    }
}

/// A side effect the caller must perform as a consequence of a state
/// transition. The state machine itself never touches rotor or PID state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transition {
    /// No transition occurred.
    None,
    /// Switch moved up from `Landed`: start both rotors.
    StartedTakeoff,
    /// Index pulse found while `FindingYawReference`: hand over to flying.
    ReferenceFound,
    /// Switch moved down while `Flying`: begin landing, yaw first.
    StartedLanding,
    /// Yaw error reached zero during `LandingYaw`: begin altitude descent.
    YawLevelled,
    /// Altitude error reached zero during `LandingAltitude`: stop both rotors.
    Touchdown,
}

/// Holds the current flight mode and applies the transition rules.
pub struct FlightModeState {
    mode: FlightMode,
}

impl FlightModeState {
    pub fn new() -> Self {
        Self {
            mode: FlightMode::Landed,
        }
    }

    pub fn mode(&self) -> FlightMode {
        self.mode
    }

    /// Called when the mode switch commits a transition to the "up"
    /// position. Only has an effect from `Landed`.
    pub fn on_switch_up(&mut self) -> Transition {
        if self.mode == FlightMode::Landed {
            self.mode = FlightMode::FindingYawReference;
            Transition::StartedTakeoff
        } else {
            Transition::None
        }
    }

    /// Called when the mode switch commits a transition to the "down"
    /// position. Only has an effect from `Flying` (landing requested mid
    /// take-off is out of scope; spec.md §9 Open Questions flags this as an
    /// unresolved hazard, left unchanged per SPEC_FULL.md §B).
    pub fn on_switch_down(&mut self) -> Transition {
        if self.mode == FlightMode::Flying {
            self.mode = FlightMode::LandingYaw;
            Transition::StartedLanding
        } else {
            Transition::None
        }
    }

    /// Called from the yaw index-pulse ISR's caller once it has told the
    /// yaw channel about the pulse; `reference_found` is what
    /// `YawState::on_index_pulse` returned.
    pub fn on_index_pulse(&mut self, reference_found: bool) -> Transition {
        if reference_found && self.mode == FlightMode::FindingYawReference {
            self.mode = FlightMode::Flying;
            Transition::ReferenceFound
        } else {
            Transition::None
        }
    }

    /// Called once per control-loop tick with the current yaw error, while
    /// landing. Advances `LandingYaw` to `LandingAltitude` once yaw has
    /// levelled off.
    pub fn on_yaw_error(&mut self, yaw_error: i16) -> Transition {
        if self.mode == FlightMode::LandingYaw && yaw_error == 0 {
            self.mode = FlightMode::LandingAltitude;
            Transition::YawLevelled
        } else {
            Transition::None
        }
    }

    /// Called once per control-loop tick with the current altitude error,
    /// while landing. Completes the landing once altitude has reached zero.
    pub fn on_altitude_error(&mut self, altitude_error: i16) -> Transition {
        if self.mode == FlightMode::LandingAltitude && altitude_error == 0 {
            self.mode = FlightMode::Landed;
            Transition::Touchdown
        } else {
            Transition::None
        }
    }

    /// `true` while the two PI control loops should be active:
    /// `FindingYawReference` (the tail rotor tracks the 2 Hz scanning
    /// set-point so the airframe actually turns), `Flying`, and both
    /// landing phases (they're still being actively driven to zero during
    /// descent).
    pub fn controls_active(&self) -> bool {
        matches!(
            self.mode,
            FlightMode::FindingYawReference
                | FlightMode::Flying
                | FlightMode::LandingYaw
                | FlightMode::LandingAltitude
        )
    }

    /// `true` while the tail rotor should scan for the yaw index pulse,
    /// per spec.md §4.7/§4.3's 2 Hz auto-scan during take-off.
    pub fn finding_reference(&self) -> bool {
        self.mode == FlightMode::FindingYawReference
    }
}

impl Default for FlightModeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_takeoff_to_landing_cycle() {
        let mut fm = FlightModeState::new();
        assert_eq!(fm.mode(), FlightMode::Landed);

        assert_eq!(fm.on_switch_up(), Transition::StartedTakeoff);
        assert_eq!(fm.mode(), FlightMode::FindingYawReference);
        assert!(fm.finding_reference());

        assert_eq!(fm.on_index_pulse(true), Transition::ReferenceFound);
        assert_eq!(fm.mode(), FlightMode::Flying);
        assert!(fm.controls_active());

        assert_eq!(fm.on_switch_down(), Transition::StartedLanding);
        assert_eq!(fm.mode(), FlightMode::LandingYaw);

        assert_eq!(fm.on_yaw_error(3), Transition::None);
        assert_eq!(fm.on_yaw_error(0), Transition::YawLevelled);
        assert_eq!(fm.mode(), FlightMode::LandingAltitude);

        assert_eq!(fm.on_altitude_error(5), Transition::None);
        assert_eq!(fm.on_altitude_error(0), Transition::Touchdown);
        assert_eq!(fm.mode(), FlightMode::Landed);
        assert!(!fm.controls_active());
    }

    #[test]
    fn switch_up_ignored_outside_landed() {
        let mut fm = FlightModeState::new();
        fm.on_switch_up();
        assert_eq!(fm.on_switch_up(), Transition::None);
        assert_eq!(fm.mode(), FlightMode::FindingYawReference);
    }

    #[test]
    fn switch_down_ignored_outside_flying() {
        let mut fm = FlightModeState::new();
        assert_eq!(fm.on_switch_down(), Transition::None);
        assert_eq!(fm.mode(), FlightMode::Landed);
    }

    #[test]
    fn index_pulse_ignored_outside_finding_reference() {
        let mut fm = FlightModeState::new();
        assert_eq!(fm.on_index_pulse(true), Transition::None);
    }

    #[test]
    fn landing_labels_collapse_to_landing() {
        assert_eq!(FlightMode::LandingYaw.label(), "Landing");
        assert_eq!(FlightMode::LandingAltitude.label(), "Landing");
        assert_eq!(FlightMode::Flying.label(), "Flying");
    }
}
