//! Compile-time-tunable parameters for the flight-control core, gathered in
//! one place rather than scattered through the control code, mirroring the
//! donor project's coefficient-group pattern (its `pid.rs` groups PID gains
//! into `CtrlCoeffsPR`/`CtrlCoeffGroup` structs with a `Default` impl of
//! reference values).

/// Hardware tick rate driving the scheduler and the altitude sampler. Hz.
pub const F_TICK: u32 = 400;

/// Rate at which the two PI control loops run. Hz. Must evenly divide
/// `F_TICK` so `F_TICK / F_CTRL` is an exact tick count.
pub const F_CTRL: u32 = 20;

/// Ticks between control-loop invocations, derived from `F_TICK`/`F_CTRL`.
pub const TICKS_PER_CTRL: u16 = (F_TICK / F_CTRL) as u16;

/// Rate at which the foreground checks debounced button/switch events and
/// applies their effects. Independent of the 400 Hz rate the tick ISR polls
/// raw pin levels at; a committed edge latches until this task reads it, so
/// this can run much slower than the debounce poll itself. Hz.
pub const INPUT_POLL_RATE: u32 = 50;
pub const TICKS_PER_INPUT_POLL: u16 = (F_TICK / INPUT_POLL_RATE) as u16;

/// Ticks between display refreshes, derived from `F_TICK`/`DISPLAY_RATE`.
pub const TICKS_PER_DISPLAY: u16 = (F_TICK / DISPLAY_RATE) as u16;

/// Ticks between telemetry sends, derived from `F_TICK`/`TELEMETRY_RATE`.
pub const TICKS_PER_TELEMETRY: u16 = (F_TICK / TELEMETRY_RATE) as u16;

/// Ticks between yaw auto-scan steps while finding the index reference,
/// derived from `F_TICK`/`YAW_SCAN_RATE`.
pub const TICKS_PER_YAW_SCAN: u16 = (F_TICK / YAW_SCAN_RATE) as u16;

/// Button/switch debounce threshold: consecutive polls at `F_TICK` showing
/// the opposite level before a transition commits.
pub const DEBOUNCE_THRESHOLD: u8 = 3;

/// Ring-buffer length for the altitude averager. Spec.md requires `N >= 16`
/// and suggests picking within `[20, 40]`; we use the middle of that range.
pub const ALTITUDE_BUF_LEN: usize = 20;

/// ADC raw-count span corresponding to 0%-100% altitude travel: derived
/// from a 0.8V span on a 12-bit, 3.3V ADC (`4095 * 0.8 / 3.3`).
pub const ADC_RANGE: i32 = 993;

/// Quadrature geometry: slot units per notch, and notches per revolution.
pub const SLOTS_PER_NOTCH: i32 = 4;
pub const NOTCHES_PER_REV: i32 = 112;
/// `SLOTS_PER_NOTCH * NOTCHES_PER_REV` — slot units per full 360 degree turn.
pub const SLOTS_PER_REV: i32 = SLOTS_PER_NOTCH * NOTCHES_PER_REV;

/// Main (lift) rotor duty-cycle clamp, percent.
pub const MAIN_DUTY_MIN: u8 = 20;
pub const MAIN_DUTY_MAX: u8 = 95;

/// Tail (yaw) rotor duty-cycle clamp, percent.
pub const TAIL_DUTY_MIN: u8 = 5;
pub const TAIL_DUTY_MAX: u8 = 95;

/// PWM carrier frequency for both rotor outputs. Hz.
pub const PWM_CARRIER_HZ: u32 = 250;

/// Amount the desired altitude changes per UP/DOWN button press, percent.
pub const ALTITUDE_STEP: i16 = 10;

/// Amount the desired yaw changes per LEFT/RIGHT button press, degrees.
pub const YAW_STEP: i16 = 15;

/// Rate at which desired yaw is advanced automatically while scanning for
/// the index pulse during take-off. Hz.
pub const YAW_SCAN_RATE: u32 = 2;

/// Display refresh rate. Hz.
pub const DISPLAY_RATE: u32 = 5;

/// Telemetry (UART) refresh rate. Hz.
pub const TELEMETRY_RATE: u32 = 4;

/// UART baud rate for the telemetry stream (9600 8N1).
pub const TELEMETRY_BAUD: u32 = 9600;

/// Maximum number of tasks the scheduler's task table can hold.
pub const MAX_SCHEDULER_TASKS: usize = 8;

/// PI gains, reference values per spec.md §4.6. `Default` carries these;
/// fields remain plain so a board bring-up routine can override them.
#[derive(Clone, Copy)]
pub struct PidGains {
    pub kp: i32,
    pub ki: i32,
}

impl Default for PidGains {
    fn default() -> Self {
        Self { kp: 10, ki: 4 }
    }
}

/// Altitude and yaw gain sets together, as the two axes the core controls.
#[derive(Clone, Copy)]
pub struct Config {
    pub altitude_gains: PidGains,
    pub yaw_gains: PidGains,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            altitude_gains: PidGains { kp: 10, ki: 4 },
            yaw_gains: PidGains { kp: 17, ki: 6 },
        }
    }
}
