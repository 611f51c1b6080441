#![no_main]
#![no_std]
//! Top-level orchestration and ISR fan-out for the tethered-helicopter
//! flight-control core. See spec.md §2, §9 and SPEC_FULL.md §A.1.
//!
//! The hardware tick (400 Hz), the ADC completion interrupt, and the two
//! quadrature interrupts are RTIC hardware tasks; `#[idle]` is the
//! scheduler's foreground, draining `Scheduler::poll()` until nothing is
//! ready and then sleeping. Registration order in `init` fixes the
//! within-scheduler priority spec.md §4.8 requires: input handling first,
//! then the control loop, the take-off yaw scan, the display, and
//! telemetry last.

use cortex_m::asm;
use defmt::info;
use defmt_rtt as _;
use panic_probe as _;

use hal::{
    adc::{Adc, AdcConfig, AdcDevice},
    clocks::Clocks,
    gpio::{Edge, Pin, PinMode, Port, Pull},
    i2c::{I2c, I2cConfig, I2cSpeed},
    pac::{self, ADC1, I2C1, TIM2, TIM3, TIM4, USART2},
    timer::{OutputCompare, TimChannel, Timer, TimerConfig, TimerInterrupt},
    usart::Usart,
};

mod altitude;
mod config;
mod debounce;
mod drivers;
mod flight_mode;
mod hal_iface;
mod pid;
mod ring_buffer;
mod rotors;
mod scheduler;
mod telemetry;
mod yaw;

use altitude::AltitudeState;
use config::{
    Config, TICKS_PER_CTRL, TICKS_PER_DISPLAY, TICKS_PER_INPUT_POLL, TICKS_PER_TELEMETRY,
    TICKS_PER_YAW_SCAN,
};
use debounce::{Button, ButtonEvent, Buttons, SwitchEvent};
use drivers::oled::Oled;
use flight_mode::{FlightMode, FlightModeState, Transition};
use hal_iface::{ByteSink, DigitalIn, PwmOutput};
use pid::PiController;
use rotors::RotorPwm;
use scheduler::Scheduler;
use telemetry::Snapshot;
use yaw::YawState;

/// One quadrature rotor PWM channel. Main and tail rotors each get their
/// own timer instance, so their `enable`/`disable`/`set_duty` calls stay
/// independent of one another.
pub struct RotorChannel<TIM> {
    timer: Timer<TIM>,
    channel: TimChannel,
}

impl<TIM> RotorChannel<TIM> {
    fn new(timer: Timer<TIM>, channel: TimChannel) -> Self {
        Self { timer, channel }
    }
}

macro_rules! impl_pwm_output {
    ($tim:ty) => {
        impl PwmOutput for RotorChannel<$tim> {
            fn enable(&mut self) {
                self.timer
                    .enable_pwm_output(self.channel, OutputCompare::Pwm1, 0.);
            }

            fn disable(&mut self) {
                self.timer.disable_pwm_output(self.channel);
            }

            fn set_duty_percent(&mut self, percent: u8) {
                let duty = (self.timer.get_max_duty() as u32 * percent as u32) / 100;
                self.timer.set_duty(self.channel, duty);
            }
        }
    };
}

impl_pwm_output!(TIM3);
impl_pwm_output!(TIM4);

/// Raw digital input, for the four button pins, the mode switch pin, and
/// the two quadrature lines — all read synchronously from ISR context.
/// Method resolution favors `Pin`'s own inherent `is_high`, so this just
/// exposes it through the trait the logic modules depend on.
impl DigitalIn for Pin {
    fn is_high(&self) -> bool {
        self.is_high()
    }
}

impl ByteSink for Usart<USART2> {
    fn write_byte(&mut self, byte: u8) {
        let _ = self.write(&[byte]);
    }
}

/// Identifies one of the cooperative scheduler's registered tasks; see
/// spec.md §4.8 and SPEC_FULL.md §A.1. Earlier variants in registration
/// order (set in `init`) are higher priority.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ScheduledTask {
    Input,
    Control,
    YawScan,
    Display,
    Telemetry,
}

#[rtic::app(device = pac, peripherals = true, dispatchers = [EXTI9_5])]
mod app {
    use super::*;

    #[shared]
    struct Shared {
        scheduler: Scheduler<ScheduledTask>,
        flight_mode: FlightModeState,
        altitude: AltitudeState,
        yaw: YawState,
        rotors: RotorPwm<RotorChannel<TIM3>, RotorChannel<TIM4>>,
        pid_altitude: PiController,
        pid_yaw: PiController,
        buttons: Buttons,
        mode_switch: debounce::ModeSwitch,
        adc: Adc<ADC1>,
        uart: Usart<USART2>,
        display: Oled,
        // Read by both quadrature edge tasks (EXTI0 for A, EXTI1 for B); an
        // RTIC `#[local]` resource can only belong to one task, so these
        // live here instead even though neither task ever blocks on the
        // other's lock in practice (each fires on its own EXTI line).
        quad_a_pin: Pin,
        quad_b_pin: Pin,
    }

    #[local]
    struct Local {
        tick_timer: Timer<TIM2>,
        button_up_pin: Pin,
        button_down_pin: Pin,
        button_left_pin: Pin,
        button_right_pin: Pin,
        switch_pin: Pin,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        let mut cp = cx.core;
        let dp = pac::Peripherals::take().unwrap();

        cp.SCB.enable_icache();

        let clock_cfg = Clocks::default();
        clock_cfg.setup().unwrap();

        // Altitude ADC input.
        let _altitude_adc_pin = Pin::new(Port::A, 0, PinMode::Analog);

        // Main (lift) rotor: TIM3 CH3 on PB0. Tail (yaw) rotor: TIM4 CH1 on PB6.
        let mut main_rotor_pin = Pin::new(Port::B, 0, PinMode::Alt(2));
        let mut tail_rotor_pin = Pin::new(Port::B, 6, PinMode::Alt(2));
        main_rotor_pin.output_speed(hal::gpio::OutputSpeed::High);
        tail_rotor_pin.output_speed(hal::gpio::OutputSpeed::High);

        // Quadrature A/B lines, edge-triggered on both edges.
        let mut quad_a_pin = Pin::new(Port::C, 0, PinMode::Input);
        let mut quad_b_pin = Pin::new(Port::C, 1, PinMode::Input);
        quad_a_pin.enable_interrupt(Edge::Both);
        quad_b_pin.enable_interrupt(Edge::Both);

        // Yaw index pulse, active-low: falling edge only.
        let mut yaw_index_pin = Pin::new(Port::C, 2, PinMode::Input);
        yaw_index_pin.enable_interrupt(Edge::Falling);

        // Four momentary buttons, active-low, with pull-ups.
        let mut button_up_pin = Pin::new(Port::D, 0, PinMode::Input);
        let mut button_down_pin = Pin::new(Port::D, 1, PinMode::Input);
        let mut button_left_pin = Pin::new(Port::D, 2, PinMode::Input);
        let mut button_right_pin = Pin::new(Port::D, 3, PinMode::Input);
        for pin in [
            &mut button_up_pin,
            &mut button_down_pin,
            &mut button_left_pin,
            &mut button_right_pin,
        ] {
            pin.pull(Pull::Up);
        }

        // Two-position mode switch, active-high ("up" reads high).
        let mut switch_pin = Pin::new(Port::D, 4, PinMode::Input);
        switch_pin.pull(Pull::Down);

        // I2C1 for the status OLED's PCF8574 backpack.
        let mut i2c_scl = Pin::new(Port::B, 8, PinMode::Alt(4));
        let mut i2c_sda = Pin::new(Port::B, 9, PinMode::Alt(4));
        i2c_scl.output_type(hal::gpio::OutputType::OpenDrain);
        i2c_sda.output_type(hal::gpio::OutputType::OpenDrain);
        let i2c_cfg = I2cConfig {
            speed: I2cSpeed::Standard100K,
            ..Default::default()
        };
        let i2c1 = I2c::new(dp.I2C1, i2c_cfg, &clock_cfg);
        let display = Oled::new(i2c1);

        // UART2 for the 9600-8N1 telemetry stream.
        let mut uart_tx = Pin::new(Port::A, 2, PinMode::Alt(7));
        let _ = &mut uart_tx;
        let uart = Usart::new(dp.USART2, config::TELEMETRY_BAUD, Default::default(), &clock_cfg);

        // Rotor PWM timers, both at the 250 Hz carrier spec.md §4.5 specifies.
        let rotor_timer_cfg = TimerConfig {
            auto_reload_preload: true,
            ..Default::default()
        };
        let main_timer = Timer::new_tim3(
            dp.TIM3,
            config::PWM_CARRIER_HZ as f32,
            rotor_timer_cfg.clone(),
            &clock_cfg,
        );
        let tail_timer = Timer::new_tim4(
            dp.TIM4,
            config::PWM_CARRIER_HZ as f32,
            rotor_timer_cfg,
            &clock_cfg,
        );
        let rotors = RotorPwm::new(
            RotorChannel::new(main_timer, TimChannel::C3),
            RotorChannel::new(tail_timer, TimChannel::C1),
        );

        // 400 Hz hardware tick, driving the scheduler and the altitude sampler.
        let mut tick_timer = Timer::new_tim2(dp.TIM2, config::F_TICK as f32, Default::default(), &clock_cfg);
        tick_timer.enable_interrupt(TimerInterrupt::Update);

        // Altitude ADC: primed here with blocking conversions, before any
        // interrupt is live. Spec.md §5 calls for exactly one bounded-wait
        // busy loop, run once at bring-up before the scheduler starts; the
        // wait is satisfied directly rather than through the (not yet
        // registered) completion ISR.
        let adc_cfg = AdcConfig::default();
        let mut adc = Adc::new_adc1(dp.ADC1, AdcDevice::One, adc_cfg, &clock_cfg);
        let mut altitude_state = AltitudeState::new(config::ALTITUDE_BUF_LEN);
        while !altitude_state.primed() {
            adc.start_conversion(&[0]);
            while !adc.data_ready() {}
            let raw = adc.read_result();
            altitude_state.on_conversion_complete(raw);
        }
        altitude_state.set_initial_reference();
        info!("altitude reference captured");

        let cfg = Config::default();
        let pid_altitude = PiController::new(
            cfg.altitude_gains,
            config::MAIN_DUTY_MIN as i32,
            config::MAIN_DUTY_MAX as i32,
        );
        let pid_yaw = PiController::new(
            cfg.yaw_gains,
            config::TAIL_DUTY_MIN as i32,
            config::TAIL_DUTY_MAX as i32,
        );

        let buttons = Buttons::new(
            button_up_pin.is_high(),
            false,
            button_down_pin.is_high(),
            false,
            button_left_pin.is_high(),
            false,
            button_right_pin.is_high(),
            false,
        );
        let mode_switch = debounce::ModeSwitch::new(switch_pin.is_high());

        let mut scheduler = Scheduler::new();
        scheduler.register(ScheduledTask::Input, TICKS_PER_INPUT_POLL);
        scheduler.register(ScheduledTask::Control, TICKS_PER_CTRL);
        scheduler.register(ScheduledTask::YawScan, TICKS_PER_YAW_SCAN);
        scheduler.register(ScheduledTask::Display, TICKS_PER_DISPLAY);
        scheduler.register(ScheduledTask::Telemetry, TICKS_PER_TELEMETRY);

        (
            Shared {
                scheduler,
                flight_mode: FlightModeState::new(),
                altitude: altitude_state,
                yaw: YawState::new(),
                rotors,
                pid_altitude,
                pid_yaw,
                buttons,
                mode_switch,
                adc,
                uart,
                display,
                quad_a_pin,
                quad_b_pin,
            },
            Local {
                tick_timer,
                button_up_pin,
                button_down_pin,
                button_left_pin,
                button_right_pin,
                switch_pin,
            },
            init::Monotonics(),
        )
    }

    /// Foreground: drains the scheduler's ready queue, highest priority
    /// first, idling (`wfi`) when nothing is ready. See spec.md §4.8.
    #[idle(shared = [
        scheduler, flight_mode, altitude, yaw, rotors, pid_altitude, pid_yaw,
        buttons, mode_switch, uart, display,
    ])]
    fn idle(mut cx: idle::Context) -> ! {
        loop {
            let next = cx.shared.scheduler.lock(|s| s.poll());

            match next {
                Some(ScheduledTask::Input) => run_input(&mut cx),
                Some(ScheduledTask::Control) => run_control(&mut cx),
                Some(ScheduledTask::YawScan) => run_yaw_scan(&mut cx),
                Some(ScheduledTask::Display) => run_display(&mut cx),
                Some(ScheduledTask::Telemetry) => run_telemetry(&mut cx),
                None => asm::wfi(),
            }
        }
    }

    /// Hardware tick at `F_TICK` (400 Hz). Performs, in order, the three
    /// steps spec.md §2 assigns to the tick: trigger one ADC conversion,
    /// poll the button/switch debouncers, advance the scheduler.
    #[task(
        binds = TIM2,
        shared = [adc, buttons, mode_switch, scheduler],
        local = [tick_timer, button_up_pin, button_down_pin, button_left_pin, button_right_pin, switch_pin],
        priority = 3
    )]
    fn tick(mut cx: tick::Context) {
        cx.local.tick_timer.clear_interrupt(TimerInterrupt::Update);

        cx.shared.adc.lock(|adc| adc.start_conversion(&[0]));

        let up = cx.local.button_up_pin.is_high();
        let down = cx.local.button_down_pin.is_high();
        let left = cx.local.button_left_pin.is_high();
        let right = cx.local.button_right_pin.is_high();
        let switch = cx.local.switch_pin.is_high();

        cx.shared.buttons.lock(|b| b.poll(up, down, left, right));
        cx.shared.mode_switch.lock(|s| s.poll(switch));

        cx.shared.scheduler.lock(|s| s.tick());
    }

    /// ADC conversion-complete interrupt: pushes one fresh reading into the
    /// altitude averager. See spec.md §4.2.
    #[task(binds = ADC1_2, shared = [adc, altitude], priority = 4)]
    fn adc_complete(mut cx: adc_complete::Context) {
        let raw = cx.shared.adc.lock(|adc| adc.read_result());
        cx.shared.altitude.lock(|alt| alt.on_conversion_complete(raw));
    }

    /// Quadrature A-line edge interrupt. See spec.md §4.3.
    #[task(binds = EXTI0, shared = [quad_a_pin, quad_b_pin, yaw], priority = 6)]
    fn quad_edge_a(mut cx: quad_edge_a::Context) {
        hal::gpio::clear_exti_interrupt(0);
        (cx.shared.quad_a_pin, cx.shared.quad_b_pin, cx.shared.yaw).lock(|a_pin, b_pin, yaw| {
            yaw.on_edge(a_pin.is_high(), b_pin.is_high());
        });
    }

    /// Quadrature B-line edge interrupt. A and B sit on separate EXTI lines
    /// (different pin numbers), so each gets its own binding, but both read
    /// the combined A/B level and hand it to the same `YawState::on_edge` —
    /// correctness doesn't depend on which line's edge woke the handler.
    #[task(binds = EXTI1, shared = [quad_a_pin, quad_b_pin, yaw], priority = 6)]
    fn quad_edge_b(mut cx: quad_edge_b::Context) {
        hal::gpio::clear_exti_interrupt(1);
        (cx.shared.quad_a_pin, cx.shared.quad_b_pin, cx.shared.yaw).lock(|a_pin, b_pin, yaw| {
            yaw.on_edge(a_pin.is_high(), b_pin.is_high());
        });
    }

    /// Yaw index-pulse interrupt (falling edge, active-low). Only while
    /// `FlightMode::FindingYawReference`: zeroes the yaw channel and
    /// advances the flight mode to `Flying`. See spec.md §4.3, §4.7.
    #[task(binds = EXTI2, shared = [yaw, flight_mode], priority = 7)]
    fn yaw_index(mut cx: yaw_index::Context) {
        hal::gpio::clear_exti_interrupt(2);

        (cx.shared.yaw, cx.shared.flight_mode).lock(|yaw, flight_mode| {
            let mode = flight_mode.mode();
            if yaw.on_index_pulse(mode) {
                let transition = flight_mode.on_index_pulse(true);
                debug_assert_eq!(transition, Transition::ReferenceFound);
                info!("yaw index pulse found; now flying");
            }
        });
    }

    /// Foreground input task: reads debounced button/switch events and
    /// applies their effects per spec.md §4.7's transition table. Runs at
    /// `INPUT_POLL_RATE`, highest scheduler priority.
    fn run_input(cx: &mut idle::Context) {
        (
            cx.shared.buttons,
            cx.shared.mode_switch,
            cx.shared.flight_mode,
            cx.shared.altitude,
            cx.shared.yaw,
            cx.shared.rotors,
        )
            .lock(|buttons, mode_switch, flight_mode, altitude, yaw, rotors| {
                match mode_switch.check() {
                    SwitchEvent::Up => {
                        if flight_mode.on_switch_up() == Transition::StartedTakeoff {
                            rotors.start_main();
                            rotors.start_tail();
                            info!("switch up: starting take-off scan");
                        }
                    }
                    SwitchEvent::Down => {
                        if flight_mode.on_switch_down() == Transition::StartedLanding {
                            yaw.set_desired(0);
                            info!("switch down: landing, yaw first");
                        }
                    }
                    SwitchEvent::Unchanged => {}
                }

                // Buttons are always polled (debounce state must stay
                // current), but their edges only drive set-points while
                // flying, per spec.md §8 scenario S6.
                let flying = matches!(flight_mode.mode(), FlightMode::Flying);
                let up = buttons.check(Button::Up);
                let down = buttons.check(Button::Down);
                let left = buttons.check(Button::Left);
                let right = buttons.check(Button::Right);

                if flying {
                    if up == ButtonEvent::Pushed {
                        altitude.change_desired(config::ALTITUDE_STEP);
                    }
                    if down == ButtonEvent::Pushed {
                        altitude.change_desired(-config::ALTITUDE_STEP);
                    }
                    if left == ButtonEvent::Pushed {
                        yaw.change_desired(-config::YAW_STEP);
                    }
                    if right == ButtonEvent::Pushed {
                        yaw.change_desired(config::YAW_STEP);
                    }
                }
            });
    }

    /// Foreground control-loop task: runs both PI controllers at `F_CTRL`
    /// and drives the landing state machine's error-reaches-zero
    /// transitions. See spec.md §4.6, §4.7.
    fn run_control(cx: &mut idle::Context) {
        (
            cx.shared.flight_mode,
            cx.shared.altitude,
            cx.shared.yaw,
            cx.shared.rotors,
            cx.shared.pid_altitude,
            cx.shared.pid_yaw,
        )
            .lock(|flight_mode, altitude, yaw, rotors, pid_alt, pid_yaw| {
                if !flight_mode.controls_active() {
                    return;
                }

                let alt_error = altitude.error();
                let main_duty = pid_alt.step(alt_error);
                rotors.set_main(main_duty as i16);

                let yaw_error = yaw.error();
                let tail_duty = pid_yaw.step(yaw_error);
                rotors.set_tail(tail_duty as i16);

                if flight_mode.on_yaw_error(yaw_error) == Transition::YawLevelled {
                    altitude.set_desired(0);
                    info!("yaw levelled; descending");
                }

                if flight_mode.on_altitude_error(alt_error) == Transition::Touchdown {
                    rotors.stop_main();
                    rotors.stop_tail();
                    pid_alt.reset();
                    pid_yaw.reset();
                    info!("touchdown");
                }
            });
    }

    /// Foreground yaw-scan task: while searching for the index reference,
    /// advances the desired yaw by `YAW_STEP` at `YAW_SCAN_RATE` so the
    /// tail rotor sweeps until the index pulse fires. See spec.md §4.7, §9.
    fn run_yaw_scan(cx: &mut idle::Context) {
        (cx.shared.flight_mode, cx.shared.yaw).lock(|flight_mode, yaw| {
            if flight_mode.finding_reference() {
                yaw.change_desired(config::YAW_STEP);
            }
        });
    }

    fn snapshot(
        altitude: &AltitudeState,
        yaw: &YawState,
        rotors: &RotorPwm<RotorChannel<TIM3>, RotorChannel<TIM4>>,
        flight_mode: &FlightModeState,
    ) -> Snapshot {
        Snapshot {
            altitude_percent: altitude.percent(),
            altitude_desired: altitude.desired(),
            altitude_mean_adc: altitude.mean_adc(),
            yaw_degrees: yaw.yaw_degrees(),
            yaw_desired: yaw.desired(),
            main_duty: rotors.get_main(),
            tail_duty: rotors.get_tail(),
            mode: flight_mode.mode(),
        }
    }

    /// Foreground display task, at `DISPLAY_RATE`. See spec.md §4.9, §6.
    fn run_display(cx: &mut idle::Context) {
        (
            cx.shared.altitude,
            cx.shared.yaw,
            cx.shared.rotors,
            cx.shared.flight_mode,
            cx.shared.display,
        )
            .lock(|altitude, yaw, rotors, flight_mode, display| {
                let snap = snapshot(altitude, yaw, rotors, flight_mode);
                telemetry::update_display(display, &snap);
            });
    }

    /// Foreground telemetry task, at `TELEMETRY_RATE`. See spec.md §4.9, §6.
    fn run_telemetry(cx: &mut idle::Context) {
        (
            cx.shared.altitude,
            cx.shared.yaw,
            cx.shared.rotors,
            cx.shared.flight_mode,
            cx.shared.uart,
        )
            .lock(|altitude, yaw, rotors, flight_mode, uart| {
                let snap = snapshot(altitude, yaw, rotors, flight_mode);
                telemetry::send_telemetry(uart, &snap);
            });
    }
}
