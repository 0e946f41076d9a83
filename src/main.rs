//! lampctl firmware: nRF52840 smart desk lamp.
//!
//! ```text
//!   ModeSW (P0.11) ──▶ KeyEventEngine ──┐
//!                                        ├──▶ ControlDispatcher ──▶ PWM0 (warm P0.13 / cold P0.14)
//!   PAJ7620 (TWIM0) ─▶ GestureEngine ────┘
//! ```
//!
//! One cooperative superloop on a 5 ms ticker. The gesture engine and
//! key engine never share state; both feed the dispatcher from the same
//! loop iteration.
//!
//! Build & flash:
//!   cargo run --release --features embedded

#![no_std]
#![no_main]

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Input, Pull};
use embassy_nrf::pwm::SimplePwm;
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_time::{Duration, Instant, Ticker};
use {defmt_rtt as _, panic_probe as _};

use lampctl::config::LIGHT_MAX;
use lampctl::control::{ControlDispatcher, EventReporter, Report};
use lampctl::gesture::{GestureArbitrationEngine, Paj7620};
use lampctl::key::{key_mask, KeyEventEngine, KeyId, PinInput};
use lampctl::light::{DutyPair, DutySink};
use lampctl::time::{elapsed, Millis};

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

/// Key id of the mode switch.
const KID_MODE: KeyId = 0;

/// Superloop period (ms).
const LOOP_PERIOD_MS: u64 = 5;

/// Dispatcher housekeeping period (ms).
const CONTROL_TASK_PERIOD_MS: Millis = 50;

/// Warm / cold LED strings on two channels of one PWM instance.
struct LedPwm<'d> {
    pwm: SimplePwm<'d, peripherals::PWM0>,
}

impl<'d> LedPwm<'d> {
    fn new(mut pwm: SimplePwm<'d, peripherals::PWM0>) -> Self {
        pwm.set_max_duty(LIGHT_MAX);
        Self { pwm }
    }
}

impl DutySink for LedPwm<'_> {
    fn apply_duty_pair(&mut self, pair: DutyPair) {
        self.pwm.set_duty(0, pair.warm.min(LIGHT_MAX));
        self.pwm.set_duty(1, pair.cold.min(LIGHT_MAX));
    }
}

/// Reports go to the RTT log until a host link exists.
struct LogReporter;

impl EventReporter for LogReporter {
    fn report(&mut self, report: Report) {
        info!("report: {}", report);
    }
}

fn now_ms() -> Millis {
    Instant::now().as_millis() as Millis
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("lampctl starting");

    // Keys
    let mut keys: KeyEventEngine<PinInput<Input<'static>>> = KeyEventEngine::new();
    let mode_pin = PinInput::active_low(Input::new(p.P0_11, Pull::Up));
    if let Err(e) = keys.register(KID_MODE, mode_pin) {
        warn!("Mode key not registered: {}", e);
    }

    // Light output
    let pwm = SimplePwm::new_2ch(p.PWM0, p.P0_13, p.P0_14);
    let mut control = ControlDispatcher::new(LedPwm::new(pwm), LogReporter, key_mask(KID_MODE));

    // Gesture sensor
    let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let mut sensor = Paj7620::new(i2c);
    match sensor.init() {
        Ok(()) => info!("Gesture ready"),
        Err(e) => warn!("Gesture init failed: {}", e),
    }
    let mut gestures = GestureArbitrationEngine::new(sensor);

    let mut ticker = Ticker::every(Duration::from_millis(LOOP_PERIOD_MS));
    let mut last_task = now_ms();

    loop {
        let now = now_ms();

        keys.tick(now);
        while let Some(event) = keys.poll_event() {
            control.on_key_event(event);
        }

        gestures.poll(now, &mut control);

        if elapsed(now, last_task) >= CONTROL_TASK_PERIOD_MS {
            last_task = now;
            control.task(now);
        }

        ticker.next().await;
    }
}
