//! Control dispatcher: the lamp's business logic.
//!
//! Consumes key events, gesture callbacks, encoder deltas and remote
//! commands, drives the light model and the LED strings, and reports
//! through an [`EventReporter`]: every gesture, remote-mode encoder
//! movement, the throttled light state, and the mode key's Click,
//! DoubleClick, TripleClick, HoldStart and HoldEnd. Other key events
//! (Up, Down, Holding, ModifierClick) are not reported.
//!
//! ```text
//!  KeyEventEngine ──poll_event──┐
//!  GestureArbitrationEngine ────┼──▶ ControlDispatcher ──▶ DutySink
//!  encoder / remote ────────────┘            │
//!                                            └──────────▶ EventReporter
//! ```
//!
//! Local adjustments mark the state dirty; [`ControlDispatcher::task`]
//! reports it once the user has paused. Raw duty writes (remote commands,
//! reset, off, proximity dimming) are not reported back.

use crate::config::{GESTURE_STEP, RESET_DUTY, STATE_REPORT_THROTTLE_MS};
use crate::gesture::{Gesture, GestureHandler};
use crate::key::{KeyEvent, KeyEventKind, KeyMask};
use crate::light::{DutyPair, DutySink, Focus, LightState};
use crate::proximity::{ProximityAutoLockController, ProximityUpdate};
use crate::time::{elapsed, Millis};

/// Who owns the light.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMode {
    /// Keys, gestures and encoder act on the lamp directly.
    #[default]
    Local,
    /// A remote UI drives the lamp; local input is forwarded to it.
    RemoteUi,
}

/// Outbound notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report {
    Key(KeyEvent),
    Gesture(Gesture),
    /// Current warm / cold duty.
    State(DutyPair),
    Encoder(i16),
}

/// Receiver of outbound reports (protocol link, log, test recorder).
pub trait EventReporter {
    fn report(&mut self, report: Report);
}

impl EventReporter for () {
    fn report(&mut self, _report: Report) {}
}

impl<R: EventReporter + ?Sized> EventReporter for &mut R {
    fn report(&mut self, report: Report) {
        (**self).report(report)
    }
}

pub struct ControlDispatcher<D, R> {
    sink: D,
    reporter: R,
    mode_key: KeyMask,
    mode: ControlMode,
    light: LightState,
    /// Duty last written to the sink.
    duty: DutyPair,
    long_pressing: bool,
    proximity: ProximityAutoLockController,
    dirty: bool,
    last_change: Millis,
}

impl<D: DutySink, R: EventReporter> ControlDispatcher<D, R> {
    /// Build the dispatcher and drive the sink to the default light state.
    pub fn new(sink: D, reporter: R, mode_key: KeyMask) -> Self {
        Self::with_parts(
            sink,
            reporter,
            mode_key,
            LightState::default(),
            ProximityAutoLockController::new(),
        )
    }

    pub fn with_parts(
        sink: D,
        reporter: R,
        mode_key: KeyMask,
        light: LightState,
        proximity: ProximityAutoLockController,
    ) -> Self {
        let mut this = Self {
            sink,
            reporter,
            mode_key,
            mode: ControlMode::Local,
            light,
            duty: DutyPair::OFF,
            long_pressing: false,
            proximity,
            dirty: false,
            last_change: 0,
        };
        this.apply_model();
        this
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn light(&self) -> &LightState {
        &self.light
    }

    pub fn duty(&self) -> DutyPair {
        self.duty
    }

    pub fn is_long_pressing(&self) -> bool {
        self.long_pressing
    }

    pub fn proximity(&self) -> &ProximityAutoLockController {
        &self.proximity
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn set_mode(&mut self, mode: ControlMode) {
        self.mode = mode;
        info!("Control: mode {}", mode);
    }

    pub fn toggle_mode(&mut self) {
        let next = match self.mode {
            ControlMode::Local => ControlMode::RemoteUi,
            ControlMode::RemoteUi => ControlMode::Local,
        };
        self.set_mode(next);
    }

    /// Handle one key event from the key engine.
    ///
    /// Only the mode key carries an action; other masks are ignored.
    pub fn on_key_event(&mut self, event: KeyEvent) {
        if event.mask != self.mode_key {
            return;
        }

        match event.kind {
            KeyEventKind::Click
            | KeyEventKind::DoubleClick
            | KeyEventKind::TripleClick
            | KeyEventKind::HoldStart
            | KeyEventKind::HoldEnd => self.reporter.report(Report::Key(event)),
            _ => return,
        }

        match event.kind {
            KeyEventKind::HoldStart => {
                self.long_pressing = true;
                info!("Control: long press, color temperature");
            }
            KeyEventKind::HoldEnd => {
                self.long_pressing = false;
                self.light.set_focus(Focus::Brightness);
                debug!("Control: long press ended after {=u32} ms", event.param);
            }
            KeyEventKind::TripleClick => self.toggle_mode(),
            KeyEventKind::Click => {
                let focus = self.light.toggle_focus();
                info!("Control: focus {}", focus);
            }
            KeyEventKind::DoubleClick => {
                if self.mode == ControlMode::Local {
                    self.set_raw_duty(RESET_DUTY.into());
                    info!("Control: reset");
                }
            }
            _ => {}
        }
    }

    /// Rotary encoder movement since the last call.
    pub fn on_encoder(&mut self, delta: i16, now: Millis) {
        if delta == 0 {
            return;
        }
        match self.mode {
            ControlMode::RemoteUi => self.reporter.report(Report::Encoder(delta)),
            ControlMode::Local if self.long_pressing => self.adjust_color_temp(delta, now),
            ControlMode::Local => match self.light.focus() {
                Focus::Brightness => self.adjust_brightness(delta, now),
                Focus::ColorTemp => self.adjust_color_temp(delta, now),
            },
        }
    }

    /// Duty pair pushed by the remote side.
    pub fn apply_remote_duty(&mut self, pair: DutyPair) {
        self.set_raw_duty(pair);
    }

    pub fn adjust_brightness(&mut self, delta: i16, now: Millis) {
        self.light.adjust_brightness(delta);
        self.local_change(now);
    }

    pub fn adjust_color_temp(&mut self, delta: i16, now: Millis) {
        self.light.adjust_color_temp(delta);
        self.local_change(now);
    }

    /// Write a duty pair straight to the sink and re-derive the model.
    /// Clears any pending state report.
    pub fn set_raw_duty(&mut self, pair: DutyPair) {
        self.output(pair);
        self.light.set_from_duty(pair);
    }

    /// Report the current duty now.
    pub fn force_report(&mut self) {
        self.reporter.report(Report::State(self.duty));
        self.dirty = false;
    }

    /// Periodic housekeeping, called every few tens of milliseconds.
    pub fn task(&mut self, now: Millis) {
        if self.dirty && elapsed(now, self.last_change) > STATE_REPORT_THROTTLE_MS {
            self.force_report();
        }
    }

    fn local_change(&mut self, now: Millis) {
        self.apply_model();
        self.dirty = true;
        self.last_change = now;
    }

    /// Drive the sink without touching the light model.
    fn output(&mut self, pair: DutyPair) {
        self.sink.apply_duty_pair(pair);
        self.duty = pair;
        self.dirty = false;
    }

    fn apply_model(&mut self) {
        self.duty = self.light.duty_pair();
        self.sink.apply_duty_pair(self.duty);
    }
}

impl<D: DutySink, R: EventReporter> GestureHandler for ControlDispatcher<D, R> {
    fn on_gesture(&mut self, gesture: Gesture, now: Millis) {
        self.reporter.report(Report::Gesture(gesture));

        // The gesture engine enters proximity control on every push,
        // whoever owns the light.
        if gesture == Gesture::Forward {
            self.proximity.reset(now);
        }

        if self.mode != ControlMode::Local {
            return;
        }

        match gesture {
            Gesture::Up => self.adjust_brightness(GESTURE_STEP, now),
            Gesture::Down => self.adjust_brightness(-GESTURE_STEP, now),
            Gesture::Left => self.adjust_color_temp(GESTURE_STEP, now),
            Gesture::Right => self.adjust_color_temp(-GESTURE_STEP, now),
            Gesture::Forward => info!("Control: proximity dimming"),
            Gesture::Backward => {
                self.set_raw_duty(DutyPair::OFF);
                info!("Control: off");
            }
            _ => {}
        }
    }

    fn on_proximity(&mut self, brightness: u8, now: Millis) {
        if self.mode != ControlMode::Local {
            return;
        }
        if let ProximityUpdate::Apply(target) = self.proximity.on_proximity(brightness, now) {
            // Only the focused axis moves; the other keeps its exact value.
            self.light.apply_target(target);
            let pair = self.light.duty_pair();
            self.output(pair);
        }
    }

    fn on_proximity_exit(&mut self, _now: Millis) {
        self.force_report();
    }
}
