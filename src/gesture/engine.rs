//! Gesture arbitration engine.
//!
//! Each poll reads one snapshot and runs three stages:
//!
//! 1. anti-rebound: an exact reversal of the last accepted gesture inside
//!    the reverse window is dropped,
//! 2. priority arbitration between bits latched in the same read,
//! 3. mode dispatch: discrete callbacks in command mode, continuous
//!    brightness callbacks while the hand hovers in proximity mode.

use super::flags::{Gesture, GestureFlags, GestureFlags2};
use super::sensor::{GestureSnapshot, GestureSource};
use crate::config::GestureTiming;
use crate::time::{elapsed, Millis};

/// Engine mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GestureMode {
    /// Command mode: swipes and rotations map to discrete actions.
    Idle,
    /// Entered by a push; object brightness drives analog control.
    ProximityControl,
}

/// Callbacks invoked by the engine. Every method defaults to a no-op.
pub trait GestureHandler {
    fn on_gesture(&mut self, _gesture: Gesture, _now: Millis) {}

    /// Continuous sample while in proximity control.
    fn on_proximity(&mut self, _brightness: u8, _now: Millis) {}

    /// The hand left; the engine is back in command mode.
    fn on_proximity_exit(&mut self, _now: Millis) {}
}

impl GestureHandler for () {}

impl<H: GestureHandler + ?Sized> GestureHandler for &mut H {
    fn on_gesture(&mut self, gesture: Gesture, now: Millis) {
        (**self).on_gesture(gesture, now)
    }

    fn on_proximity(&mut self, brightness: u8, now: Millis) {
        (**self).on_proximity(brightness, now)
    }

    fn on_proximity_exit(&mut self, now: Millis) {
        (**self).on_proximity_exit(now)
    }
}

/// What a single poll did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// Sensor read failed; nothing changed.
    Disconnected,
    /// Nothing to report this cycle.
    Quiet,
    /// Command-mode reading dropped as the return swing of the last gesture.
    Rebound,
    Gesture(Gesture),
    Proximity(u8),
    ProximityExit,
}

/// Gesture arbitration engine over a snapshot source.
pub struct GestureArbitrationEngine<S> {
    source: S,
    timing: GestureTiming,
    mode: GestureMode,
    last_gesture: GestureFlags,
    last_gesture_at: Millis,
    sensor_online: bool,
}

impl<S: GestureSource> GestureArbitrationEngine<S> {
    pub fn new(source: S) -> Self {
        Self::with_timing(source, GestureTiming::default())
    }

    pub fn with_timing(source: S, timing: GestureTiming) -> Self {
        Self {
            source,
            timing,
            mode: GestureMode::Idle,
            last_gesture: GestureFlags::NONE,
            last_gesture_at: 0,
            sensor_online: true,
        }
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    /// Last accepted gesture flags and when they were accepted.
    pub fn last_gesture(&self) -> (GestureFlags, Millis) {
        (self.last_gesture, self.last_gesture_at)
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Read the sensor once and dispatch.
    pub fn poll<H: GestureHandler>(&mut self, now: Millis, handler: &mut H) -> Dispatch {
        let snapshot = self.source.read_snapshot();
        self.process(&snapshot, now, handler)
    }

    /// Dispatch an already captured snapshot.
    pub fn process<H: GestureHandler>(
        &mut self,
        snapshot: &GestureSnapshot,
        now: Millis,
        handler: &mut H,
    ) -> Dispatch {
        if !snapshot.connected {
            if self.sensor_online {
                warn!("Gesture sensor not responding");
                self.sensor_online = false;
            }
            return Dispatch::Disconnected;
        }
        if !self.sensor_online {
            info!("Gesture sensor back online");
            self.sensor_online = true;
        }

        let raw = snapshot.flags;
        let rebound = !raw.is_empty()
            && raw.reverses(self.last_gesture)
            && elapsed(now, self.last_gesture_at) < self.timing.reverse_filter_ms;

        // A rebound counts as "no gesture"; the mode logic still runs.
        let (flags, flags2) = if rebound {
            debug!("Gesture rebound ignored: {=u8:#x}", raw.bits());
            (GestureFlags::NONE, GestureFlags2::NONE)
        } else {
            (raw.arbitrate(), snapshot.flags2)
        };

        match self.mode {
            GestureMode::Idle => {
                if !flags.is_empty() {
                    self.last_gesture = flags;
                    self.last_gesture_at = now;
                }

                let Some(gesture) = Gesture::select(flags, flags2) else {
                    return if rebound { Dispatch::Rebound } else { Dispatch::Quiet };
                };

                if gesture == Gesture::Forward {
                    info!("Gesture: enter proximity control");
                    self.mode = GestureMode::ProximityControl;
                }
                handler.on_gesture(gesture, now);
                Dispatch::Gesture(gesture)
            }

            GestureMode::ProximityControl => {
                let brightness = snapshot.object_brightness;
                if brightness < self.timing.proximity_exit_threshold {
                    info!("Gesture: leave proximity control");
                    self.mode = GestureMode::Idle;
                    // Pulling the hand away must not read as Backward.
                    self.last_gesture = GestureFlags::FORWARD;
                    self.last_gesture_at = now;
                    handler.on_proximity_exit(now);
                    Dispatch::ProximityExit
                } else {
                    handler.on_proximity(brightness, now);
                    Dispatch::Proximity(brightness)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[derive(Debug, PartialEq)]
    enum Call {
        Gesture(Gesture),
        Proximity(u8),
        Exit,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl GestureHandler for Recorder {
        fn on_gesture(&mut self, gesture: Gesture, _now: Millis) {
            self.calls.push(Call::Gesture(gesture));
        }

        fn on_proximity(&mut self, brightness: u8, _now: Millis) {
            self.calls.push(Call::Proximity(brightness));
        }

        fn on_proximity_exit(&mut self, _now: Millis) {
            self.calls.push(Call::Exit);
        }
    }

    fn engine() -> GestureArbitrationEngine<fn() -> GestureSnapshot> {
        GestureArbitrationEngine::new(GestureSnapshot::disconnected as fn() -> GestureSnapshot)
    }

    fn swipe(flags: GestureFlags) -> GestureSnapshot {
        GestureSnapshot::new(flags, 0)
    }

    #[test]
    fn rebound_inside_window_suppressed() {
        let mut e = engine();
        let mut rec = Recorder::default();
        e.process(&swipe(GestureFlags::LEFT), 1_000, &mut rec);
        assert_eq!(e.process(&swipe(GestureFlags::RIGHT), 1_300, &mut rec), Dispatch::Rebound);
        assert_eq!(rec.calls, [Call::Gesture(Gesture::Left)]);
    }

    #[test]
    fn reverse_after_window_accepted() {
        let mut e = engine();
        let mut rec = Recorder::default();
        e.process(&swipe(GestureFlags::LEFT), 1_000, &mut rec);
        assert_eq!(
            e.process(&swipe(GestureFlags::RIGHT), 1_600, &mut rec),
            Dispatch::Gesture(Gesture::Right)
        );
    }

    #[test]
    fn rebound_does_not_refresh_last_gesture() {
        let mut e = engine();
        let mut rec = Recorder::default();
        e.process(&swipe(GestureFlags::UP), 0, &mut rec);
        e.process(&swipe(GestureFlags::DOWN), 100, &mut rec);
        assert_eq!(e.last_gesture(), (GestureFlags::UP, 0));
    }

    #[test]
    fn forward_wins_over_up() {
        let mut e = engine();
        let mut rec = Recorder::default();
        let d = e.process(&swipe(GestureFlags::FORWARD | GestureFlags::UP), 0, &mut rec);
        assert_eq!(d, Dispatch::Gesture(Gesture::Forward));
        assert_eq!(rec.calls, [Call::Gesture(Gesture::Forward)]);
        assert_eq!(e.mode(), GestureMode::ProximityControl);
    }

    #[test]
    fn rotation_wins_over_swipe() {
        let mut e = engine();
        let mut rec = Recorder::default();
        let d = e.process(&swipe(GestureFlags::CLOCKWISE | GestureFlags::LEFT), 0, &mut rec);
        assert_eq!(d, Dispatch::Gesture(Gesture::Clockwise));
        assert_eq!(e.mode(), GestureMode::Idle);
    }

    #[test]
    fn wave_from_second_register() {
        let mut e = engine();
        let mut rec = Recorder::default();
        let snap = GestureSnapshot {
            flags2: GestureFlags2::WAVE,
            ..GestureSnapshot::new(GestureFlags::NONE, 0)
        };
        assert_eq!(e.process(&snap, 0, &mut rec), Dispatch::Gesture(Gesture::Wave));
    }

    #[test]
    fn proximity_samples_until_hand_leaves() {
        let mut e = engine();
        let mut rec = Recorder::default();
        e.process(&swipe(GestureFlags::FORWARD), 0, &mut rec);
        // Flags are ignored while hovering.
        e.process(&GestureSnapshot::new(GestureFlags::LEFT, 120), 20, &mut rec);
        e.process(&GestureSnapshot::new(GestureFlags::NONE, 20), 40, &mut rec);
        assert_eq!(e.process(&GestureSnapshot::new(GestureFlags::NONE, 19), 60, &mut rec), Dispatch::ProximityExit);
        assert_eq!(
            rec.calls,
            [
                Call::Gesture(Gesture::Forward),
                Call::Proximity(120),
                Call::Proximity(20),
                Call::Exit,
            ]
        );
        assert_eq!(e.mode(), GestureMode::Idle);
        assert_eq!(e.last_gesture(), (GestureFlags::FORWARD, 60));
    }

    #[test]
    fn backward_right_after_exit_is_rebound() {
        let mut e = engine();
        let mut rec = Recorder::default();
        e.process(&swipe(GestureFlags::FORWARD), 0, &mut rec);
        e.process(&GestureSnapshot::new(GestureFlags::NONE, 5), 2_000, &mut rec);
        assert_eq!(e.process(&swipe(GestureFlags::BACKWARD), 2_100, &mut rec), Dispatch::Rebound);
        assert_eq!(
            e.process(&swipe(GestureFlags::BACKWARD), 2_700, &mut rec),
            Dispatch::Gesture(Gesture::Backward)
        );
    }

    #[test]
    fn backward_after_push_filtered_then_accepted() {
        let mut e = engine();
        let mut rec = Recorder::default();
        e.process(&swipe(GestureFlags::FORWARD), 0, &mut rec);
        // Hand already gone: the rebound is dropped and proximity ends.
        assert_eq!(e.process(&swipe(GestureFlags::BACKWARD), 30, &mut rec), Dispatch::ProximityExit);
        assert_eq!(
            e.process(&swipe(GestureFlags::BACKWARD), 700, &mut rec),
            Dispatch::Gesture(Gesture::Backward)
        );
        assert_eq!(
            rec.calls,
            [
                Call::Gesture(Gesture::Forward),
                Call::Exit,
                Call::Gesture(Gesture::Backward),
            ]
        );
    }

    #[test]
    fn rebound_while_hovering_still_samples() {
        let mut e = engine();
        let mut rec = Recorder::default();
        e.process(&swipe(GestureFlags::FORWARD), 0, &mut rec);
        let d = e.process(&GestureSnapshot::new(GestureFlags::BACKWARD, 90), 40, &mut rec);
        assert_eq!(d, Dispatch::Proximity(90));
    }

    #[test]
    fn rebound_window_across_tick_wrap() {
        let start: Millis = u32::MAX - 100;

        let mut e = engine();
        let mut rec = Recorder::default();
        e.process(&swipe(GestureFlags::LEFT), start, &mut rec);
        let d = e.process(&swipe(GestureFlags::RIGHT), start.wrapping_add(300), &mut rec);
        assert_eq!(d, Dispatch::Rebound);
        assert_eq!(rec.calls, [Call::Gesture(Gesture::Left)]);

        let mut e = engine();
        let mut rec = Recorder::default();
        e.process(&swipe(GestureFlags::LEFT), start, &mut rec);
        let d = e.process(&swipe(GestureFlags::RIGHT), start.wrapping_add(700), &mut rec);
        assert_eq!(d, Dispatch::Gesture(Gesture::Right));
        assert_eq!(rec.calls, [Call::Gesture(Gesture::Left), Call::Gesture(Gesture::Right)]);
    }

    #[test]
    fn disconnected_poll_is_noop() {
        let mut e = engine();
        let mut rec = Recorder::default();
        e.process(&swipe(GestureFlags::FORWARD), 0, &mut rec);
        assert_eq!(e.poll(10, &mut rec), Dispatch::Disconnected);
        assert_eq!(e.mode(), GestureMode::ProximityControl);
        assert_eq!(rec.calls.len(), 1);
    }

    #[test]
    fn quiet_poll_keeps_last_gesture() {
        let mut e = engine();
        e.process(&swipe(GestureFlags::DOWN), 0, &mut ());
        assert_eq!(e.process(&swipe(GestureFlags::NONE), 50, &mut ()), Dispatch::Quiet);
        assert_eq!(e.last_gesture(), (GestureFlags::DOWN, 0));
    }
}
