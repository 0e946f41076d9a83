//! Proximity auto-lock controller.
//!
//! While the gesture engine is in proximity control, every poll hands the
//! reflected brightness to [`ProximityAutoLockController::on_proximity`].
//! Moving the hand changes the target; holding it still for the lock time
//! freezes the value so the hand can be pulled away without disturbing it.
//!
//! ```text
//!  sample ─▶ locked? ──yes──▶ Locked
//!              │ no
//!              ▼
//!        |b - stable| > th ──yes──▶ stable = b, since = now
//!              │ no
//!              ▼
//!        still > lock time ──yes──▶ lock, Locked
//!              │ no
//!              ▼
//!        throttle ──▶ Apply(target) / Throttled
//! ```

use crate::config::{ProximityTiming, LIGHT_MAX};
use crate::time::{elapsed, Millis};

/// Outcome of one proximity sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProximityUpdate {
    /// Value is frozen; nothing to apply.
    Locked,
    /// Unlocked, but an update went out too recently.
    Throttled,
    /// Write this value to the focused light axis.
    Apply(u16),
}

pub struct ProximityAutoLockController {
    timing: ProximityTiming,
    locked: bool,
    last_stable: u8,
    stable_since: Millis,
    last_update: Option<Millis>,
}

impl Default for ProximityAutoLockController {
    fn default() -> Self {
        Self::new()
    }
}

impl ProximityAutoLockController {
    pub fn new() -> Self {
        Self::with_timing(ProximityTiming::default())
    }

    pub fn with_timing(timing: ProximityTiming) -> Self {
        Self {
            timing,
            locked: false,
            last_stable: 0,
            stable_since: 0,
            last_update: None,
        }
    }

    /// Start a fresh proximity session.
    pub fn reset(&mut self, now: Millis) {
        self.locked = false;
        self.last_stable = 0;
        self.stable_since = now;
        self.last_update = None;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Map a brightness reading to the light target, 0..=LIGHT_MAX.
    pub fn target_for(&self, brightness: u8) -> u16 {
        let over = brightness.saturating_sub(self.timing.offset) as u32;
        (over * self.timing.gain as u32).min(LIGHT_MAX as u32) as u16
    }

    pub fn on_proximity(&mut self, brightness: u8, now: Millis) -> ProximityUpdate {
        if self.locked {
            return ProximityUpdate::Locked;
        }

        if brightness.abs_diff(self.last_stable) > self.timing.stability_threshold {
            self.last_stable = brightness;
            self.stable_since = now;
        } else if elapsed(now, self.stable_since) > self.timing.lock_time_ms {
            self.locked = true;
            info!("Proximity: locked at {=u8}", brightness);
            return ProximityUpdate::Locked;
        }

        let target = self.target_for(brightness);

        let due = match self.last_update {
            None => true,
            Some(at) => elapsed(now, at) > self.timing.update_throttle_ms,
        };
        if !due {
            return ProximityUpdate::Throttled;
        }

        self.last_update = Some(now);
        trace!("Proximity: target {=u16}", target);
        ProximityUpdate::Apply(target)
    }
}
