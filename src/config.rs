//! Application-wide constants and compile-time configuration.
//!
//! All timing windows, thresholds and capacities live here so they can
//! be tuned in one place. The `*Timing` structs carry runtime copies so
//! tests (or a board with different switches) can override them.

use crate::time::Millis;

// Keys

/// Raw pin level must be stable this long before a key changes state (ms).
pub const KEY_DEBOUNCE_MS: Millis = 15;

/// Window in which simultaneously pressed keys merge into one combo (ms).
pub const KEY_COMBO_WINDOW_MS: Millis = 50;

/// Press duration that turns a press into a hold (ms).
pub const KEY_HOLD_TIME_MS: Millis = 800;

/// Release-to-press gap that still counts as a multi-click (ms).
pub const KEY_MULTI_CLICK_GAP_MS: Millis = 250;

/// Interval between `Holding` repeat events (ms). 0 disables repeat.
pub const KEY_REPEAT_RATE_MS: Millis = 0;

/// Minimum spacing between two `ModifierClick` events during a hold (ms).
pub const KEY_MODIFIER_FILTER_MS: Millis = 300;

/// Maximum number of keys the engine scans.
pub const KEY_CAPACITY: usize = 8;

/// Pending key events kept until `poll_event` drains them.
/// A depth of 1 gives the classic single-slot buffer.
pub const KEY_EVENT_QUEUE_DEPTH: usize = 4;

// Gesture sensor

/// 7-bit I²C address of the PAJ7620 (0xE6 in 8-bit write form).
pub const GESTURE_I2C_ADDR: u8 = 0x73;

/// Value of the PAJ7620 part id register.
pub const GESTURE_PART_ID: u8 = 0x20;

/// Opposite gesture inside this window after an accepted one is a rebound (ms).
pub const GESTURE_REVERSE_FILTER_MS: Millis = 600;

/// Object brightness below which proximity control ends.
pub const PROXIMITY_EXIT_THRESHOLD: u8 = 20;

// Proximity dimming

/// Brightness change still considered "hand holding still".
pub const PROXIMITY_STABILITY_THRESHOLD: u8 = 5;

/// Stillness required before the value locks (ms).
pub const PROXIMITY_LOCK_TIME_MS: Millis = 850;

/// Minimum spacing between two applied targets (ms).
pub const PROXIMITY_UPDATE_THROTTLE_MS: Millis = 50;

/// Sensor brightness that maps to a target of zero.
pub const PROXIMITY_OFFSET: u8 = 20;

/// Target units per sensor brightness step above the offset.
pub const PROXIMITY_GAIN: u16 = 5;

// Light

/// Upper bound of both light axes and of each PWM duty channel.
pub const LIGHT_MAX: u16 = 1000;

/// Brightness / color temperature step for a swipe gesture.
pub const GESTURE_STEP: i16 = 200;

/// Duty pair applied by the double-click reset (50 % brightness, neutral white).
pub const RESET_DUTY: (u16, u16) = (250, 250);

/// Quiet period after the last local change before state is reported (ms).
pub const STATE_REPORT_THROTTLE_MS: Millis = 200;

/// Key engine timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyTiming {
    pub debounce_ms: Millis,
    pub combo_window_ms: Millis,
    pub hold_time_ms: Millis,
    pub multi_click_gap_ms: Millis,
    pub repeat_rate_ms: Millis,
    pub modifier_filter_ms: Millis,
    /// Emit `Down` when the combo window closes.
    pub report_down: bool,
}

impl Default for KeyTiming {
    fn default() -> Self {
        Self {
            debounce_ms: KEY_DEBOUNCE_MS,
            combo_window_ms: KEY_COMBO_WINDOW_MS,
            hold_time_ms: KEY_HOLD_TIME_MS,
            multi_click_gap_ms: KEY_MULTI_CLICK_GAP_MS,
            repeat_rate_ms: KEY_REPEAT_RATE_MS,
            modifier_filter_ms: KEY_MODIFIER_FILTER_MS,
            report_down: false,
        }
    }
}

/// Gesture engine thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GestureTiming {
    pub reverse_filter_ms: Millis,
    pub proximity_exit_threshold: u8,
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self {
            reverse_filter_ms: GESTURE_REVERSE_FILTER_MS,
            proximity_exit_threshold: PROXIMITY_EXIT_THRESHOLD,
        }
    }
}

/// Proximity auto-lock tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProximityTiming {
    pub stability_threshold: u8,
    pub lock_time_ms: Millis,
    pub update_throttle_ms: Millis,
    pub offset: u8,
    pub gain: u16,
}

impl Default for ProximityTiming {
    fn default() -> Self {
        Self {
            stability_threshold: PROXIMITY_STABILITY_THRESHOLD,
            lock_time_ms: PROXIMITY_LOCK_TIME_MS,
            update_throttle_ms: PROXIMITY_UPDATE_THROTTLE_MS,
            offset: PROXIMITY_OFFSET,
            gain: PROXIMITY_GAIN,
        }
    }
}
