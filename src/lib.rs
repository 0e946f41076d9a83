//! Input disambiguation core for the lampctl smart desk lamp.
//!
//! Everything in here is hardware-independent and host-testable: the
//! board only supplies pins, an I²C bus, a PWM sink and a millisecond
//! tick through the traits re-exported below.
//!
//! Usage: `cargo test` (host) or `cargo run --release --features embedded`
//! (nRF52840 target, see `main.rs`).
//!
//! ```text
//!  key::engine      debounced keys ─▶ Click / Double / Triple / Hold / Modifier
//!  gesture::engine  PAJ7620 flags  ─▶ anti-rebound ─▶ priority ─▶ command / proximity
//!  proximity        hand distance  ─▶ throttled target, auto-lock when still
//!  control          events         ─▶ light model ─▶ warm / cold duty
//! ```

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module.
mod fmt;

pub mod config;
pub mod control;
pub mod error;
pub mod gesture;
pub mod key;
pub mod light;
pub mod proximity;
pub mod time;

pub use control::{ControlDispatcher, ControlMode, EventReporter, Report};
pub use error::Error;
pub use gesture::{
    Dispatch, Gesture, GestureArbitrationEngine, GestureFlags, GestureFlags2, GestureHandler,
    GestureMode, GestureSnapshot, GestureSource,
};
pub use key::{key_mask, KeyEvent, KeyEventEngine, KeyEventKind, KeyInput, KeyMask};
pub use light::{DutyPair, DutySink, Focus, LightState};
pub use proximity::{ProximityAutoLockController, ProximityUpdate};
pub use time::{elapsed, Millis, TickSource};
