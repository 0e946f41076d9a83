//! Hand-gesture input from an IR gesture sensor.

pub mod engine;
pub mod flags;
pub mod sensor;

pub use engine::{Dispatch, GestureArbitrationEngine, GestureHandler, GestureMode};
pub use flags::{Gesture, GestureFlags, GestureFlags2};
pub use sensor::{GestureSnapshot, GestureSource, Paj7620};
