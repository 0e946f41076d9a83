//! Mechanical key input: per-key debouncing and click / hold recognition.

pub mod engine;
pub mod input;

pub use engine::{key_mask, KeyEvent, KeyEventEngine, KeyEventKind, KeyMask};
pub use input::{ActiveLevel, Key, KeyId, KeyInput, PinInput};
