//! Debounced key source.
//!
//! A [`Key`] wraps anything that can report "contact closed" and filters
//! contact bounce: the raw level must hold for the debounce interval
//! before the confirmed state follows it.

use embedded_hal::digital::InputPin;

use crate::time::{elapsed, Millis};

/// Identifier of a key, also its bit position in a [`KeyMask`](super::KeyMask).
pub type KeyId = u8;

/// Raw sampling capability of one physical key.
pub trait KeyInput {
    /// `true` while the contact reads as pressed (after polarity).
    fn is_active(&mut self) -> bool;
}

impl<F: FnMut() -> bool> KeyInput for F {
    fn is_active(&mut self) -> bool {
        self()
    }
}

/// Electrical polarity of a key input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveLevel {
    /// Pressed pulls the pin to ground (internal pull-up).
    Low,
    /// Pressed drives the pin high (pull-down).
    High,
}

/// [`KeyInput`] over an `embedded-hal` input pin.
///
/// A failed pin read counts as "released".
pub struct PinInput<P> {
    pin: P,
    level: ActiveLevel,
}

impl<P: InputPin> PinInput<P> {
    pub fn new(pin: P, level: ActiveLevel) -> Self {
        Self { pin, level }
    }

    pub fn active_low(pin: P) -> Self {
        Self::new(pin, ActiveLevel::Low)
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> KeyInput for PinInput<P> {
    fn is_active(&mut self) -> bool {
        match self.level {
            ActiveLevel::Low => self.pin.is_low().unwrap_or(false),
            ActiveLevel::High => self.pin.is_high().unwrap_or(false),
        }
    }
}

/// One registered key with its debounce state.
pub struct Key<I> {
    id: KeyId,
    input: I,
    /// Last raw level seen and when it was first seen.
    candidate: bool,
    candidate_since: Millis,
    pressed: bool,
}

impl<I: KeyInput> Key<I> {
    pub fn new(id: KeyId, input: I) -> Self {
        Self {
            id,
            input,
            candidate: false,
            candidate_since: 0,
            pressed: false,
        }
    }

    pub fn id(&self) -> KeyId {
        self.id
    }

    /// Confirmed (debounced) state.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Sample the raw input and update the confirmed state.
    ///
    /// Returns the confirmed state after this sample.
    pub fn sample(&mut self, now: Millis, debounce_ms: Millis) -> bool {
        let raw = self.input.is_active();
        if raw != self.candidate {
            self.candidate = raw;
            self.candidate_since = now;
        } else if elapsed(now, self.candidate_since) >= debounce_ms {
            self.pressed = raw;
        }
        self.pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;

    struct FakePin<'a> {
        high: &'a Cell<bool>,
    }

    impl embedded_hal::digital::ErrorType for FakePin<'_> {
        type Error = Infallible;
    }

    impl InputPin for FakePin<'_> {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.high.get())
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.high.get())
        }
    }

    #[test]
    fn active_low_pin_polarity() {
        let level = Cell::new(true);
        let mut input = PinInput::active_low(FakePin { high: &level });
        assert!(!input.is_active());
        level.set(false);
        assert!(input.is_active());
    }

    #[test]
    fn active_high_pin_polarity() {
        let level = Cell::new(true);
        let mut input = PinInput::new(FakePin { high: &level }, ActiveLevel::High);
        assert!(input.is_active());
    }

    #[test]
    fn stable_level_confirmed_after_debounce() {
        let raw = Cell::new(false);
        let mut key = Key::new(0, || raw.get());

        raw.set(true);
        assert!(!key.sample(0, 15));
        assert!(!key.sample(5, 15));
        assert!(!key.sample(10, 15));
        assert!(key.sample(15, 15));
        assert!(key.is_pressed());
    }

    #[test]
    fn bounce_restarts_settle_timer() {
        let raw = Cell::new(false);
        let mut key = Key::new(3, || raw.get());

        raw.set(true);
        key.sample(0, 15);
        raw.set(false);
        key.sample(5, 15);
        raw.set(true);
        key.sample(10, 15);
        // Only 14 ms since the last edge.
        assert!(!key.sample(24, 15));
        assert!(key.sample(25, 15));
    }

    #[test]
    fn release_also_debounced() {
        let raw = Cell::new(true);
        let mut key = Key::new(1, || raw.get());
        key.sample(0, 15);
        key.sample(20, 15);
        assert!(key.is_pressed());

        raw.set(false);
        key.sample(30, 15);
        assert!(key.is_pressed());
        key.sample(45, 15);
        assert!(!key.is_pressed());
    }
}
