//! Lamp light model.
//!
//! Two user-facing axes, both `0..=LIGHT_MAX`:
//! ```text
//! brightness   0 = off            1000 = full output
//! color_temp   0 = warm only      1000 = cold only
//! ```
//! mixed linearly into one duty value per LED string.

use crate::config::LIGHT_MAX;

/// Axis the encoder and proximity dimming currently act on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Focus {
    #[default]
    Brightness,
    ColorTemp,
}

impl Focus {
    pub const fn toggled(self) -> Self {
        match self {
            Focus::Brightness => Focus::ColorTemp,
            Focus::ColorTemp => Focus::Brightness,
        }
    }
}

/// PWM duty of the warm and cold LED strings, each `0..=LIGHT_MAX`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyPair {
    pub warm: u16,
    pub cold: u16,
}

impl DutyPair {
    pub const OFF: Self = Self { warm: 0, cold: 0 };

    pub const fn new(warm: u16, cold: u16) -> Self {
        Self { warm, cold }
    }
}

impl From<(u16, u16)> for DutyPair {
    fn from((warm, cold): (u16, u16)) -> Self {
        Self { warm, cold }
    }
}

/// Whatever drives the LED strings.
pub trait DutySink {
    fn apply_duty_pair(&mut self, pair: DutyPair);
}

impl<S: DutySink + ?Sized> DutySink for &mut S {
    fn apply_duty_pair(&mut self, pair: DutyPair) {
        (**self).apply_duty_pair(pair)
    }
}

/// Current brightness, color temperature and focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightState {
    brightness: u16,
    color_temp: u16,
    focus: Focus,
}

impl Default for LightState {
    fn default() -> Self {
        Self::new(LIGHT_MAX / 2, LIGHT_MAX / 2)
    }
}

impl LightState {
    pub const fn new(brightness: u16, color_temp: u16) -> Self {
        Self {
            brightness: clamp(brightness as i32),
            color_temp: clamp(color_temp as i32),
            focus: Focus::Brightness,
        }
    }

    pub fn brightness(&self) -> u16 {
        self.brightness
    }

    pub fn color_temp(&self) -> u16 {
        self.color_temp
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
    }

    pub fn toggle_focus(&mut self) -> Focus {
        self.focus = self.focus.toggled();
        self.focus
    }

    pub fn adjust_brightness(&mut self, delta: i16) {
        self.brightness = clamp(self.brightness as i32 + delta as i32);
    }

    pub fn adjust_color_temp(&mut self, delta: i16) {
        self.color_temp = clamp(self.color_temp as i32 + delta as i32);
    }

    /// Adjust whichever axis has focus.
    pub fn adjust_focused(&mut self, delta: i16) {
        match self.focus {
            Focus::Brightness => self.adjust_brightness(delta),
            Focus::ColorTemp => self.adjust_color_temp(delta),
        }
    }

    /// Set the focused axis to an absolute value.
    pub fn apply_target(&mut self, target: u16) {
        let target = clamp(target as i32);
        match self.focus {
            Focus::Brightness => self.brightness = target,
            Focus::ColorTemp => self.color_temp = target,
        }
    }

    /// Linear warm/cold mix of the current state.
    pub fn duty_pair(&self) -> DutyPair {
        let bri = self.brightness as u32;
        let cct = self.color_temp as u32;
        let max = LIGHT_MAX as u32;
        DutyPair {
            warm: ((max - cct) * bri / max) as u16,
            cold: (cct * bri / max) as u16,
        }
    }

    /// Recover brightness and color temperature from a raw duty pair.
    ///
    /// Color temperature is kept when both channels are zero.
    pub fn set_from_duty(&mut self, pair: DutyPair) {
        let warm = pair.warm.min(LIGHT_MAX) as u32;
        let cold = pair.cold.min(LIGHT_MAX) as u32;
        let total = (warm + cold).min(LIGHT_MAX as u32);

        self.brightness = total as u16;
        if total > 0 {
            self.color_temp = (cold * LIGHT_MAX as u32 / total) as u16;
        }
    }

    pub fn from_duty_pair(pair: DutyPair) -> Self {
        let mut state = Self::default();
        state.set_from_duty(pair);
        state
    }
}

const fn clamp(value: i32) -> u16 {
    if value < 0 {
        0
    } else if value > LIGHT_MAX as i32 {
        LIGHT_MAX
    } else {
        value as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_clamps_both_ends() {
        let mut light = LightState::new(900, 100);
        light.adjust_brightness(200);
        light.adjust_color_temp(-200);
        assert_eq!(light.brightness(), 1000);
        assert_eq!(light.color_temp(), 0);
        light.adjust_brightness(-1200);
        assert_eq!(light.brightness(), 0);
    }

    #[test]
    fn focus_routes_target_and_delta() {
        let mut light = LightState::new(500, 500);
        light.apply_target(300);
        assert_eq!(light.brightness(), 300);

        assert_eq!(light.toggle_focus(), Focus::ColorTemp);
        light.apply_target(1500);
        light.adjust_focused(-100);
        assert_eq!(light.color_temp(), 900);
        assert_eq!(light.brightness(), 300);
    }

    #[test]
    fn duty_mixing() {
        assert_eq!(LightState::new(1000, 0).duty_pair(), DutyPair::new(1000, 0));
        assert_eq!(LightState::new(1000, 1000).duty_pair(), DutyPair::new(0, 1000));
        assert_eq!(LightState::new(500, 500).duty_pair(), DutyPair::new(250, 250));
        assert_eq!(LightState::new(0, 700).duty_pair(), DutyPair::OFF);
        assert_eq!(LightState::new(600, 250).duty_pair(), DutyPair::new(450, 150));
    }

    #[test]
    fn duty_pair_inverse() {
        let light = LightState::from_duty_pair(DutyPair::new(250, 250));
        assert_eq!((light.brightness(), light.color_temp()), (500, 500));

        let light = LightState::from_duty_pair(DutyPair::new(300, 100));
        assert_eq!((light.brightness(), light.color_temp()), (400, 250));

        // Over-range sums saturate brightness; color temp follows the cold share.
        let light = LightState::from_duty_pair(DutyPair::new(900, 600));
        assert_eq!((light.brightness(), light.color_temp()), (1000, 600));
    }

    #[test]
    fn off_keeps_color_temp() {
        let mut light = LightState::new(800, 700);
        light.set_from_duty(DutyPair::OFF);
        assert_eq!(light.brightness(), 0);
        assert_eq!(light.color_temp(), 700);
    }
}
