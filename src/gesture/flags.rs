//! Gesture flag registers and the arbitration rules between them.
//!
//! Layout (PAJ7620 bank 0):
//! ```text
//! Flag1 (0x43): bit 0 = Up,      bit 1 = Down,     bit 2 = Left,       bit 3 = Right
//!               bit 4 = Forward, bit 5 = Backward, bit 6 = Clockwise,  bit 7 = Counter-CW
//! Flag2 (0x44): bit 0 = Wave
//! ```
//!
//! The sensor may latch several bits in one read. Priority, highest
//! first: push/pull > rotation > swipe.

/// Contents of the first gesture flag register.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GestureFlags(pub u8);

impl GestureFlags {
    pub const NONE: Self = Self(0);
    pub const UP: Self = Self(0x01);
    pub const DOWN: Self = Self(0x02);
    pub const LEFT: Self = Self(0x04);
    pub const RIGHT: Self = Self(0x08);
    pub const FORWARD: Self = Self(0x10);
    pub const BACKWARD: Self = Self(0x20);
    pub const CLOCKWISE: Self = Self(0x40);
    pub const COUNTER_CLOCKWISE: Self = Self(0x80);

    const PUSH_PULL: u8 = Self::FORWARD.0 | Self::BACKWARD.0;
    const ROTATION: u8 = Self::CLOCKWISE.0 | Self::COUNTER_CLOCKWISE.0;
    const SWIPE: u8 = Self::UP.0 | Self::DOWN.0 | Self::LEFT.0 | Self::RIGHT.0;

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Clear every bit outranked by a higher-priority bit that is set.
    pub const fn arbitrate(self) -> Self {
        if self.0 & Self::PUSH_PULL != 0 {
            Self(self.0 & !(Self::ROTATION | Self::SWIPE))
        } else if self.0 & Self::ROTATION != 0 {
            Self(self.0 & !Self::SWIPE)
        } else {
            self
        }
    }

    /// `self` is the return swing of `previous`.
    ///
    /// Only exact single-gesture readings are compared. Backward after
    /// Forward counts, Forward after Backward does not: pulling the hand
    /// away after a push is the common false trigger.
    pub const fn reverses(self, previous: Self) -> bool {
        matches!(
            (self.0, previous.0),
            (0x08, 0x04) | (0x04, 0x08) | (0x01, 0x02) | (0x02, 0x01) | (0x20, 0x10)
        )
    }
}

impl core::ops::BitOr for GestureFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Contents of the second gesture flag register.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GestureFlags2(pub u8);

impl GestureFlags2 {
    pub const NONE: Self = Self(0);
    pub const WAVE: Self = Self(0x01);

    pub const fn has_wave(self) -> bool {
        self.0 & Self::WAVE.0 != 0
    }
}

/// A single recognised gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gesture {
    Up,
    Down,
    Left,
    Right,
    /// Hand pushed towards the sensor.
    Forward,
    /// Hand pulled away.
    Backward,
    Clockwise,
    CounterClockwise,
    Wave,
}

impl Gesture {
    /// Pick the one gesture to dispatch from already arbitrated flags,
    /// in descending priority.
    pub fn select(flags: GestureFlags, flags2: GestureFlags2) -> Option<Self> {
        const ORDER: [(GestureFlags, Gesture); 8] = [
            (GestureFlags::FORWARD, Gesture::Forward),
            (GestureFlags::BACKWARD, Gesture::Backward),
            (GestureFlags::CLOCKWISE, Gesture::Clockwise),
            (GestureFlags::COUNTER_CLOCKWISE, Gesture::CounterClockwise),
            (GestureFlags::UP, Gesture::Up),
            (GestureFlags::DOWN, Gesture::Down),
            (GestureFlags::LEFT, Gesture::Left),
            (GestureFlags::RIGHT, Gesture::Right),
        ];

        ORDER
            .iter()
            .find(|(bit, _)| flags.contains(*bit))
            .map(|(_, gesture)| *gesture)
            .or_else(|| flags2.has_wave().then_some(Gesture::Wave))
    }
}
