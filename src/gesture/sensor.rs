//! Gesture snapshot source.
//!
//! The engine only needs one point-in-time record per poll. [`Paj7620`]
//! produces it from a PAJ7620U2 over any `embedded-hal` I²C bus; tests
//! and other sensors plug in through [`GestureSource`].

use embedded_hal::i2c::I2c;

use super::flags::{GestureFlags, GestureFlags2};
use crate::config::{GESTURE_I2C_ADDR, GESTURE_PART_ID};
use crate::error::Error;

/// One poll of the gesture sensor.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GestureSnapshot {
    pub flags: GestureFlags,
    pub flags2: GestureFlags2,
    /// Reflected IR brightness of the object, 0..=255. Grows as the hand nears.
    pub object_brightness: u8,
    pub object_size: u16,
    pub velocity_x: i16,
    pub velocity_y: i16,
    /// `false` when the read failed; every other field is then zero.
    pub connected: bool,
}

impl GestureSnapshot {
    pub const fn disconnected() -> Self {
        Self {
            flags: GestureFlags::NONE,
            flags2: GestureFlags2::NONE,
            object_brightness: 0,
            object_size: 0,
            velocity_x: 0,
            velocity_y: 0,
            connected: false,
        }
    }

    /// Connected snapshot carrying only flags and brightness.
    pub const fn new(flags: GestureFlags, object_brightness: u8) -> Self {
        Self {
            flags,
            flags2: GestureFlags2::NONE,
            object_brightness,
            object_size: 0,
            velocity_x: 0,
            velocity_y: 0,
            connected: true,
        }
    }
}

/// Anything that yields gesture snapshots.
pub trait GestureSource {
    /// Read one snapshot. Must not block beyond the bus's own bounded retry.
    fn read_snapshot(&mut self) -> GestureSnapshot;
}

impl<F: FnMut() -> GestureSnapshot> GestureSource for F {
    fn read_snapshot(&mut self) -> GestureSnapshot {
        self()
    }
}

// Register map (bank 0)

const REG_BANK_SELECT: u8 = 0xEF;
const REG_PART_ID: u8 = 0x00;
const REG_INT_FLAG1: u8 = 0x43;
const REG_INT_FLAG2: u8 = 0x44;
const REG_OBJ_BRIGHTNESS: u8 = 0xB0;
const REG_OBJ_SIZE_L: u8 = 0xB1;
const REG_OBJ_SIZE_H: u8 = 0xB2;
const REG_VEL_X_L: u8 = 0xC3;
const REG_VEL_Y_L: u8 = 0xC5;

/// Vendor power-on register sequence for gesture mode.
const INIT_SEQUENCE: [(u8, u8); 70] = [
    (0xEF, 0x00), (0x41, 0xFF), (0x42, 0x01), (0x46, 0x2D), (0x47, 0x0F),
    (0x48, 0x80), (0x49, 0x00), (0x4A, 0x40), (0x4B, 0x00), (0x4C, 0x20),
    (0x4D, 0x00), (0x51, 0x10), (0x5C, 0x02), (0x5E, 0x10), (0x80, 0x41),
    (0x81, 0x44), (0x82, 0x0C), (0x83, 0x20), (0x84, 0x20), (0x85, 0x00),
    (0x86, 0x10), (0x87, 0x00), (0x8B, 0x01), (0x8D, 0x00), (0x90, 0x0C),
    (0x91, 0x0C), (0x93, 0x0D), (0x94, 0x0A), (0x95, 0x0A), (0x96, 0x0C),
    (0x97, 0x05), (0x9A, 0x14), (0x9C, 0x3F), (0x9F, 0xF9), (0xA0, 0x48),
    (0xA5, 0x19), (0xCC, 0x19), (0xCD, 0x0B), (0xCE, 0x13), (0xCF, 0x62),
    (0xD0, 0x21), (0xEF, 0x01), (0x00, 0x1E), (0x01, 0x1E), (0x02, 0x0F),
    (0x03, 0x0F), (0x04, 0x02), (0x25, 0x01), (0x26, 0x00), (0x27, 0x39),
    (0x28, 0x7F), (0x29, 0x08), (0x30, 0x03), (0x3E, 0xFF), (0x5E, 0x3D),
    (0x65, 0xAC), (0x66, 0x00), (0x67, 0x97), (0x68, 0x01), (0x69, 0xCD),
    (0x6A, 0x01), (0x6B, 0xB0), (0x6C, 0x04), (0x6D, 0x2C), (0x6E, 0x01),
    (0x72, 0x01), (0x73, 0x35), (0x74, 0x00), (0x77, 0x01), (0xEF, 0x00),
];

/// PAJ7620U2 gesture sensor on an I²C bus.
pub struct Paj7620<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Paj7620<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: GESTURE_I2C_ADDR,
        }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Check the part id and load the gesture-mode register set.
    ///
    /// The first access only wakes the chip and is allowed to fail.
    pub fn init(&mut self) -> Result<(), Error> {
        let _ = self.read_reg(REG_PART_ID);

        let part_id = self.read_reg(REG_PART_ID)?;
        if part_id != GESTURE_PART_ID {
            error!("PAJ7620: unexpected part id {=u8:#x}", part_id);
            return Err(Error::SensorNotFound { part_id });
        }

        for (reg, value) in INIT_SEQUENCE {
            self.write_reg(reg, value)?;
        }
        self.write_reg(REG_BANK_SELECT, 0x00)?;

        info!("PAJ7620 ready");
        Ok(())
    }

    /// Read every register the engine needs in one go.
    pub fn read_all(&mut self) -> Result<GestureSnapshot, Error> {
        self.write_reg(REG_BANK_SELECT, 0x00)?;

        let flags = GestureFlags(self.read_reg(REG_INT_FLAG1)?);
        let flags2 = GestureFlags2(self.read_reg(REG_INT_FLAG2)?);
        let object_brightness = self.read_reg(REG_OBJ_BRIGHTNESS)?;
        let size_l = self.read_reg(REG_OBJ_SIZE_L)?;
        let size_h = self.read_reg(REG_OBJ_SIZE_H)?;
        // Only the low velocity byte is meaningful at this resolution.
        let vx = self.read_reg(REG_VEL_X_L)? as i8;
        let vy = self.read_reg(REG_VEL_Y_L)? as i8;

        Ok(GestureSnapshot {
            flags,
            flags2,
            object_brightness,
            object_size: u16::from_le_bytes([size_l, size_h]),
            velocity_x: vx as i16,
            velocity_y: vy as i16,
            connected: true,
        })
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|_| Error::Bus)?;
        Ok(buf[0])
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|_| Error::Bus)
    }
}

impl<I2C: I2c> GestureSource for Paj7620<I2C> {
    fn read_snapshot(&mut self) -> GestureSnapshot {
        self.read_all().unwrap_or(GestureSnapshot::disconnected())
    }
}
