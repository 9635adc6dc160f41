//! I2C side of the sensor's platform contract
//!
//! [`I2cGlue`] is the device context: it owns the bus, the delay provider and
//! the 7-bit address, and turns register accesses into I2C transfers. The HAL
//! puts `address << 1 | R/W` on the wire.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{I2c, SevenBitAddress};
use heapless::Vec;

use crate::bme280::Bme280Bus;

/// Longest payload a single register write may carry.
pub const MAX_WRITE_LEN: usize = 8;

/// BME280 I2C address, selected by the level on SDO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    /// SDO to GND
    Primary,
    /// SDO to VDDIO
    Secondary,
}

impl Address {
    pub const fn addr(self) -> SevenBitAddress {
        match self {
            Self::Primary => 0x76,
            Self::Secondary => 0x77,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GlueError<E> {
    I2c(E),
    /// Payload longer than [`MAX_WRITE_LEN`]
    PayloadTooLong,
}

impl<E> fmt::Display for GlueError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2c(_) => write!(f, "I2C transfer failed"),
            Self::PayloadTooLong => write!(f, "payload too long"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for GlueError<E> {}

pub struct I2cGlue<I2C, D> {
    i2c: I2C,
    delay: D,
    address: SevenBitAddress,
}

impl<I2C: I2c, D: DelayNs> I2cGlue<I2C, D> {
    pub fn new(i2c: I2C, delay: D, address: Address) -> Self {
        Self {
            i2c,
            delay,
            address: address.addr(),
        }
    }

    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

// Only plain `write` and `read` are used: the blocking STM32 I2C v2 master
// does not implement `transaction`.
impl<I2C: I2c, D: DelayNs> Bme280Bus for I2cGlue<I2C, D> {
    type Error = GlueError<I2C::Error>;

    /// Set the register pointer in one transfer, then read in a second one.
    /// The read ACKs every byte but the last.
    fn read(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[register]).map_err(GlueError::I2c)?;
        self.i2c.read(self.address, buffer).map_err(GlueError::I2c)
    }

    /// Register address and payload go out as one contiguous frame.
    fn write(&mut self, register: u8, payload: &[u8]) -> Result<(), Self::Error> {
        let mut frame: Vec<u8, { MAX_WRITE_LEN + 1 }> = Vec::new();
        frame.push(register).map_err(|_| GlueError::PayloadTooLong)?;
        frame
            .extend_from_slice(payload)
            .map_err(|_| GlueError::PayloadTooLong)?;
        self.i2c.write(self.address, &frame).map_err(GlueError::I2c)
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}
