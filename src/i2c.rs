//! I2C2 master on PA12 (SCL) / PA11 (SDA)

use defmt::info;
use embassy_stm32::i2c::{Config, Error, I2c};
use embassy_stm32::peripherals::{I2C2, PA11, PA12};
use embassy_stm32::time::Hertz;
use envlog_core::config::I2C_FREQUENCY_HZ;

/// Standard mode, 7-bit addressing, blocking transfers.
pub fn init(i2c: I2C2, scl: PA12, sda: PA11) -> impl embedded_hal::i2c::I2c<Error = Error> {
    info!("I2C2 at {} Hz", I2C_FREQUENCY_HZ);
    I2c::new_blocking(i2c, scl, sda, Hertz(I2C_FREQUENCY_HZ), Config::default())
}
