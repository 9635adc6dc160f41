//! Compile-time configuration shared by the firmware binaries

use crate::bme280::{Filter, Oversampling, Settings, Standby};
use crate::glue::Address;

/// Serial line rate, 8N1
pub const BAUD_RATE: u32 = 57_600;

/// Largest accepted deviation between nominal and achieved baud rate
pub const BAUD_TOLERANCE_PERMILLE: u32 = 20;

/// The breakout straps SDO high, so the sensor answers on its secondary address
pub const SENSOR_ADDRESS: Address = Address::Secondary;

/// I2C bus clock
pub const I2C_FREQUENCY_HZ: u32 = 100_000;

/// Settings pushed once after a successful probe: 1x on every channel, no IIR filter.
pub const SENSOR_SETTINGS: Settings = Settings {
    osr_t: Oversampling::X1,
    osr_p: Oversampling::X1,
    osr_h: Oversampling::X1,
    filter: Filter::Off,
    standby: Standby::Ms0_5,
};

/// Extra wait added on top of the computed settling delay before every fetch.
///
/// Covers a gap observed on hardware between the computed settling delay and
/// the moment the sensor actually has data ready. Unresolved: either the
/// delay formula is off by one step or this is a sensor erratum. Do not drop
/// it without measuring.
pub const EXTRA_SETTLE_DELAY_US: u32 = 1_000;

/// Period of the `uart-hello` smoke test
pub const HELLO_PERIOD_MS: u32 = 1_000;
