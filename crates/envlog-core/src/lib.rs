//! Hardware-independent core of the LM401 BME280 serial logger
//!
//! Everything here is plain `no_std` logic over `embedded-hal` / `embedded-io`
//! traits, so it builds for the board and for the host test runner alike.
//! The board crate only has to hand in a blocking UART, a blocking I2C bus
//! and a delay provider.
//!
//! - [`serial`]: CR/LF console over a byte sink, baud divisor math
//! - [`glue`]: I2C implementation of the sensor's register bus contract
//! - [`bme280`]: BME280 driver (probe, settings, forced mode, compensation)
//! - [`sample`]: measurement sample and its CSV line
//! - [`station`]: one-time setup and the forever polling loop

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bme280;
pub mod config;
pub mod glue;
pub mod sample;
pub mod serial;
pub mod station;

pub use bme280::{Bme280, Bme280Bus, Settings};
pub use glue::{Address, GlueError, I2cGlue};
pub use sample::Sample;
pub use serial::{BaudSettings, Console};
pub use station::{ForcedSensor, Station, StatusCode};
