//! Sensor setup and the polling loop
//!
//! ```text
//!   UNINITIALIZED --setup ok--> READY --arm--> ARMED --wait, fetch--> MEASURED
//!                                 ^                                      |
//!                                 +--------------------------------------+
//! ```
//!
//! A failed setup leaves the station UNINITIALIZED. The loop keeps running
//! anyway; the sensor refuses to arm and every pass prints a failure line.

use core::fmt;

use crate::bme280::{self, Bme280, Bme280Bus, Settings};
use crate::config::EXTRA_SETTLE_DELAY_US;
use crate::sample::Sample;

/// Integer status surfaced on the serial line when an operation fails.
pub trait StatusCode {
    fn code(&self) -> i8;
}

impl<E> StatusCode for bme280::Error<E> {
    fn code(&self) -> i8 {
        bme280::Error::code(self)
    }
}

/// A sensor that measures once per explicit trigger.
pub trait ForcedSensor {
    type Error: StatusCode;

    /// Probe the device and apply `settings`.
    fn setup(&mut self, settings: &Settings) -> Result<(), Self::Error>;

    /// Start one measurement.
    fn arm(&mut self) -> Result<(), Self::Error>;

    /// How long a measurement takes with the settings in effect.
    fn settling_delay_us(&self) -> u32;

    fn delay_us(&mut self, us: u32);

    /// Read back the finished measurement.
    fn fetch(&mut self) -> Result<Sample, Self::Error>;
}

impl<B: Bme280Bus> ForcedSensor for Bme280<B> {
    type Error = bme280::Error<B::Error>;

    fn setup(&mut self, settings: &Settings) -> Result<(), Self::Error> {
        self.init()?;
        self.set_sensor_settings(settings)
    }

    fn arm(&mut self) -> Result<(), Self::Error> {
        self.set_forced_mode()
    }

    fn settling_delay_us(&self) -> u32 {
        self.measurement_delay_us()
    }

    fn delay_us(&mut self, us: u32) {
        Bme280::delay_us(self, us);
    }

    fn fetch(&mut self) -> Result<Sample, Self::Error> {
        self.get_sensor_data()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Uninitialized,
    Ready,
}

/// What one pass of the loop did.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Measured(Sample),
    ArmFailed(i8),
    FetchFailed(i8),
}

/// Owns the sensor for the lifetime of the firmware.
pub struct Station<S> {
    sensor: S,
    state: State,
    settle_us: Option<u32>,
    extra_delay_us: u32,
}

impl<S: ForcedSensor> Station<S> {
    pub fn new(sensor: S) -> Self {
        Self {
            sensor,
            state: State::Uninitialized,
            settle_us: None,
            extra_delay_us: EXTRA_SETTLE_DELAY_US,
        }
    }

    /// Override [`EXTRA_SETTLE_DELAY_US`].
    pub fn with_extra_delay_us(mut self, us: u32) -> Self {
        self.extra_delay_us = us;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn release(self) -> S {
        self.sensor
    }

    /// One-time bring-up. A failure is written to `out` and is not fatal.
    pub fn setup<W: fmt::Write>(&mut self, settings: &Settings, out: &mut W) -> Result<State, fmt::Error> {
        self.settle_us = None;
        self.state = match self.sensor.setup(settings) {
            Ok(()) => State::Ready,
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::error!("bme280 init failed: {}", e.code());
                writeln!(out, "bme280 init failed: {}", e.code())?;
                State::Uninitialized
            }
        };
        Ok(self.state)
    }

    /// Arm, wait, fetch and print one sample.
    ///
    /// A failing arm or fetch is reported and ends the pass early. The only
    /// error returned is a failing `out`.
    pub fn poll_once<W: fmt::Write>(&mut self, out: &mut W) -> Result<Outcome, fmt::Error> {
        if let Err(e) = self.sensor.arm() {
            #[cfg(feature = "defmt")]
            defmt::warn!("bme280 arm failed: {}", e.code());
            writeln!(out, "bme280 arm failed: {}", e.code())?;
            return Ok(Outcome::ArmFailed(e.code()));
        }

        let settle_us = match self.settle_us {
            Some(us) => us,
            None => {
                let us = self.sensor.settling_delay_us();
                self.settle_us = Some(us);
                us
            }
        };
        self.sensor.delay_us(settle_us + self.extra_delay_us);

        let sample = match self.sensor.fetch() {
            Ok(sample) => sample,
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("bme280 fetch failed: {}", e.code());
                writeln!(out, "bme280 fetch failed: {}", e.code())?;
                return Ok(Outcome::FetchFailed(e.code()));
            }
        };

        out.write_str(&sample.to_line()?)?;
        Ok(Outcome::Measured(sample))
    }

    /// Poll forever. Nothing, not even a dead serial line, stops the loop.
    pub fn run<W: fmt::Write>(&mut self, out: &mut W) -> ! {
        loop {
            match self.poll_once(out) {
                #[cfg(feature = "defmt")]
                Ok(Outcome::Measured(sample)) => defmt::trace!("{}", sample),
                #[cfg(feature = "defmt")]
                Err(_) => defmt::warn!("serial output failed"),
                _ => {}
            }
        }
    }
}
