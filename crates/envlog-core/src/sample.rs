use core::fmt::{self, Write};

use heapless::String;

/// Longest line a clamped, finite sample can produce is 34 bytes.
pub const LINE_CAPACITY: usize = 48;

/// One compensated measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    /// Degrees Celsius
    pub temperature: f64,
    /// Percent relative humidity
    pub humidity: f64,
    /// Pascal
    pub pressure: f64,
}

impl Sample {
    pub fn pressure_hpa(&self) -> f64 {
        self.pressure / 100.0
    }

    /// `temperature,humidity,pressure_hpa\n`, six decimals each.
    pub fn to_line(&self) -> Result<String<LINE_CAPACITY>, fmt::Error> {
        let mut line = String::new();
        write!(
            line,
            "{:.6},{:.6},{:.6}\n",
            self.temperature,
            self.humidity,
            self.pressure_hpa()
        )?;
        Ok(line)
    }
}
