//! Factory trimming parameters and the floating-point compensation formulas

use crate::sample::Sample;

pub(crate) const TEMP_PRESS_CALIB_LEN: usize = 26;
pub(crate) const HUM_CALIB_LEN: usize = 7;
pub(crate) const DATA_LEN: usize = 8;

const TEMPERATURE_MIN: f64 = -40.0;
const TEMPERATURE_MAX: f64 = 85.0;
const PRESSURE_MIN: f64 = 30_000.0;
const PRESSURE_MAX: f64 = 110_000.0;
const HUMIDITY_MIN: f64 = 0.0;
const HUMIDITY_MAX: f64 = 100.0;

/// `dig_*` trimming values read from NVM during init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    t1: u16,
    t2: i16,
    t3: i16,
    p1: u16,
    p2: i16,
    p3: i16,
    p4: i16,
    p5: i16,
    p6: i16,
    p7: i16,
    p8: i16,
    p9: i16,
    h1: u8,
    h2: i16,
    h3: u8,
    h4: i16,
    h5: i16,
    h6: i8,
}

fn u16_le(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

fn i16_le(b: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([b[at], b[at + 1]])
}

impl Calibration {
    /// `tp` holds registers 0x88..=0xA1, `hum` holds 0xE1..=0xE7.
    pub fn parse(tp: &[u8; TEMP_PRESS_CALIB_LEN], hum: &[u8; HUM_CALIB_LEN]) -> Self {
        // H4 and H5 are 12-bit values sharing the nibbles of 0xE5
        let h4 = ((hum[3] as i8 as i16) * 16) | (hum[4] & 0x0F) as i16;
        let h5 = ((hum[5] as i8 as i16) * 16) | (hum[4] >> 4) as i16;

        Self {
            t1: u16_le(tp, 0),
            t2: i16_le(tp, 2),
            t3: i16_le(tp, 4),
            p1: u16_le(tp, 6),
            p2: i16_le(tp, 8),
            p3: i16_le(tp, 10),
            p4: i16_le(tp, 12),
            p5: i16_le(tp, 14),
            p6: i16_le(tp, 16),
            p7: i16_le(tp, 18),
            p8: i16_le(tp, 20),
            p9: i16_le(tp, 22),
            h1: tp[25],
            h2: i16_le(hum, 0),
            h3: hum[2],
            h4,
            h5,
            h6: hum[6] as i8,
        }
    }

    pub fn compensate(&self, raw: &RawData) -> Sample {
        let (temperature, t_fine) = self.temperature(raw.temperature);
        Sample {
            temperature,
            pressure: self.pressure(raw.pressure, t_fine),
            humidity: self.humidity(raw.humidity, t_fine),
        }
    }

    /// Returns degrees Celsius and the fine temperature the other channels
    /// are compensated against.
    fn temperature(&self, adc_t: u32) -> (f64, i32) {
        let adc_t = adc_t as f64;
        let t1 = self.t1 as f64;

        let var1 = (adc_t / 16384.0 - t1 / 1024.0) * self.t2 as f64;
        let var2 = adc_t / 131072.0 - t1 / 8192.0;
        let var2 = var2 * var2 * self.t3 as f64;
        let t_fine = (var1 + var2) as i32;

        let temperature = (var1 + var2) / 5120.0;
        (temperature.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX), t_fine)
    }

    /// Pascal
    fn pressure(&self, adc_p: u32, t_fine: i32) -> f64 {
        let mut var1 = t_fine as f64 / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * self.p6 as f64 / 32768.0;
        var2 += var1 * self.p5 as f64 * 2.0;
        var2 = var2 / 4.0 + self.p4 as f64 * 65536.0;
        let var3 = self.p3 as f64 * var1 * var1 / 524288.0;
        var1 = (var3 + self.p2 as f64 * var1) / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * self.p1 as f64;

        if var1 <= 0.0 {
            // p1 of zero means an unprogrammed part
            return PRESSURE_MIN;
        }

        let mut pressure = 1048576.0 - adc_p as f64;
        pressure = (pressure - var2 / 4096.0) * 6250.0 / var1;
        var1 = self.p9 as f64 * pressure * pressure / 2147483648.0;
        var2 = pressure * self.p8 as f64 / 32768.0;
        pressure += (var1 + var2 + self.p7 as f64) / 16.0;

        pressure.clamp(PRESSURE_MIN, PRESSURE_MAX)
    }

    /// Percent relative humidity
    fn humidity(&self, adc_h: u32, t_fine: i32) -> f64 {
        let var1 = t_fine as f64 - 76800.0;
        let var2 = self.h4 as f64 * 64.0 + self.h5 as f64 / 16384.0 * var1;
        let var3 = adc_h as f64 - var2;
        let var4 = self.h2 as f64 / 65536.0;
        let var5 = 1.0 + self.h3 as f64 / 67108864.0 * var1;
        let mut var6 = 1.0 + self.h6 as f64 / 67108864.0 * var1 * var5;
        var6 = var3 * var4 * (var5 * var6);

        let humidity = var6 * (1.0 - self.h1 as f64 * var6 / 524288.0);
        humidity.clamp(HUMIDITY_MIN, HUMIDITY_MAX)
    }
}

/// Uncompensated ADC values from one burst read of 0xF7..=0xFE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawData {
    pub pressure: u32,
    pub temperature: u32,
    pub humidity: u32,
}

impl RawData {
    pub fn parse(data: &[u8; DATA_LEN]) -> Self {
        let twenty_bit =
            |msb: u8, lsb: u8, xlsb: u8| ((msb as u32) << 12) | ((lsb as u32) << 4) | ((xlsb as u32) >> 4);

        Self {
            pressure: twenty_bit(data[0], data[1], data[2]),
            temperature: twenty_bit(data[3], data[4], data[5]),
            humidity: ((data[6] as u32) << 8) | data[7] as u32,
        }
    }
}
