//! Measurement settings and the register fields they encode to

/// Per-channel oversampling. `Skipped` disables the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Oversampling {
    Skipped = 0b000,
    X1 = 0b001,
    X2 = 0b010,
    X4 = 0b011,
    X8 = 0b100,
    X16 = 0b101,
}

impl Oversampling {
    /// Number of conversions averaged per measurement
    pub const fn factor(self) -> u32 {
        match self {
            Self::Skipped => 0,
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
            Self::X16 => 16,
        }
    }
}

/// IIR filter coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Filter {
    Off = 0b000,
    X2 = 0b001,
    X4 = 0b010,
    X8 = 0b011,
    X16 = 0b100,
}

/// Inactive time between conversions in normal mode. Unused in forced mode
/// but still written to the config register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Standby {
    Ms0_5 = 0b000,
    Ms62_5 = 0b001,
    Ms125 = 0b010,
    Ms250 = 0b011,
    Ms500 = 0b100,
    Ms1000 = 0b101,
    Ms10 = 0b110,
    Ms20 = 0b111,
}

/// Power mode, bits [1:0] of ctrl_meas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Sleep,
    Forced,
    Normal,
}

impl Mode {
    pub(crate) const fn bits(self) -> u8 {
        match self {
            Self::Sleep => 0b00,
            Self::Forced => 0b01,
            Self::Normal => 0b11,
        }
    }

    pub(crate) const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Sleep,
            0b11 => Self::Normal,
            _ => Self::Forced,
        }
    }
}

// Measurement time model from the datasheet (appendix B), in microseconds
const MEAS_OFFSET_US: u32 = 1250;
const MEAS_DURATION_US: u32 = 2300;
const PRES_HUM_MEAS_OFFSET_US: u32 = 575;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub osr_t: Oversampling,
    pub osr_p: Oversampling,
    pub osr_h: Oversampling,
    pub filter: Filter,
    pub standby: Standby,
}

impl Settings {
    /// Register state after power-on or soft reset
    pub const POWER_ON: Self = Self {
        osr_t: Oversampling::Skipped,
        osr_p: Oversampling::Skipped,
        osr_h: Oversampling::Skipped,
        filter: Filter::Off,
        standby: Standby::Ms0_5,
    };

    /// Worst-case time from arming forced mode until all enabled channels
    /// have been converted.
    pub const fn measurement_delay_us(&self) -> u32 {
        MEAS_OFFSET_US
            + MEAS_DURATION_US * self.osr_t.factor()
            + (MEAS_DURATION_US * self.osr_p.factor() + PRES_HUM_MEAS_OFFSET_US)
            + (MEAS_DURATION_US * self.osr_h.factor() + PRES_HUM_MEAS_OFFSET_US)
    }

    pub(crate) const fn ctrl_hum(&self) -> u8 {
        self.osr_h as u8
    }

    pub(crate) const fn ctrl_meas(&self, mode: Mode) -> u8 {
        ((self.osr_t as u8) << 5) | ((self.osr_p as u8) << 2) | mode.bits()
    }

    pub(crate) const fn config(&self) -> u8 {
        ((self.standby as u8) << 5) | ((self.filter as u8) << 2)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::POWER_ON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: Settings = Settings {
        osr_t: Oversampling::X1,
        osr_p: Oversampling::X1,
        osr_h: Oversampling::X1,
        filter: Filter::Off,
        standby: Standby::Ms0_5,
    };

    #[test]
    fn single_oversampling_delay() {
        assert_eq!(SINGLE.measurement_delay_us(), 9300);
    }

    #[test]
    fn delay_grows_with_oversampling() {
        let max = Settings {
            osr_t: Oversampling::X16,
            osr_p: Oversampling::X16,
            osr_h: Oversampling::X16,
            ..SINGLE
        };
        assert_eq!(max.measurement_delay_us(), 112_800);
        assert_eq!(Settings::POWER_ON.measurement_delay_us(), 2400);
    }

    #[test]
    fn register_encoding() {
        assert_eq!(SINGLE.ctrl_hum(), 0x01);
        assert_eq!(SINGLE.ctrl_meas(Mode::Sleep), 0x24);
        assert_eq!(SINGLE.ctrl_meas(Mode::Forced), 0x25);
        assert_eq!(SINGLE.config(), 0x00);

        let filtered = Settings {
            osr_t: Oversampling::X2,
            osr_p: Oversampling::X16,
            filter: Filter::X16,
            standby: Standby::Ms1000,
            ..SINGLE
        };
        assert_eq!(filtered.ctrl_meas(Mode::Normal), 0b010_101_11);
        assert_eq!(filtered.config(), 0b101_100_00);
    }

    #[test]
    fn mode_bits_round_trip() {
        for mode in [Mode::Sleep, Mode::Forced, Mode::Normal] {
            assert_eq!(Mode::from_bits(mode.bits()), mode);
        }
        assert_eq!(Mode::from_bits(0b10), Mode::Forced);
    }
}
