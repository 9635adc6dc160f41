//! BME280 combined humidity / pressure / temperature sensor
//!
//! The driver never touches a peripheral directly. All traffic goes through a
//! [`Bme280Bus`], which is the platform contract a board has to provide:
//! register read, register write and a microsecond busy-wait. See
//! [`crate::glue::I2cGlue`] for the I2C implementation.
//!
//! Only forced mode is driven here: the sensor sleeps until [`Bme280::set_forced_mode`]
//! triggers a single conversion of every enabled channel, after which it goes
//! back to sleep on its own.

mod calibration;
mod settings;

use core::fmt;

pub use calibration::{Calibration, RawData};
pub use settings::{Filter, Mode, Oversampling, Settings, Standby};

use crate::sample::Sample;
use calibration::{DATA_LEN, HUM_CALIB_LEN, TEMP_PRESS_CALIB_LEN};

/// Value of the id register on a BME280 (a BMP280 reads 0x58)
pub const CHIP_ID: u8 = 0x60;

const REG_CHIP_ID: u8 = 0xD0;
const REG_RESET: u8 = 0xE0;
const REG_TEMP_PRESS_CALIB: u8 = 0x88;
const REG_HUM_CALIB: u8 = 0xE1;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_STATUS: u8 = 0xF3;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_DATA: u8 = 0xF7;

const SOFT_RESET_COMMAND: u8 = 0xB6;
const STATUS_IM_UPDATE: u8 = 0x01;

const PROBE_ATTEMPTS: u8 = 5;
const PROBE_RETRY_DELAY_US: u32 = 1_000;
const STARTUP_DELAY_US: u32 = 2_000;
const NVM_COPY_ATTEMPTS: u8 = 5;

/// Platform contract the driver talks through.
pub trait Bme280Bus {
    type Error;

    /// Read `buffer.len()` consecutive registers starting at `register`.
    fn read(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `payload` to consecutive registers starting at `register`.
    fn write(&mut self, register: u8, payload: &[u8]) -> Result<(), Self::Error>;

    fn delay_us(&mut self, us: u32);
}

/// Driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// `init` has not succeeded yet
    NotInitialized,
    /// No BME280 answered with the expected chip id
    DeviceNotFound,
    /// Zero-length register access
    InvalidLength,
    /// Bus transfer failed
    Bus(E),
    /// Trimming data was still being copied from NVM after reset
    NvmCopyFailed,
}

impl<E> Error<E> {
    /// Numeric status code as printed on the serial line
    pub const fn code(&self) -> i8 {
        match self {
            Self::NotInitialized => -1,
            Self::DeviceNotFound => -2,
            Self::InvalidLength => -3,
            Self::Bus(_) => -4,
            Self::NvmCopyFailed => -6,
        }
    }
}

impl<E> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "device not initialized"),
            Self::DeviceNotFound => write!(f, "device not found"),
            Self::InvalidLength => write!(f, "invalid length"),
            Self::Bus(_) => write!(f, "communication failure"),
            Self::NvmCopyFailed => write!(f, "NVM copy failed"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}

pub struct Bme280<B> {
    bus: B,
    calibration: Option<Calibration>,
    settings: Settings,
}

impl<B: Bme280Bus> Bme280<B> {
    /// Bind the bus. No traffic happens until [`Bme280::init`].
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            calibration: None,
            settings: Settings::POWER_ON,
        }
    }

    /// Probe the chip id, soft-reset the device and load its trimming data.
    ///
    /// On failure the driver stays uninitialized and every later arm or
    /// fetch fails with [`Error::NotInitialized`].
    pub fn init(&mut self) -> Result<(), Error<B::Error>> {
        self.calibration = None;
        self.probe()?;
        self.soft_reset()?;

        let mut tp = [0u8; TEMP_PRESS_CALIB_LEN];
        let mut hum = [0u8; HUM_CALIB_LEN];
        self.read_regs(REG_TEMP_PRESS_CALIB, &mut tp)?;
        self.read_regs(REG_HUM_CALIB, &mut hum)?;

        self.calibration = Some(Calibration::parse(&tp, &hum));
        self.settings = Settings::POWER_ON;
        Ok(())
    }

    fn probe(&mut self) -> Result<(), Error<B::Error>> {
        for attempt in 0..PROBE_ATTEMPTS {
            if attempt > 0 {
                self.bus.delay_us(PROBE_RETRY_DELAY_US);
            }
            let mut id = [0u8; 1];
            match self.read_regs(REG_CHIP_ID, &mut id) {
                Ok(()) if id[0] == CHIP_ID => return Ok(()),
                #[cfg(feature = "defmt")]
                Ok(()) => defmt::debug!("bme280: unexpected chip id {=u8:#x}", id[0]),
                _ => {}
            }
        }
        Err(Error::DeviceNotFound)
    }

    /// Power-on reset, then wait for the trimming data to be copied.
    pub fn soft_reset(&mut self) -> Result<(), Error<B::Error>> {
        self.write_reg(REG_RESET, SOFT_RESET_COMMAND)?;

        for _ in 0..NVM_COPY_ATTEMPTS {
            self.bus.delay_us(STARTUP_DELAY_US);
            let mut status = [0u8; 1];
            self.read_regs(REG_STATUS, &mut status)?;
            if status[0] & STATUS_IM_UPDATE == 0 {
                return Ok(());
            }
        }
        Err(Error::NvmCopyFailed)
    }

    /// Push oversampling, filter and standby settings.
    ///
    /// The device is put to sleep first since config writes are ignored in
    /// normal mode. ctrl_hum only takes effect after the following ctrl_meas
    /// write, so that one goes last.
    ///
    /// A failed push leaves the device half configured, so the driver drops
    /// back to uninitialized and needs a fresh [`Bme280::init`].
    pub fn set_sensor_settings(&mut self, settings: &Settings) -> Result<(), Error<B::Error>> {
        if let Err(e) = self.write_settings(settings) {
            self.calibration = None;
            return Err(e);
        }
        self.settings = *settings;
        Ok(())
    }

    fn write_settings(&mut self, settings: &Settings) -> Result<(), Error<B::Error>> {
        let sleeping = self.settings.ctrl_meas(Mode::Sleep);
        self.write_reg(REG_CTRL_MEAS, sleeping)?;

        self.write_reg(REG_CTRL_HUM, settings.ctrl_hum())?;
        self.write_reg(REG_CONFIG, settings.config())?;
        self.write_reg(REG_CTRL_MEAS, settings.ctrl_meas(Mode::Sleep))
    }

    /// Trigger one conversion with the current settings.
    pub fn set_forced_mode(&mut self) -> Result<(), Error<B::Error>> {
        if self.calibration.is_none() {
            return Err(Error::NotInitialized);
        }
        let forced = self.settings.ctrl_meas(Mode::Forced);
        self.write_reg(REG_CTRL_MEAS, forced)
    }

    pub fn mode(&mut self) -> Result<Mode, Error<B::Error>> {
        let mut ctrl_meas = [0u8; 1];
        self.read_regs(REG_CTRL_MEAS, &mut ctrl_meas)?;
        Ok(Mode::from_bits(ctrl_meas[0]))
    }

    /// Read the last conversion and compensate it.
    pub fn get_sensor_data(&mut self) -> Result<Sample, Error<B::Error>> {
        let calibration = self.calibration.ok_or(Error::NotInitialized)?;

        let mut data = [0u8; DATA_LEN];
        self.read_regs(REG_DATA, &mut data)?;

        Ok(calibration.compensate(&RawData::parse(&data)))
    }

    /// Settling delay for the settings currently applied.
    pub fn measurement_delay_us(&self) -> u32 {
        self.settings.measurement_delay_us()
    }

    pub fn delay_us(&mut self, us: u32) {
        self.bus.delay_us(us);
    }

    pub fn is_initialized(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    pub fn release(self) -> B {
        self.bus
    }

    fn read_regs(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Error<B::Error>> {
        if buffer.is_empty() {
            return Err(Error::InvalidLength);
        }
        self.bus.read(register, buffer).map_err(Error::Bus)
    }

    fn write_reg(&mut self, register: u8, value: u8) -> Result<(), Error<B::Error>> {
        self.bus.write(register, &[value]).map_err(Error::Bus)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::calibration::tests::{DATASHEET_DATA, DATASHEET_TP, SAMPLE_HUM};
    use super::*;

    /// Register-file model of the sensor.
    pub(crate) struct Simulated {
        pub regs: [u8; 256],
        pub writes: Vec<(u8, Vec<u8>)>,
        pub reads: Vec<u8>,
        pub delays: Vec<u32>,
        /// Status reads that still report an NVM copy in progress
        pub nvm_busy_reads: usize,
        pub offline: bool,
        /// Register whose writes are NACKed
        pub reject_writes_to: Option<u8>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Nack;

    impl Simulated {
        pub fn new() -> Self {
            let mut regs = [0u8; 256];
            regs[REG_CHIP_ID as usize] = CHIP_ID;
            regs[0x88..0x88 + TEMP_PRESS_CALIB_LEN].copy_from_slice(&DATASHEET_TP);
            regs[0xE1..0xE1 + HUM_CALIB_LEN].copy_from_slice(&SAMPLE_HUM);
            regs[0xF7..0xF7 + DATA_LEN].copy_from_slice(&DATASHEET_DATA);
            Self {
                regs,
                writes: Vec::new(),
                reads: Vec::new(),
                delays: Vec::new(),
                nvm_busy_reads: 0,
                offline: false,
                reject_writes_to: None,
            }
        }

        pub fn offline() -> Self {
            Self {
                offline: true,
                ..Self::new()
            }
        }
    }

    impl Bme280Bus for Simulated {
        type Error = Nack;

        fn read(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Nack> {
            if self.offline {
                return Err(Nack);
            }
            self.reads.push(register);
            let start = register as usize;
            buffer.copy_from_slice(&self.regs[start..start + buffer.len()]);
            if register == REG_STATUS && self.nvm_busy_reads > 0 {
                self.nvm_busy_reads -= 1;
                buffer[0] |= STATUS_IM_UPDATE;
            }
            Ok(())
        }

        fn write(&mut self, register: u8, payload: &[u8]) -> Result<(), Nack> {
            if self.offline || self.reject_writes_to == Some(register) {
                return Err(Nack);
            }
            self.writes.push((register, payload.to_vec()));
            if register != REG_RESET {
                let start = register as usize;
                self.regs[start..start + payload.len()].copy_from_slice(payload);
            }
            Ok(())
        }

        fn delay_us(&mut self, us: u32) {
            self.delays.push(us);
        }
    }

    const SINGLE: Settings = Settings {
        osr_t: Oversampling::X1,
        osr_p: Oversampling::X1,
        osr_h: Oversampling::X1,
        filter: Filter::Off,
        standby: Standby::Ms0_5,
    };

    #[test]
    fn init_resets_and_loads_calibration() {
        let mut dev = Bme280::new(Simulated::new());
        assert!(!dev.is_initialized());

        dev.init().unwrap();
        assert!(dev.is_initialized());
        assert_eq!(
            dev.calibration(),
            Some(&Calibration::parse(&DATASHEET_TP, &SAMPLE_HUM))
        );

        let bus = dev.release();
        assert_eq!(bus.writes, vec![(REG_RESET, vec![SOFT_RESET_COMMAND])]);
        assert_eq!(bus.reads, vec![REG_CHIP_ID, REG_STATUS, REG_TEMP_PRESS_CALIB, REG_HUM_CALIB]);
        assert_eq!(bus.delays, vec![STARTUP_DELAY_US]);
    }

    #[test]
    fn wrong_chip_id_is_retried_then_reported() {
        let mut bus = Simulated::new();
        bus.regs[REG_CHIP_ID as usize] = 0x58;
        let mut dev = Bme280::new(bus);

        let err = dev.init().unwrap_err();
        assert_eq!(err, Error::DeviceNotFound);
        assert_eq!(err.code(), -2);
        assert!(!dev.is_initialized());

        let bus = dev.release();
        assert_eq!(bus.reads.len(), PROBE_ATTEMPTS as usize);
        assert_eq!(bus.delays, vec![PROBE_RETRY_DELAY_US; PROBE_ATTEMPTS as usize - 1]);
        assert!(bus.writes.is_empty());
    }

    #[test]
    fn silent_bus_is_device_not_found() {
        let mut dev = Bme280::new(Simulated::offline());
        assert_eq!(dev.init(), Err(Error::DeviceNotFound));
    }

    #[test]
    fn stuck_nvm_copy() {
        let mut bus = Simulated::new();
        bus.nvm_busy_reads = usize::MAX;
        let mut dev = Bme280::new(bus);
        assert_eq!(dev.init(), Err(Error::NvmCopyFailed));
        assert!(!dev.is_initialized());
    }

    #[test]
    fn slow_nvm_copy_is_waited_out() {
        let mut bus = Simulated::new();
        bus.nvm_busy_reads = 2;
        let mut dev = Bme280::new(bus);
        dev.init().unwrap();
        assert_eq!(dev.release().delays, vec![STARTUP_DELAY_US; 3]);
    }

    #[test]
    fn settings_are_written_with_ctrl_meas_last() {
        let mut dev = Bme280::new(Simulated::new());
        dev.init().unwrap();
        dev.set_sensor_settings(&SINGLE).unwrap();
        assert_eq!(dev.settings(), &SINGLE);

        let bus = dev.release();
        assert_eq!(
            bus.writes[1..],
            [
                (REG_CTRL_MEAS, vec![0x00]),
                (REG_CTRL_HUM, vec![0x01]),
                (REG_CONFIG, vec![0x00]),
                (REG_CTRL_MEAS, vec![0x24]),
            ]
        );
    }

    #[test]
    fn failed_settings_push_uninitializes() {
        let mut bus = Simulated::new();
        bus.reject_writes_to = Some(REG_CONFIG);
        let mut dev = Bme280::new(bus);
        dev.init().unwrap();

        assert_eq!(dev.set_sensor_settings(&SINGLE), Err(Error::Bus(Nack)));
        assert!(!dev.is_initialized());
        assert_eq!(dev.settings(), &Settings::POWER_ON);

        let writes = dev.bus.writes.len();
        assert_eq!(dev.set_forced_mode(), Err(Error::NotInitialized));
        assert_eq!(dev.get_sensor_data(), Err(Error::NotInitialized));
        assert_eq!(dev.release().writes.len(), writes);
    }

    #[test]
    fn forced_mode_needs_init() {
        let mut dev = Bme280::new(Simulated::new());
        assert_eq!(dev.set_forced_mode(), Err(Error::NotInitialized));
        assert_eq!(dev.get_sensor_data(), Err(Error::NotInitialized));
        let bus = dev.release();
        assert!(bus.writes.is_empty());
        assert!(bus.reads.is_empty());
    }

    #[test]
    fn forced_measurement() {
        let mut dev = Bme280::new(Simulated::new());
        dev.init().unwrap();
        dev.set_sensor_settings(&SINGLE).unwrap();

        dev.set_forced_mode().unwrap();
        assert_eq!(dev.mode(), Ok(Mode::Forced));
        assert_eq!(dev.measurement_delay_us(), 9300);

        let sample = dev.get_sensor_data().unwrap();
        assert!((sample.temperature - 25.08).abs() < 0.01);
        assert!((sample.pressure - 100653.27).abs() < 1.0);

        let bus = dev.release();
        assert_eq!(bus.writes.last(), Some(&(REG_CTRL_MEAS, vec![0x25])));
        assert_eq!(bus.reads.last(), Some(&REG_DATA));
    }

    #[test]
    fn bus_failure_maps_to_comm_code() {
        let mut dev = Bme280::new(Simulated::new());
        dev.init().unwrap();
        dev.bus.offline = true;
        let err = dev.get_sensor_data().unwrap_err();
        assert_eq!(err, Error::Bus(Nack));
        assert_eq!(err.code(), -4);
    }

    #[test]
    fn zero_length_read_is_rejected() {
        let mut dev = Bme280::new(Simulated::new());
        assert_eq!(dev.read_regs(REG_DATA, &mut []), Err(Error::InvalidLength));
        assert!(dev.release().reads.is_empty());
    }
}
