//! USART2 on the board header: TX on PA2, RX on PA3

use defmt::info;
use embassy_stm32::mode::Blocking;
use embassy_stm32::peripherals::{PA2, PA3, USART2};
use embassy_stm32::usart::{Config, ConfigError, DataBits, Parity, StopBits, Uart};
use envlog_core::config::{BAUD_RATE, BAUD_TOLERANCE_PERMILLE};
use envlog_core::BaudSettings;

use crate::PCLK1_HZ;

/// What the HAL should program into BRR for [`BAUD_RATE`]; logged, not written.
const BAUD: BaudSettings = match BaudSettings::new(PCLK1_HZ, BAUD_RATE) {
    Some(baud) => baud,
    None => panic!("BAUD_RATE is out of reach of PCLK1"),
};

const _: () = assert!(
    BAUD.error_permille(PCLK1_HZ, BAUD_RATE) <= BAUD_TOLERANCE_PERMILLE,
    "BAUD_RATE error too large at this PCLK1"
);

/// 8N1 at [`BAUD_RATE`], no flow control.
pub fn config() -> Config {
    let mut config = Config::default();
    config.baudrate = BAUD_RATE;
    config.data_bits = DataBits::DataBits8;
    config.parity = Parity::ParityNone;
    config.stop_bits = StopBits::STOP1;
    config
}

/// Enable USART2 with both directions, polled.
pub fn init(usart: USART2, rx: PA3, tx: PA2) -> Result<Uart<'static, Blocking>, ConfigError> {
    info!(
        "USART2 {} 8N1: expected BRR={=u16:#x} over8={} ({} baud actual)",
        BAUD_RATE,
        BAUD.brr(),
        BAUD.double_speed,
        BAUD.actual_baud(PCLK1_HZ)
    );
    Uart::new_blocking(usart, rx, tx, config())
}
