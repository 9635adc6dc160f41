#![no_std]
#![no_main]

use defmt::*;
use embassy_time::Delay;
use envlog_core::config::{SENSOR_ADDRESS, SENSOR_SETTINGS};
use envlog_core::{Bme280, Console, I2cGlue, Station};
use lm401_envlog::{chip_id, i2c, uart};
use {defmt_rtt as _, panic_probe as _};

#[cortex_m_rt::entry]
fn main() -> ! {
    let p = embassy_stm32::init(lm401_envlog::config());
    info!("BME280 serial logger");
    let chip_id = chip_id();
    info!(
        "Chip ID: {:08x} {:08x} {:08x}",
        chip_id[0], chip_id[1], chip_id[2]
    );

    let uart = unwrap!(uart::init(p.USART2, p.PA3, p.PA2));
    let mut console = Console::new(uart);

    let i2c = i2c::init(p.I2C2, p.PA12, p.PA11);
    let glue = I2cGlue::new(i2c, Delay, SENSOR_ADDRESS);
    info!("BME280 at {=u8:#x}", glue.address());

    let mut station = Station::new(Bme280::new(glue));
    match station.setup(&SENSOR_SETTINGS, &mut console) {
        Ok(state) => info!("sensor {}", state),
        Err(_) => warn!("serial output failed"),
    }

    station.run(&mut console)
}
