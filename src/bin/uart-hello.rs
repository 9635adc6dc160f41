#![no_std]
#![no_main]

use core::fmt::Write;
use defmt::*;
use embassy_time::Delay;
use embedded_hal::delay::DelayNs;
use envlog_core::config::HELLO_PERIOD_MS;
use envlog_core::Console;
use lm401_envlog::uart;
use {defmt_rtt as _, panic_probe as _};

#[cortex_m_rt::entry]
fn main() -> ! {
    let p = embassy_stm32::init(lm401_envlog::config());
    info!("Hello World!");

    let mut console = Console::new(unwrap!(uart::init(p.USART2, p.PA3, p.PA2)));
    let mut delay = Delay;

    loop {
        info!("tick");
        if console.write_str("hello!\n").is_err() {
            warn!("uart write failed");
        }
        delay.delay_ms(HELLO_PERIOD_MS);
    }
}
