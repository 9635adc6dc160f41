#![no_std]

pub mod i2c;
pub mod uart;

/// APB1 clock after reset: MSI at 4 MHz, no AHB or APB prescaling.
/// USART2 and I2C2 are both clocked from it.
pub const PCLK1_HZ: u32 = 4_000_000;

/// Peripheral config for the logger. The clock tree is left at its reset state
/// so that [`PCLK1_HZ`] holds.
pub fn config() -> embassy_stm32::Config {
    embassy_stm32::Config::default()
}

// Device ID in STM32L4(WL) microcontrollers
pub fn chip_id() -> [u32; 3] {
    unsafe {
        [
            core::ptr::read_volatile(0x1FFF7590 as *const u32),
            core::ptr::read_volatile(0x1FFF7594 as *const u32),
            core::ptr::read_volatile(0x1FFF7598 as *const u32),
        ]
    }
}
