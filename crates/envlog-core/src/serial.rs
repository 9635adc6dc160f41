//! Serial text output
//!
//! [`Console`] turns any blocking `embedded_io::Write` byte sink into a
//! `core::fmt::Write` text sink, one byte at a time, with `\n` expanded to
//! `\r\n` for terminal emulators. [`BaudSettings`] derives the USART divisor
//! for a given kernel clock.

use core::fmt;

use embedded_io::Write;

/// Blocking text sink over a serial transmitter.
pub struct Console<W> {
    port: W,
}

impl<W: Write> Console<W> {
    pub fn new(port: W) -> Self {
        Self { port }
    }

    /// Write a single byte, blocking until the transmitter has accepted it.
    ///
    /// A carriage return is sent ahead of every line feed.
    pub fn putchar(&mut self, c: u8) -> Result<(), W::Error> {
        if c == b'\n' {
            self.putchar(b'\r')?;
        }
        self.port.write_all(&[c])
    }

    /// Give the transmitter back.
    pub fn release(self) -> W {
        self.port
    }
}

impl<W: Write> fmt::Write for Console<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.bytes() {
            self.putchar(c).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}

/// USART baud-rate register values derived from the kernel clock.
///
/// The divisor is computed for 16x oversampling first. Double speed (8x
/// oversampling) is only used when the 16x divisor drops below the hardware
/// minimum of 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudSettings {
    /// USARTDIV, in units of the selected oversampling
    pub divisor: u16,
    /// 8x oversampling selected
    pub double_speed: bool,
}

const MIN_DIVISOR: u32 = 16;
const MAX_DIVISOR: u32 = 0xFFFF;

impl BaudSettings {
    /// Returns `None` when the clock cannot produce `baud` in either mode.
    pub const fn new(clock_hz: u32, baud: u32) -> Option<Self> {
        if baud == 0 {
            return None;
        }
        let div16 = rounded_div(clock_hz as u64, baud as u64);
        if div16 >= MIN_DIVISOR as u64 && div16 <= MAX_DIVISOR as u64 {
            return Some(Self {
                divisor: div16 as u16,
                double_speed: false,
            });
        }
        let div8 = rounded_div(2 * clock_hz as u64, baud as u64);
        if div8 >= MIN_DIVISOR as u64 && div8 <= MAX_DIVISOR as u64 {
            return Some(Self {
                divisor: div8 as u16,
                double_speed: true,
            });
        }
        None
    }

    /// Value for the BRR register. In 8x mode the fractional nibble is
    /// shifted right by one and bit 3 stays clear.
    pub const fn brr(&self) -> u16 {
        if self.double_speed {
            (self.divisor & 0xFFF0) | ((self.divisor & 0x000F) >> 1)
        } else {
            self.divisor
        }
    }

    pub const fn actual_baud(&self, clock_hz: u32) -> u32 {
        let clock = if self.double_speed {
            2 * clock_hz as u64
        } else {
            clock_hz as u64
        };
        (clock / self.divisor as u64) as u32
    }

    /// Deviation from `baud` in thousandths.
    pub const fn error_permille(&self, clock_hz: u32, baud: u32) -> u32 {
        let actual = self.actual_baud(clock_hz);
        let diff = if actual > baud {
            actual - baud
        } else {
            baud - actual
        };
        ((diff as u64 * 1000) / baud as u64) as u32
    }
}

const fn rounded_div(n: u64, d: u64) -> u64 {
    (n + d / 2) / d
}
