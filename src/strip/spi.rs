//! WS2812 strip output over SPI.
//!
//! Each WS2812 bit is stretched to three SPI bits at 2.4 MHz (0 -> 100,
//! 1 -> 110), which lands inside the chip's timing tolerances without any
//! bit-banging. The trailing zero bytes hold the line low long enough to
//! latch.

use anyhow::Error;
use log::error;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use crate::strip::StripDriver;

const CLOCK_HZ: u32 = 2_400_000;

/// 18 zero bytes at 2.4 MHz is ~60 us of idle line, above the 50 us latch.
const LATCH_BYTES: usize = 18;

pub struct Ws2812Spi {
    spi: Spi,
    pixels: Vec<[u8; 3]>,
}

impl Ws2812Spi {
    pub fn new(led_count: usize) -> Result<Self, Error> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, CLOCK_HZ, Mode::Mode0)?;

        Ok(Self {
            spi,
            pixels: vec![[0; 3]; led_count],
        })
    }

    /// One color byte becomes 24 SPI bits, MSB first.
    fn encode(byte: u8, out: &mut Vec<u8>) {
        let mut bits = 0u32;
        for i in 0..8 {
            bits <<= 3;
            bits |= if byte & (0x80 >> i) != 0 { 0b110 } else { 0b100 };
        }
        out.extend_from_slice(&bits.to_be_bytes()[1..]);
    }
}

impl StripDriver for Ws2812Spi {
    fn set_pixel(&mut self, index: usize, rgb: [u8; 3]) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = rgb;
        }
    }

    fn refresh(&mut self) {
        let mut frame = Vec::with_capacity(self.pixels.len() * 9 + LATCH_BYTES);

        for rgb in &self.pixels {
            // The wire order is GRB.
            Self::encode(rgb[1], &mut frame);
            Self::encode(rgb[0], &mut frame);
            Self::encode(rgb[2], &mut frame);
        }
        frame.extend_from_slice(&[0u8; LATCH_BYTES]);

        if let Err(e) = self.spi.write(&frame) {
            error!("strip write failed: {}", e);
        }
    }
}
