//! Shared color buffer and the physical strip renderer.

use std::sync::Arc;

use log::trace;
use tokio::sync::{Mutex, Notify};

#[cfg(feature = "pi")]
pub mod spi;

#[cfg(feature = "pi")]
pub use spi::Ws2812Spi;

/// How the stored component triples are interpreted at refresh time.
/// Selected by the rgb/hsv opcodes and persists across program installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripMode {
    Rgb,
    Hsv,
}

/// One component triple per LED, plus the interpretation flag.
///
/// The scheduler holds the surrounding mutex for the whole of a tick's
/// passes, so the renderer never sees a half-written frame.
pub struct StripState {
    pub mode: StripMode,
    pub data: Vec<[u32; 3]>,
}

impl StripState {
    pub fn new(led_count: usize) -> Self {
        Self {
            mode: StripMode::Rgb,
            data: vec![[0; 3]; led_count],
        }
    }

    pub fn led_count(&self) -> usize {
        self.data.len()
    }

    /// Zero every component; runs at the start of each tick.
    pub fn clear(&mut self) {
        for led in &mut self.data {
            *led = [0; 3];
        }
    }
}

/// Abstract LED strip output. Implement this to support other hardware;
/// the renderer is generic over it.
pub trait StripDriver {
    fn set_pixel(&mut self, index: usize, rgb: [u8; 3]);

    /// Commit the staged pixels to the hardware.
    fn refresh(&mut self);
}

/// Driver used off-target: swallows pixels, logs refreshes.
pub struct NullStrip;

impl StripDriver for NullStrip {
    fn set_pixel(&mut self, _index: usize, _rgb: [u8; 3]) {}

    fn refresh(&mut self) {
        trace!("strip refresh");
    }
}

/// Renderer loop: waits for the frame-ready signal, maps the buffer through
/// the active color mode and pushes it out through the driver.
pub async fn run_renderer(
    strip: Arc<Mutex<StripState>>,
    frame_ready: Arc<Notify>,
    mut driver: Box<dyn StripDriver + Send>,
) {
    loop {
        frame_ready.notified().await;

        let strip = strip.lock().await;
        for (i, led) in strip.data.iter().enumerate() {
            driver.set_pixel(i, map_components(strip.mode, *led));
        }
        driver.refresh();
    }
}

/// Component mapping at the renderer boundary: RGB components wrap modulo
/// 256; under HSV the first component wraps modulo 360 before conversion.
pub fn map_components(mode: StripMode, led: [u32; 3]) -> [u8; 3] {
    match mode {
        StripMode::Rgb => [(led[0] % 256) as u8, (led[1] % 256) as u8, (led[2] % 256) as u8],
        StripMode::Hsv => hsv_to_rgb(led[0] % 360, (led[1] % 256) as u8, (led[2] % 256) as u8),
    }
}

/// Integer HSV to RGB: h in [0, 360), s and v in [0, 256).
pub fn hsv_to_rgb(h: u32, s: u8, v: u8) -> [u8; 3] {
    let s = s as u32;
    let v = v as u32;

    let max = v;
    let min = max * (255 - s) / 255;
    let adj = (max - min) * (h % 60) / 60;

    let (r, g, b) = match h / 60 {
        0 => (max, min + adj, min),
        1 => (max - adj, max, min),
        2 => (min, max, min + adj),
        3 => (min, max - adj, max),
        4 => (min + adj, min, max),
        _ => (max, min, max - adj),
    };

    [r as u8, g as u8, b as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv_to_rgb(0, 255, 255), [255, 0, 0]);
        assert_eq!(hsv_to_rgb(120, 255, 255), [0, 255, 0]);
        assert_eq!(hsv_to_rgb(240, 255, 255), [0, 0, 255]);
    }

    #[test]
    fn hsv_desaturated_is_grey() {
        assert_eq!(hsv_to_rgb(0, 0, 255), [255, 255, 255]);
        assert_eq!(hsv_to_rgb(200, 0, 100), [100, 100, 100]);
        assert_eq!(hsv_to_rgb(37, 255, 0), [0, 0, 0]);
    }

    #[test]
    fn components_wrap_per_mode() {
        assert_eq!(map_components(StripMode::Rgb, [256, 257, 300]), [0, 1, 44]);
        // 360 wraps back to hue 0 = red.
        assert_eq!(map_components(StripMode::Hsv, [360, 255, 255]), [255, 0, 0]);
    }

    #[test]
    fn clear_zeroes_every_component() {
        let mut strip = StripState::new(3);
        strip.data[1] = [9, 9, 9];
        strip.clear();
        assert!(strip.data.iter().all(|led| *led == [0, 0, 0]));
    }
}
