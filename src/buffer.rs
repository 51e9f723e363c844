use crate::error::AppError;
use image::{Rgb, Rgba};
use std::sync::Arc;

/// Decoded image pixels, row-major RGBA, shared read-only between the
/// analyzer and whichever reconstructor is running.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    samples: Arc<[u8]>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, AppError> {
        let expected = width as usize * height as usize * 4;
        if samples.len() != expected {
            return Err(AppError::Buffer(format!(
                "expected {} samples for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            samples: samples.into(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Pixel at (x, y). Callers stay in bounds; the reconstructors only ever
    /// index coordinates derived from width/height.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Rgba([
            self.samples[i],
            self.samples[i + 1],
            self.samples[i + 2],
            self.samples[i + 3],
        ])
    }

    pub fn rgb(&self, x: u32, y: u32) -> Rgb<u8> {
        let Rgba([r, g, b, _]) = self.pixel(x, y);
        Rgb([r, g, b])
    }
}
