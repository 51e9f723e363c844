use crate::buffer::PixelBuffer;
use crate::error::AppError;
use crate::reconstruction::progress::ProgressReporter;
use crate::reconstruction::RunOutcome;
use crate::surface::DrawSurface;
use image::Rgb;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Background the stippling is drawn over.
const BACKGROUND: Rgb<u8> = Rgb([0x11, 0x18, 0x27]);
/// Progress/yield checkpoints over the whole run.
const CHECKPOINTS: u32 = 200;

/// Rebuilds the image as randomly placed filled circles. Each trial samples a
/// pixel and sizes the circle by its luma brightness, so bright regions get
/// larger dots. Later circles draw over earlier ones.
pub struct CircleReconstructor {
    num_circles: u32,
    min_radius: f32,
    max_radius: f32,
}

impl CircleReconstructor {
    pub fn new(num_circles: u32, min_radius: f32, max_radius: f32) -> Result<Self, AppError> {
        if num_circles < 1 {
            return Err(AppError::Parameters(
                "circle count must be at least 1".to_string(),
            ));
        }
        if !min_radius.is_finite() || !max_radius.is_finite() || min_radius > max_radius {
            return Err(AppError::Parameters(format!(
                "invalid radius range {}..{}",
                min_radius, max_radius
            )));
        }
        Ok(Self {
            num_circles,
            min_radius,
            max_radius,
        })
    }

    pub async fn run<S: DrawSurface>(
        &self,
        buffer: &PixelBuffer,
        surface: &mut S,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let width = buffer.width();
        let height = buffer.height();
        if width == 0 || height == 0 {
            return RunOutcome::Completed;
        }

        if let Err(e) = surface.clear(BACKGROUND) {
            warn!("Skipping background clear: {}", e);
        }

        let mut rng = StdRng::from_os_rng();
        let batch_size = self.num_circles.div_ceil(CHECKPOINTS);

        for i in 0..self.num_circles {
            if cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }

            let x = rng.random_range(0..width);
            let y = rng.random_range(0..height);
            let color @ Rgb([r, g, b]) = buffer.rgb(x, y);
            let brightness =
                (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0;
            let radius = self.min_radius + (self.max_radius - self.min_radius) * brightness;

            if let Err(e) = surface.fill_circle(x, y, radius, color) {
                warn!("Skipping circle at ({}, {}): {}", x, y, e);
            }

            if i % batch_size == 0 {
                progress.report(i as f32 / self.num_circles as f32);
                tokio::task::yield_now().await;
            }
        }

        progress.report(1.0);
        RunOutcome::Completed
    }
}
