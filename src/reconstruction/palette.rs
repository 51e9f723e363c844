use crate::buffer::PixelBuffer;
use crate::reconstruction::progress::ProgressReporter;
use crate::reconstruction::RunOutcome;
use crate::surface::DrawSurface;
use image::Rgb;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Rows requantized between partial pushes to the surface.
const ROWS_PER_BATCH: u32 = 10;

/// Requantizes every pixel to its nearest palette color by Euclidean RGB
/// distance, pushing the partially converted image to the surface as it goes.
pub struct PaletteReconstructor {
    palette: Vec<Rgb<u8>>,
}

impl PaletteReconstructor {
    pub fn new(palette: Vec<Rgb<u8>>) -> Self {
        Self { palette }
    }

    pub async fn run<S: DrawSurface>(
        &self,
        buffer: &PixelBuffer,
        surface: &mut S,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        if self.palette.is_empty() {
            info!("Empty palette, nothing to requantize");
            return RunOutcome::Completed;
        }
        let width = buffer.width();
        let height = buffer.height();
        if width == 0 || height == 0 {
            return RunOutcome::Completed;
        }

        let mut working = buffer.samples().to_vec();
        for y in 0..height {
            if cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            for x in 0..width {
                let i = (y as usize * width as usize + x as usize) * 4;
                let Rgb([r, g, b]) =
                    self.nearest(working[i], working[i + 1], working[i + 2]);
                working[i] = r;
                working[i + 1] = g;
                working[i + 2] = b;
            }
            if y % ROWS_PER_BATCH == 0 {
                push_partial(surface, width, height, &working);
                progress.report(y as f32 / height as f32);
                tokio::task::yield_now().await;
            }
        }

        push_partial(surface, width, height, &working);
        progress.report(1.0);
        RunOutcome::Completed
    }

    /// First palette entry achieving the minimum squared distance wins ties.
    fn nearest(&self, r: u8, g: u8, b: u8) -> Rgb<u8> {
        let mut best = self.palette[0];
        let mut best_dist = u32::MAX;
        for &candidate in &self.palette {
            let Rgb([cr, cg, cb]) = candidate;
            let dr = r as i32 - cr as i32;
            let dg = g as i32 - cg as i32;
            let db = b as i32 - cb as i32;
            let dist = (dr * dr + dg * dg + db * db) as u32;
            if dist < best_dist {
                best_dist = dist;
                best = candidate;
            }
        }
        best
    }
}

fn push_partial<S: DrawSurface>(surface: &mut S, width: u32, height: u32, working: &[u8]) {
    match PixelBuffer::new(width, height, working.to_vec()) {
        Ok(frame) => {
            if let Err(e) = surface.blit(&frame, 0, 0) {
                warn!("Skipping partial requantization push: {}", e);
            }
        }
        Err(e) => warn!("Skipping partial requantization push: {}", e),
    }
}
