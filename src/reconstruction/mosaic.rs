use crate::buffer::PixelBuffer;
use crate::error::AppError;
use crate::reconstruction::progress::ProgressReporter;
use crate::reconstruction::RunOutcome;
use crate::surface::DrawSurface;
use image::Rgb;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Rebuilds the image as a grid of solid cells, each filled with the
/// arithmetic mean color of the pixels it covers. Works one cell row per
/// chunk, yielding between rows.
pub struct MosaicReconstructor {
    block_size: u32,
}

impl MosaicReconstructor {
    pub fn new(block_size: u32) -> Result<Self, AppError> {
        if block_size < 1 {
            return Err(AppError::Parameters(
                "mosaic block size must be at least 1".to_string(),
            ));
        }
        Ok(Self { block_size })
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
        let total_rows = height.div_ceil(self.block_size);
        if width == 0 || total_rows == 0 {
            return RunOutcome::Completed;
        }

        let mut rows_done = 0u32;
        for y in (0..height).step_by(self.block_size as usize) {
            if cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            for x in (0..width).step_by(self.block_size as usize) {
                let w = self.block_size.min(width - x);
                let h = self.block_size.min(height - y);
                let color = cell_mean(buffer, x, y, w, h);
                if let Err(e) = surface.fill_rect(x, y, w, h, color) {
                    warn!("Skipping mosaic cell at ({}, {}): {}", x, y, e);
                }
            }
            rows_done += 1;
            progress.report(rows_done as f32 / total_rows as f32);
            tokio::task::yield_now().await;
        }
        RunOutcome::Completed
    }
}

/// Integer-floor mean RGB over one cell. The cell is always in bounds and
/// non-empty; callers clip it before calling.
fn cell_mean(buffer: &PixelBuffer, x: u32, y: u32, w: u32, h: u32) -> Rgb<u8> {
    let mut sum_r = 0u64;
    let mut sum_g = 0u64;
    let mut sum_b = 0u64;
    for py in y..y + h {
        for px in x..x + w {
            let Rgb([r, g, b]) = buffer.rgb(px, py);
            sum_r += r as u64;
            sum_g += g as u64;
            sum_b += b as u64;
        }
    }
    let count = w as u64 * h as u64;
    Rgb([
        (sum_r / count) as u8,
        (sum_g / count) as u8,
        (sum_b / count) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurfaceError;
    use crate::surface::{DrawOp, RecordingSurface};

    fn solid_buffer(width: u32, height: u32, color: (u8, u8, u8)) -> PixelBuffer {
        let mut samples = Vec::new();
        for _ in 0..width * height {
            samples.extend_from_slice(&[color.0, color.1, color.2, 255]);
        }
        PixelBuffer::new(width, height, samples).unwrap()
    }

    #[test]
    fn rejects_zero_block_size() {
        assert!(matches!(
            MosaicReconstructor::new(0),
            Err(AppError::Parameters(_))
        ));
    }

    #[tokio::test]
    async fn solid_color_is_reproduced_in_every_cell() {
        let buffer = solid_buffer(8, 6, (40, 90, 200));
        let mut surface = RecordingSurface::new();
        surface.prepare(8, 6).unwrap();
        let (progress, _rx) = ProgressReporter::standalone();

        let outcome = MosaicReconstructor::new(3)
            .unwrap()
            .run(&buffer, &mut surface, &progress, &CancellationToken::new())
            .await;

        assert_eq!(outcome, RunOutcome::Completed);
        // 3 cell columns x 2 cell rows
        assert_eq!(surface.ops().len(), 6);
        for op in surface.ops() {
            match op {
                DrawOp::FillRect { color, .. } => assert_eq!(*color, Rgb([40, 90, 200])),
                other => panic!("unexpected op {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn two_by_two_image_collapses_to_the_floor_mean() {
        let buffer = PixelBuffer::new(
            2,
            2,
            vec![
                255, 0, 0, 255, //
                0, 255, 0, 255, //
                0, 0, 255, 255, //
                255, 255, 255, 255,
            ],
        )
        .unwrap();
        let mut surface = RecordingSurface::new();
        surface.prepare(2, 2).unwrap();
        let (progress, _rx) = ProgressReporter::standalone();

        MosaicReconstructor::new(2)
            .unwrap()
            .run(&buffer, &mut surface, &progress, &CancellationToken::new())
            .await;

        assert_eq!(surface.ops().len(), 1);
        match &surface.ops()[0] {
            DrawOp::FillRect { x, y, w, h, color } => {
                assert_eq!((*x, *y, *w, *h), (0, 0, 2, 2));
                // (255 + 0 + 0 + 255) / 4 = 127 with floor division, per channel
                assert_eq!(*color, Rgb([127, 127, 127]));
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[tokio::test]
    async fn progress_is_non_decreasing_and_ends_at_one() {
        let buffer = solid_buffer(4, 4, (10, 10, 10));
        let mut surface = RecordingSurface::new();
        surface.prepare(4, 4).unwrap();
        let (progress, mut rx) = ProgressReporter::standalone();

        let collector = tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                seen.push(rx.borrow().progress);
            }
            seen
        });

        let outcome = MosaicReconstructor::new(1)
            .unwrap()
            .run(&buffer, &mut surface, &progress, &CancellationToken::new())
            .await;
        drop(progress);

        assert_eq!(outcome, RunOutcome::Completed);
        let seen = collector.await.unwrap();
        assert_eq!(seen, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[tokio::test]
    async fn cancellation_stops_between_rows_without_reaching_one() {
        let buffer = solid_buffer(4, 4, (10, 10, 10));
        let mut surface = RecordingSurface::new();
        surface.prepare(4, 4).unwrap();
        let (progress, mut rx) = ProgressReporter::standalone();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let watcher = tokio::spawn(async move {
            let mut last = 0.0f32;
            while rx.changed().await.is_ok() {
                last = rx.borrow().progress;
                if last >= 0.5 {
                    trigger.cancel();
                    break;
                }
            }
            last
        });

        let outcome = MosaicReconstructor::new(1)
            .unwrap()
            .run(&buffer, &mut surface, &progress, &cancel)
            .await;
        drop(progress);

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(watcher.await.unwrap() < 1.0);
        assert!(surface.ops().len() < 16);
    }

    #[tokio::test]
    async fn a_failing_cell_is_skipped_and_the_run_completes() {
        struct FlakySurface {
            inner: RecordingSurface,
            failed_once: bool,
        }
        impl DrawSurface for FlakySurface {
            fn prepare(&mut self, w: u32, h: u32) -> Result<(), SurfaceError> {
                self.inner.prepare(w, h)
            }
            fn clear(&mut self, c: Rgb<u8>) -> Result<(), SurfaceError> {
                self.inner.clear(c)
            }
            fn fill_rect(
                &mut self,
                x: u32,
                y: u32,
                w: u32,
                h: u32,
                c: Rgb<u8>,
            ) -> Result<(), SurfaceError> {
                if !self.failed_once {
                    self.failed_once = true;
                    return Err(SurfaceError::WriteFailed("rect".to_string()));
                }
                self.inner.fill_rect(x, y, w, h, c)
            }
            fn fill_circle(
                &mut self,
                cx: u32,
                cy: u32,
                r: f32,
                c: Rgb<u8>,
            ) -> Result<(), SurfaceError> {
                self.inner.fill_circle(cx, cy, r, c)
            }
            fn blit(&mut self, p: &PixelBuffer, x: u32, y: u32) -> Result<(), SurfaceError> {
                self.inner.blit(p, x, y)
            }
        }

        let buffer = solid_buffer(4, 2, (1, 2, 3));
        let mut surface = FlakySurface {
            inner: RecordingSurface::new(),
            failed_once: false,
        };
        surface.prepare(4, 2).unwrap();
        let (progress, rx) = ProgressReporter::standalone();

        let outcome = MosaicReconstructor::new(2)
            .unwrap()
            .run(&buffer, &mut surface, &progress, &CancellationToken::new())
            .await;

        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(rx.borrow().progress, 1.0);
        // one of the two cells was dropped
        assert_eq!(surface.inner.ops().len(), 1);
    }
}
