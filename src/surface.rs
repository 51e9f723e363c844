use crate::buffer::PixelBuffer;
use crate::error::SurfaceError;
use image::{Rgb, Rgba, RgbaImage};
use std::sync::{Arc, Mutex};

/// Destination for reconstruction output. A run owns its surface exclusively
/// for the duration of the run; hosts that need to keep a handle wrap the
/// surface in `Arc<Mutex<_>>` (see the blanket impl below).
pub trait DrawSurface {
    /// Size the surface for the coming run. Called once at run setup; failure
    /// aborts the run before any drawing or progress.
    fn prepare(&mut self, width: u32, height: u32) -> Result<(), SurfaceError>;
    fn clear(&mut self, color: Rgb<u8>) -> Result<(), SurfaceError>;
    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>)
        -> Result<(), SurfaceError>;
    fn fill_circle(&mut self, cx: u32, cy: u32, radius: f32, color: Rgb<u8>)
        -> Result<(), SurfaceError>;
    fn blit(&mut self, pixels: &PixelBuffer, x: u32, y: u32) -> Result<(), SurfaceError>;
}

/// In-memory RGBA raster, the canvas stand-in. Hosts can take the finished
/// image out for display or encoding.
#[derive(Debug, Default)]
pub struct RasterSurface {
    image: Option<RgbaImage>,
}

impl RasterSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn into_image(self) -> Option<RgbaImage> {
        self.image
    }

    fn image_mut(&mut self, op: &str) -> Result<&mut RgbaImage, SurfaceError> {
        self.image
            .as_mut()
            .ok_or_else(|| SurfaceError::WriteFailed(format!("{} before prepare", op)))
    }
}

impl DrawSurface for RasterSurface {
    fn prepare(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.image = Some(RgbaImage::new(width, height));
        Ok(())
    }

    fn clear(&mut self, color: Rgb<u8>) -> Result<(), SurfaceError> {
        let image = self.image_mut("clear")?;
        let Rgb([r, g, b]) = color;
        for px in image.pixels_mut() {
            *px = Rgba([r, g, b, 255]);
        }
        Ok(())
    }

    fn fill_rect(
        &mut self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        color: Rgb<u8>,
    ) -> Result<(), SurfaceError> {
        let image = self.image_mut("fill_rect")?;
        let Rgb([r, g, b]) = color;
        let x1 = x.saturating_add(w).min(image.width());
        let y1 = y.saturating_add(h).min(image.height());
        for py in y.min(image.height())..y1 {
            for px in x.min(image.width())..x1 {
                image.put_pixel(px, py, Rgba([r, g, b, 255]));
            }
        }
        Ok(())
    }

    fn fill_circle(
        &mut self,
        cx: u32,
        cy: u32,
        radius: f32,
        color: Rgb<u8>,
    ) -> Result<(), SurfaceError> {
        let image = self.image_mut("fill_circle")?;
        let Rgb([r, g, b]) = color;
        let (cx, cy) = (cx as i64, cy as i64);
        let ri = radius.ceil() as i64;
        let r2 = (radius as f64) * (radius as f64);
        for dy in -ri..=ri {
            let py = cy + dy;
            if py < 0 || py >= image.height() as i64 {
                continue;
            }
            for dx in -ri..=ri {
                let px = cx + dx;
                if px < 0 || px >= image.width() as i64 {
                    continue;
                }
                if (dx * dx + dy * dy) as f64 <= r2 {
                    image.put_pixel(px as u32, py as u32, Rgba([r, g, b, 255]));
                }
            }
        }
        Ok(())
    }

    fn blit(&mut self, pixels: &PixelBuffer, x: u32, y: u32) -> Result<(), SurfaceError> {
        let image = self.image_mut("blit")?;
        let w = pixels.width().min(image.width().saturating_sub(x));
        let h = pixels.height().min(image.height().saturating_sub(y));
        for sy in 0..h {
            for sx in 0..w {
                image.put_pixel(x + sx, y + sy, pixels.pixel(sx, sy));
            }
        }
        Ok(())
    }
}

/// One recorded drawing command.
#[derive(Debug, Clone)]
pub enum DrawOp {
    Clear {
        color: Rgb<u8>,
    },
    FillRect {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        color: Rgb<u8>,
    },
    FillCircle {
        cx: u32,
        cy: u32,
        radius: f32,
        color: Rgb<u8>,
    },
    Blit {
        pixels: PixelBuffer,
        x: u32,
        y: u32,
    },
}

/// Captures the drawing command stream instead of rasterizing it. Used by
/// hosts that forward commands elsewhere, and by the tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    prepared: Option<(u32, u32)>,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn prepared(&self) -> Option<(u32, u32)> {
        self.prepared
    }
}

impl DrawSurface for RecordingSurface {
    fn prepare(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.prepared = Some((width, height));
        self.ops.clear();
        Ok(())
    }

    fn clear(&mut self, color: Rgb<u8>) -> Result<(), SurfaceError> {
        self.ops.push(DrawOp::Clear { color });
        Ok(())
    }

    fn fill_rect(
        &mut self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        color: Rgb<u8>,
    ) -> Result<(), SurfaceError> {
        self.ops.push(DrawOp::FillRect { x, y, w, h, color });
        Ok(())
    }

    fn fill_circle(
        &mut self,
        cx: u32,
        cy: u32,
        radius: f32,
        color: Rgb<u8>,
    ) -> Result<(), SurfaceError> {
        self.ops.push(DrawOp::FillCircle {
            cx,
            cy,
            radius,
            color,
        });
        Ok(())
    }

    fn blit(&mut self, pixels: &PixelBuffer, x: u32, y: u32) -> Result<(), SurfaceError> {
        self.ops.push(DrawOp::Blit {
            pixels: pixels.clone(),
            x,
            y,
        });
        Ok(())
    }
}

// A run task takes ownership of its surface; wrapping in Arc<Mutex<_>> lets
// the host read the result back after the run finishes. A poisoned lock maps
// to Unavailable, which aborts the run at setup.
impl<S: DrawSurface> DrawSurface for Arc<Mutex<S>> {
    fn prepare(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.lock()
            .map_err(|e| SurfaceError::Unavailable(e.to_string()))?
            .prepare(width, height)
    }

    fn clear(&mut self, color: Rgb<u8>) -> Result<(), SurfaceError> {
        self.lock()
            .map_err(|e| SurfaceError::Unavailable(e.to_string()))?
            .clear(color)
    }

    fn fill_rect(
        &mut self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        color: Rgb<u8>,
    ) -> Result<(), SurfaceError> {
        self.lock()
            .map_err(|e| SurfaceError::Unavailable(e.to_string()))?
            .fill_rect(x, y, w, h, color)
    }

    fn fill_circle(
        &mut self,
        cx: u32,
        cy: u32,
        radius: f32,
        color: Rgb<u8>,
    ) -> Result<(), SurfaceError> {
        self.lock()
            .map_err(|e| SurfaceError::Unavailable(e.to_string()))?
            .fill_circle(cx, cy, radius, color)
    }

    fn blit(&mut self, pixels: &PixelBuffer, x: u32, y: u32) -> Result<(), SurfaceError> {
        self.lock()
            .map_err(|e| SurfaceError::Unavailable(e.to_string()))?
            .blit(pixels, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_clips_to_surface_bounds() {
        let mut surface = RasterSurface::new();
        surface.prepare(4, 4).unwrap();
        surface.fill_rect(2, 2, 10, 10, Rgb([5, 6, 7])).unwrap();
        let image = surface.image().unwrap();
        assert_eq!(*image.get_pixel(3, 3), Rgba([5, 6, 7, 255]));
        assert_eq!(*image.get_pixel(1, 1), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn fill_rect_near_u32_max_does_not_overflow() {
        let mut surface = RasterSurface::new();
        surface.prepare(4, 4).unwrap();

        surface.fill_rect(u32::MAX, 0, 2, 2, Rgb([1, 2, 3])).unwrap();
        assert!(surface
            .image()
            .unwrap()
            .pixels()
            .all(|p| *p == Rgba([0, 0, 0, 0])));

        surface
            .fill_rect(1, 1, u32::MAX, u32::MAX, Rgb([1, 2, 3]))
            .unwrap();
        let image = surface.image().unwrap();
        assert_eq!(*image.get_pixel(3, 3), Rgba([1, 2, 3, 255]));
        assert_eq!(*image.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn fill_circle_covers_center_and_respects_radius() {
        let mut surface = RasterSurface::new();
        surface.prepare(9, 9).unwrap();
        surface.fill_circle(4, 4, 2.0, Rgb([255, 0, 0])).unwrap();
        let image = surface.image().unwrap();
        assert_eq!(*image.get_pixel(4, 4), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.get_pixel(4, 2), Rgba([255, 0, 0, 255]));
        // (3, 1) lies at distance sqrt(10) > 2 from the center
        assert_eq!(*image.get_pixel(3, 1), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn blit_copies_pixels_at_offset() {
        let buffer = PixelBuffer::new(1, 1, vec![9, 9, 9, 255]).unwrap();
        let mut surface = RasterSurface::new();
        surface.prepare(3, 3).unwrap();
        surface.blit(&buffer, 2, 2).unwrap();
        assert_eq!(*surface.image().unwrap().get_pixel(2, 2), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn drawing_before_prepare_is_a_write_failure() {
        let mut surface = RasterSurface::new();
        let result = surface.clear(Rgb([0, 0, 0]));
        assert!(matches!(result, Err(SurfaceError::WriteFailed(_))));
    }

    #[test]
    fn recording_surface_keeps_command_order() {
        let mut surface = RecordingSurface::new();
        surface.prepare(2, 2).unwrap();
        surface.clear(Rgb([1, 1, 1])).unwrap();
        surface.fill_rect(0, 0, 1, 1, Rgb([2, 2, 2])).unwrap();
        assert_eq!(surface.prepared(), Some((2, 2)));
        assert!(matches!(surface.ops()[0], DrawOp::Clear { .. }));
        assert!(matches!(surface.ops()[1], DrawOp::FillRect { .. }));
    }
}
