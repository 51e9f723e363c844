use crate::buffer::PixelBuffer;
use crate::error::AppError;
use bytes::Bytes;
use tracing::debug;

/// Decode an encoded image (PNG, JPEG, ...) into a PixelBuffer.
///
/// This is the only place the crate touches an image codec; everything
/// downstream works on the raw RGBA samples.
pub fn decode(source: Bytes) -> Result<PixelBuffer, AppError> {
    let image = image::load_from_memory(&source)?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    debug!("Decoded {}x{} image from {} bytes", width, height, source.len());
    PixelBuffer::new(width, height, rgba.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    #[test]
    fn decodes_png_round_trip() {
        let img = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_pixel(3, 2, Rgba([9, 8, 7, 255]));
        let mut encoded = Cursor::new(Vec::new());
        img.write_to(&mut encoded, ImageFormat::Png).unwrap();

        let buffer = decode(Bytes::from(encoded.into_inner())).unwrap();
        assert_eq!(buffer.width(), 3);
        assert_eq!(buffer.height(), 2);
        assert_eq!(buffer.rgb(2, 1), image::Rgb([9, 8, 7]));
    }

    #[test]
    fn corrupt_bytes_fail_with_decode_error() {
        let result = decode(Bytes::from_static(b"not an image"));
        assert!(matches!(result, Err(AppError::Decode(_))));
    }
}
