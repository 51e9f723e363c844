use image::Rgb;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageProperties {
    pub width: u32,
    pub height: u32,
    pub pixel_count: u64,
}

/// Per-channel pixel counts at one intensity level. The histogram holds
/// exactly 256 of these, in ascending intensity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistogramDataPoint {
    pub intensity: u8,
    pub r: u64,
    pub g: u64,
    pub b: u64,
}

/// One dominant color, as "#rrggbb" with the number of samples that landed
/// in its quantization bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorPaletteItem {
    pub hex: String,
    pub count: u32,
}

impl ColorPaletteItem {
    /// Parse the hex representation back into a color. Returns None for
    /// anything that is not a 6-digit "#rrggbb" string.
    pub fn rgb(&self) -> Option<Rgb<u8>> {
        let digits = self.hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Rgb([r, g, b]))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub properties: ImageProperties,
    pub histogram: Vec<HistogramDataPoint>,
    pub palette: Vec<ColorPaletteItem>,
}

impl AnalysisResult {
    /// Palette colors in rank order, skipping malformed entries.
    pub fn palette_colors(&self) -> Vec<Rgb<u8>> {
        self.palette.iter().filter_map(ColorPaletteItem::rgb).collect()
    }
}
