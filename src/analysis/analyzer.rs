use crate::analysis::types::{
    AnalysisResult, ColorPaletteItem, HistogramDataPoint, ImageProperties,
};
use crate::buffer::PixelBuffer;
use indexmap::IndexMap;
use tracing::debug;

/// Upper bound on pixels visited by the palette pass, independent of image size.
const PALETTE_SAMPLE_TARGET: u64 = 20_000;
/// Maximum number of palette entries reported.
const PALETTE_SIZE: usize = 10;

/// Analyze a decoded image: full-resolution channel histogram, dominant-color
/// palette from a subsampled quantization pass, and basic properties.
///
/// A zero-pixel buffer yields an empty palette and an all-zero histogram; it
/// is not an error.
pub fn analyze(buffer: &PixelBuffer) -> AnalysisResult {
    let properties = ImageProperties {
        width: buffer.width(),
        height: buffer.height(),
        pixel_count: buffer.pixel_count(),
    };

    let histogram = build_histogram(buffer);
    let palette = build_palette(buffer);

    debug!(
        "Analyzed {}x{} image: {} palette entries",
        properties.width,
        properties.height,
        palette.len()
    );

    AnalysisResult {
        properties,
        histogram,
        palette,
    }
}

/// Visits every pixel exactly once; this is the authoritative distribution.
fn build_histogram(buffer: &PixelBuffer) -> Vec<HistogramDataPoint> {
    let mut r_counts = [0u64; 256];
    let mut g_counts = [0u64; 256];
    let mut b_counts = [0u64; 256];

    for px in buffer.samples().chunks_exact(4) {
        r_counts[px[0] as usize] += 1;
        g_counts[px[1] as usize] += 1;
        b_counts[px[2] as usize] += 1;
    }

    (0..=255u8)
        .map(|intensity| HistogramDataPoint {
            intensity,
            r: r_counts[intensity as usize],
            g: g_counts[intensity as usize],
            b: b_counts[intensity as usize],
        })
        .collect()
}

/// Subsampled 4-bit-per-channel bucket counting. The IndexMap keeps first-seen
/// order, which decides ties when counts are equal.
fn build_palette(buffer: &PixelBuffer) -> Vec<ColorPaletteItem> {
    let pixel_count = buffer.pixel_count();
    if pixel_count == 0 {
        return Vec::new();
    }

    let sample_rate = (pixel_count / PALETTE_SAMPLE_TARGET).max(1) as usize;
    let samples = buffer.samples();

    let mut buckets: IndexMap<(u8, u8, u8), u32> = IndexMap::new();
    for i in (0..pixel_count as usize).step_by(sample_rate) {
        let base = i * 4;
        let key = (
            samples[base] >> 4,
            samples[base + 1] >> 4,
            samples[base + 2] >> 4,
        );
        *buckets.entry(key).or_insert(0) += 1;
    }

    let mut ranked: Vec<((u8, u8, u8), u32)> = buckets.into_iter().collect();
    // sort_by_key is stable, so equal counts keep first-seen order
    ranked.sort_by_key(|&(_, count)| std::cmp::Reverse(count));

    ranked
        .into_iter()
        .take(PALETTE_SIZE)
        .map(|((r, g, b), count)| ColorPaletteItem {
            // representative color is the bucket's lower bound
            hex: format!("#{:02x}{:02x}{:02x}", r << 4, g << 4, b << 4),
            count,
        })
        .collect()
}
