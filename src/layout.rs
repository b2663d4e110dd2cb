//! Band geometry and caption wrapping.
//!
//! Every measurement here is derived from the source image alone, so the
//! same picture always produces the same band shape no matter what text is
//! typed into it. Wrapping is the one place that needs a text measurer,
//! which is kept behind a trait so plans can be built without a font.

use crate::error::CapbandResult;

/// A band is never shorter than this, regardless of image height.
pub const BAND_MIN_HEIGHT: u32 = 60;
/// Band height is one eighth of the image height before clamping.
pub const BAND_HEIGHT_DIVISOR: u32 = 8;
/// Horizontal inset applied on both sides of the wrapped text.
pub const BAND_PADDING: u32 = 20;
/// Caption glyphs never render smaller than this.
pub const FONT_MIN_SIZE: u32 = 20;

/// Vertical measurements shared by every band of one composite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BandMetrics {
    pub band_height: u32,  // strip height in pixels
    pub font_size: u32,    // caption size in pixels
    pub row_spacing: u32,  // baseline-to-baseline step for wrapped rows
}

impl BandMetrics {
    /// Derive the band shape from the source image height.
    pub fn for_image_height(image_height: u32) -> Self {
        let band_height = (image_height / BAND_HEIGHT_DIVISOR).max(BAND_MIN_HEIGHT);
        // 30% and 40% of the band height, floored. The widening to u64
        // keeps the products exact for any u32 band height.
        let font_size = ((u64::from(band_height) * 3 / 10) as u32).max(FONT_MIN_SIZE);
        let row_spacing = (u64::from(band_height) * 2 / 5) as u32;
        Self {
            band_height,
            font_size,
            row_spacing,
        }
    }

    /// Widest run of text a band of the given image width can hold.
    pub fn max_text_width(&self, image_width: u32) -> f64 {
        f64::from(image_width.saturating_sub(2 * BAND_PADDING))
    }
}

/// Measures rendered text width for wrapping decisions.
///
/// The production implementation shapes with the real font; tests substitute
/// a fixed-advance fake so wrap geometry stays deterministic on machines
/// with no fonts installed.
pub trait TextMeasurer {
    fn measure_width(&mut self, text: &str, font_size: f32) -> CapbandResult<f64>;
}

/// Greedy per-character wrap of one caption line.
///
/// Characters accumulate until the measured width first exceeds `max_width`,
/// at which point the accumulator (sans the offending character) is flushed
/// as a row. A single character wider than the limit still becomes its own
/// row; nothing is ever split below character granularity.
pub fn wrap_line(
    line: &str,
    max_width: f64,
    font_size: f32,
    measurer: &mut dyn TextMeasurer,
) -> CapbandResult<Vec<String>> {
    let mut rows = Vec::new();
    let mut acc = String::new();
    for ch in line.chars() {
        let mut candidate = acc.clone();
        candidate.push(ch);
        let width = measurer.measure_width(&candidate, font_size)?;
        if width > max_width && !acc.is_empty() {
            rows.push(acc);
            acc = String::from(ch);
        } else {
            acc = candidate;
        }
    }
    if !acc.is_empty() {
        rows.push(acc);
    }
    Ok(rows)
}
