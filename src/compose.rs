//! Subtitle-band composite planning and rendering.
//!
//! Composition runs in two passes. The plan pass turns a source image and
//! caption lines into pure geometry (band placement, wrapped rows, row
//! centers) using only a text measurer, so it is testable without a font or
//! a raster backend. The render pass walks that geometry and paints it with
//! `vello_cpu`.

use std::sync::Arc;

use kurbo::Affine;

use crate::assets::SourceImage;
use crate::error::{CapbandError, CapbandResult};
use crate::layout::{BandMetrics, TextMeasurer, wrap_line};
use crate::text::{EngineMeasurer, TextBrushRgba8, TextLayoutEngine};

/// Straight alpha of the darkening overlay painted on every band.
const OVERLAY_ALPHA: u8 = 153;

/// Finished composite frame.
#[derive(Clone, Debug)]
pub struct CompositeImage {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Vec<u8>,
}

/// One wrapped caption row inside a band.
#[derive(Clone, Debug, PartialEq)]
pub struct RowPlan {
    pub text: String,
    /// Canvas-space y the row's visual center sits on.
    pub center_y: f64,
}

/// One subtitle band.
#[derive(Clone, Debug, PartialEq)]
pub struct BandPlan {
    /// Canvas-space top edge. Negative when the band is taller than the
    /// source image.
    pub top_y: i64,
    pub rows: Vec<RowPlan>,
}

/// Complete composite geometry, computed before any pixel is touched.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositePlan {
    pub width: u32,
    /// Canvas height: the source height plus one band per caption line
    /// after the first.
    pub height: u32,
    pub metrics: BandMetrics,
    pub bands: Vec<BandPlan>,
}

/// Compute the geometry for one composite.
///
/// The first band overlaps the bottom of the source image; each further
/// caption line extends the canvas by one band height, and the last band
/// ends exactly at the canvas bottom.
pub fn plan_composite(
    width: u32,
    height: u32,
    lines: &[String],
    measurer: &mut dyn TextMeasurer,
) -> CapbandResult<CompositePlan> {
    if lines.is_empty() {
        return Err(CapbandError::validation(
            "compose requires at least one caption line",
        ));
    }
    if width == 0 || height == 0 {
        return Err(CapbandError::validation(
            "source image must have non-zero dimensions",
        ));
    }

    let metrics = BandMetrics::for_image_height(height);
    let band_h = u64::from(metrics.band_height);
    let canvas_h = u64::from(height) + (lines.len() as u64 - 1) * band_h;
    if u64::from(width) > u64::from(u16::MAX) || canvas_h > u64::from(u16::MAX) {
        return Err(CapbandError::compose(format!(
            "composite {width}x{canvas_h} exceeds the u16 raster limit"
        )));
    }

    let max_width = metrics.max_text_width(width);
    let font_size = metrics.font_size as f32;

    let mut bands = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let top_y = if i == 0 {
            i64::from(height) - band_h as i64
        } else {
            i64::from(height) + (i as i64 - 1) * band_h as i64
        };

        let row_texts = wrap_line(line, max_width, font_size, measurer)?;
        let mut center_y = top_y as f64 + band_h as f64 / 2.0;
        let mut rows = Vec::with_capacity(row_texts.len());
        for text in row_texts {
            rows.push(RowPlan { text, center_y });
            center_y += f64::from(metrics.row_spacing);
        }
        bands.push(BandPlan { top_y, rows });
    }

    Ok(CompositePlan {
        width,
        height: canvas_h as u32,
        metrics,
        bands,
    })
}

/// Paint a plan onto a fresh canvas.
///
/// Draw order per band matches the plan order: backing strip, darkening
/// overlay, then caption rows. A row that overflows its band may be painted
/// over by the next band's strip.
pub fn render_composite(
    image: &SourceImage,
    plan: &CompositePlan,
    engine: &mut TextLayoutEngine,
    font_bytes: &[u8],
) -> CapbandResult<CompositeImage> {
    if image.width != plan.width {
        return Err(CapbandError::compose(
            "composite plan does not match the source image",
        ));
    }
    let width_u16: u16 = plan
        .width
        .try_into()
        .map_err(|_| CapbandError::compose("composite width exceeds u16"))?;
    let height_u16: u16 = plan
        .height
        .try_into()
        .map_err(|_| CapbandError::compose("composite height exceeds u16"))?;

    let src_w = f64::from(image.width);
    let src_h_total = f64::from(image.height);
    let band_h = f64::from(plan.metrics.band_height);
    // The strip always samples the bottom of the source image, stretched
    // vertically to band height when the image is shorter than a band.
    let strip_src_y = (src_h_total - band_h).max(0.0);
    let strip_src_h = band_h.min(src_h_total);

    let paint = image_to_paint(image)?;
    let font =
        vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes.to_vec()), 0);
    let ink = TextBrushRgba8 {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
    ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

    // Source image at the canvas origin.
    ctx.set_transform(affine_to_cpu(Affine::IDENTITY));
    ctx.set_paint(paint.clone());
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, src_w, src_h_total));

    for band in &plan.bands {
        let top = band.top_y as f64;

        // Backing strip: map the source's bottom strip onto this band.
        let strip_tr = Affine::translate((0.0, top))
            * Affine::scale_non_uniform(1.0, band_h / strip_src_h)
            * Affine::translate((0.0, -strip_src_y));
        ctx.set_transform(affine_to_cpu(strip_tr));
        ctx.set_paint(paint.clone());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            strip_src_y,
            src_w,
            strip_src_y + strip_src_h,
        ));

        // Darkening overlay over the whole band.
        ctx.set_transform(affine_to_cpu(Affine::IDENTITY));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, OVERLAY_ALPHA));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, top, src_w, top + band_h));

        for row in &band.rows {
            let layout = engine.layout_row(
                &row.text,
                font_bytes,
                plan.metrics.font_size as f32,
                ink,
            )?;
            let tx = (f64::from(plan.width) - f64::from(layout.width())) / 2.0;
            let ty = row.center_y - f64::from(layout.height()) / 2.0;
            ctx.set_transform(affine_to_cpu(Affine::translate((tx, ty))));
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        }
    }

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
    ctx.render_to_pixmap(&mut pixmap);

    Ok(CompositeImage {
        width: plan.width,
        height: plan.height,
        rgba8_premul: pixmap.data_as_u8_slice().to_vec(),
    })
}

/// Plan and render in one call, measuring with the same engine and font
/// that will paint the glyphs.
#[tracing::instrument(skip(image, lines, engine, font_bytes))]
pub fn compose(
    image: &SourceImage,
    lines: &[String],
    engine: &mut TextLayoutEngine,
    font_bytes: &[u8],
) -> CapbandResult<CompositeImage> {
    let plan = {
        let mut measurer = EngineMeasurer {
            engine: &mut *engine,
            font_bytes,
        };
        plan_composite(image.width, image.height, lines, &mut measurer)?
    };
    render_composite(image, &plan, engine, font_bytes)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn image_to_paint(image: &SourceImage) -> CapbandResult<vello_cpu::Image> {
    let w: u16 = image
        .width
        .try_into()
        .map_err(|_| CapbandError::compose("source width exceeds u16"))?;
    let h: u16 = image
        .height
        .try_into()
        .map_err(|_| CapbandError::compose("source height exceeds u16"))?;
    if image.rgba8_premul.len()
        != (image.width as usize)
            .saturating_mul(image.height as usize)
            .saturating_mul(4)
    {
        return Err(CapbandError::compose("source byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (image.width as usize) * (image.height as usize),
    );
    for px in image.rgba8_premul.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}
