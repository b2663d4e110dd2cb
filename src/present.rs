//! PNG packaging for finished composites.

use std::io::Cursor;
use std::path::Path;

use anyhow::Context;

use crate::compose::CompositeImage;
use crate::error::{CapbandError, CapbandResult};

/// Download name offered for a composite, stamped with the request time in
/// milliseconds.
pub fn suggested_filename(timestamp_ms: u64) -> String {
    format!("字幕图片_{timestamp_ms}.png")
}

/// Encode a composite as PNG bytes.
pub fn encode_png(composite: &CompositeImage) -> CapbandResult<Vec<u8>> {
    let rgba = straight_rgba_bytes(composite)?;
    let img = image::RgbaImage::from_raw(composite.width, composite.height, rgba)
        .ok_or_else(|| CapbandError::encode("composite byte len mismatch"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| CapbandError::encode(format!("encode png: {e}")))?;
    Ok(buf)
}

/// Write a composite to disk as a PNG, creating parent directories as
/// needed.
pub fn save_png(composite: &CompositeImage, path: &Path) -> CapbandResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let rgba = straight_rgba_bytes(composite)?;
    image::save_buffer_with_format(
        path,
        &rgba,
        composite.width,
        composite.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| CapbandError::encode(format!("write png {}: {e}", path.display())))?;
    Ok(())
}

/// Composites carry premultiplied pixels; PNG wants straight alpha.
fn straight_rgba_bytes(composite: &CompositeImage) -> CapbandResult<Vec<u8>> {
    let expected = (composite.width as usize)
        .saturating_mul(composite.height as usize)
        .saturating_mul(4);
    if composite.rgba8_premul.len() != expected {
        return Err(CapbandError::encode("composite byte len mismatch"));
    }
    let mut rgba = composite.rgba8_premul.clone();
    unpremultiply_rgba8_in_place(&mut rgba);
    Ok(rgba)
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            let v = (u16::from(*c) * 255 + a / 2) / a;
            *c = v.min(255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_embeds_timestamp() {
        assert_eq!(suggested_filename(1723456789000), "字幕图片_1723456789000.png");
    }

    #[test]
    fn encode_png_roundtrips_dimensions() {
        let composite = CompositeImage {
            width: 3,
            height: 2,
            rgba8_premul: vec![255; 3 * 2 * 4],
        };
        let png = encode_png(&composite).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }

    #[test]
    fn encode_png_unpremultiplies_pixels() {
        // Premul [40, 20, 10] at alpha 128 is straight [80, 40, 20].
        let composite = CompositeImage {
            width: 1,
            height: 1,
            rgba8_premul: vec![40, 20, 10, 128],
        };
        let png = encode_png(&composite).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        let px = decoded.get_pixel(0, 0).0;
        assert_eq!(px, [80, 40, 20, 128]);
    }

    #[test]
    fn encode_png_rejects_short_buffer() {
        let composite = CompositeImage {
            width: 2,
            height: 2,
            rgba8_premul: vec![0; 7],
        };
        assert!(encode_png(&composite).is_err());
    }

    #[test]
    fn save_png_creates_parent_dirs() {
        let tmp = std::env::temp_dir().join(format!(
            "capband_present_test_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let path = tmp.join("nested").join("out.png");

        let composite = CompositeImage {
            width: 2,
            height: 2,
            rgba8_premul: vec![255; 2 * 2 * 4],
        };
        save_png(&composite, &path).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 2));

        std::fs::remove_dir_all(&tmp).ok();
    }
}
