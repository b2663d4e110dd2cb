//! Parley-backed text shaping for caption rows.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::error::{CapbandError, CapbandResult};
use crate::layout::TextMeasurer;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

/// Stateful helper for building Parley caption layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Construct a new layout engine with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape one caption row with the provided font bytes.
    ///
    /// Rows are wrapped before they get here, so the layout is always built
    /// unconstrained as a single line. Captions render bold.
    pub fn layout_row(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> CapbandResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CapbandError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CapbandError::validation("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CapbandError::validation("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::BOLD,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        Ok(layout)
    }
}

/// Adapts [`TextLayoutEngine`] to the wrap pass, which only needs advance
/// widths.
pub struct EngineMeasurer<'a> {
    pub engine: &'a mut TextLayoutEngine,
    pub font_bytes: &'a [u8],
}

impl TextMeasurer for EngineMeasurer<'_> {
    fn measure_width(&mut self, text: &str, font_size: f32) -> CapbandResult<f64> {
        // The brush never changes advance widths.
        let layout = self.engine.layout_row(
            text,
            self.font_bytes,
            font_size,
            TextBrushRgba8::default(),
        )?;
        Ok(f64::from(layout.width()))
    }
}

/// Stems tried first when scanning system font directories, widest coverage
/// first.
const PREFERRED_FONT_STEMS: [&str; 6] = [
    "NotoSansCJK",
    "NotoSans",
    "DejaVuSans",
    "LiberationSans",
    "Arial",
    "Helvetica",
];

fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("C:\\Windows\\Fonts"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
    }
    dirs
}

fn collect_font_files(dir: &Path, depth: u32, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if depth < 3 {
                collect_font_files(&path, depth + 1, out);
            }
            continue;
        }
        let is_font = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"));
        if is_font {
            out.push(path);
        }
    }
}

/// Locate a usable font file on the host, preferring broad-coverage
/// families.
///
/// Scan order and the sort below keep the result stable for a given
/// machine.
pub fn find_default_font() -> CapbandResult<PathBuf> {
    let mut found = Vec::new();
    for dir in font_dirs() {
        collect_font_files(&dir, 0, &mut found);
    }
    found.sort();

    for stem in PREFERRED_FONT_STEMS {
        let want = stem.to_ascii_lowercase();
        let hit = found.iter().find(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.to_ascii_lowercase().starts_with(&want))
        });
        if let Some(path) = hit {
            return Ok(path.clone());
        }
    }

    found.into_iter().next().ok_or_else(|| {
        CapbandError::validation("no font file found in the standard font directories")
    })
}

/// Read font bytes from disk.
pub fn load_font_bytes(path: &Path) -> CapbandResult<Vec<u8>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read font file {}", path.display()))?;
    Ok(bytes)
}

/// Locate and read a host font in one step.
pub fn discover_font_bytes() -> CapbandResult<Vec<u8>> {
    let path = find_default_font()?;
    load_font_bytes(&path)
}
