//! Font metric tables for the overlay text font.
//!
//! Widths are stored in em units (relative to font size). A table is either read
//! from the real overlay font (`cmap` + `hmtx` via ttf-parser) or falls back to the
//! static CJK approximation: fullwidth glyphs are 1 em, everything else 0.5 em.
//! Effect text is normalized to fullwidth before layout, so the approximation is
//! close for nearly every character that reaches the wrapper.

use std::collections::HashMap;

use thiserror::Error;

/// Millimetres per typographic point.
pub const MM_PER_POINT: f32 = 25.4 / 72.0;

// ────────────────────────────────────────────────────────────────────────────
// Measurement seam
// ────────────────────────────────────────────────────────────────────────────

/// Anything that can report the rendered width of a string.
///
/// The reflow engine only ever talks to this trait, so it can be driven by the
/// PDF sink, a recording sink, or a bare metric table in tests.
pub trait TextMeasure {
    fn text_width_mm(&self, text: &str, font_size_pt: f32) -> f32;
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse font: {0}")]
    Parse(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Per-character advance widths in em units.
///
/// Characters missing from `advances` use `fullwidth_em` or `halfwidth_em`
/// depending on their East Asian width class.
#[derive(Debug, Clone)]
pub struct FontMetricTable {
    advances: HashMap<char, f32>,
    pub fullwidth_em: f32,
    pub halfwidth_em: f32,
}

impl FontMetricTable {
    /// Static approximation for a CJK text face such as KaiTi.
    pub fn cjk_default() -> Self {
        Self {
            advances: HashMap::new(),
            fullwidth_em: 1.0,
            halfwidth_em: 0.5,
        }
    }

    /// Reads horizontal advances for every Unicode code point mapped by the font.
    pub fn from_font_bytes(data: &[u8]) -> Result<Self, FontError> {
        let face = ttf_parser::Face::parse(data, 0).map_err(|e| FontError::Parse(e.to_string()))?;
        let units_per_em = face.units_per_em() as f32;
        if units_per_em <= 0.0 {
            return Err(FontError::Parse("units_per_em is zero".to_string()));
        }

        let mut advances = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|code_point| {
                    let Some(c) = char::from_u32(code_point) else {
                        return;
                    };
                    let advance = subtable
                        .glyph_index(code_point)
                        .and_then(|gid| face.glyph_hor_advance(gid));
                    if let Some(advance) = advance {
                        advances.entry(c).or_insert(advance as f32 / units_per_em);
                    }
                });
            }
        }

        if advances.is_empty() {
            return Err(FontError::Parse("font has no unicode cmap".to_string()));
        }

        Ok(Self {
            advances,
            ..Self::cjk_default()
        })
    }

    pub fn char_width_em(&self, c: char) -> f32 {
        if let Some(w) = self.advances.get(&c) {
            return *w;
        }
        if is_wide(c) {
            self.fullwidth_em
        } else {
            self.halfwidth_em
        }
    }

    /// Measures the rendered width of a string in em units.
    pub fn measure_em(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width_em(c)).sum()
    }
}

impl TextMeasure for FontMetricTable {
    fn text_width_mm(&self, text: &str, font_size_pt: f32) -> f32 {
        self.measure_em(text) * font_size_pt * MM_PER_POINT
    }
}

/// True for characters that occupy a full em in CJK typesetting.
fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F       // Hangul Jamo
        | 0x2460..=0x24FF     // Enclosed alphanumerics (①..⑩)
        | 0x25A0..=0x25FF     // Geometric shapes (●)
        | 0x2E80..=0x303E     // CJK radicals, symbols and punctuation
        | 0x3041..=0x33FF     // Kana, CJK compatibility
        | 0x3400..=0x4DBF     // CJK extension A
        | 0x4E00..=0x9FFF     // CJK unified ideographs
        | 0xA960..=0xA97F
        | 0xAC00..=0xD7A3     // Hangul syllables
        | 0xF900..=0xFAFF     // CJK compatibility ideographs
        | 0xFE30..=0xFE4F     // CJK compatibility forms
        | 0xFF01..=0xFF60     // Fullwidth forms
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x3FFFD)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
