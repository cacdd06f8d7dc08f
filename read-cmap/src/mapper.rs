//! Character to glyph mapping bounded by a font's glyph count.

use crate::tables::cmap::{Charmap, CmapSelector};
use crate::{GlyphId, ReadError, TableProvider, INVISIBLE_GLYPHS};

/// Maps characters to glyph codes that are safe to render with a font.
///
/// A cmap may reference glyphs the font does not have. Those lookups are
/// replaced by the missing glyph, while the invisible glyph codes at the top
/// of the glyph code space pass through unchanged.
#[derive(Clone, Debug)]
pub struct GlyphMapper {
    charmap: Charmap,
    num_glyphs: u32,
}

impl GlyphMapper {
    const MISSING_GLYPH: u32 = 0;

    pub fn new(charmap: Charmap, num_glyphs: u16) -> Self {
        Self {
            charmap,
            num_glyphs: num_glyphs as u32,
        }
    }

    /// Creates a mapper for a font, using the null mapping if its cmap table
    /// is missing or unusable.
    ///
    /// Fails only if the glyph count cannot be read.
    pub fn from_font<'a>(
        selector: &CmapSelector,
        font: &impl TableProvider<'a>,
    ) -> Result<Self, ReadError> {
        let num_glyphs = font.num_glyphs()?;
        let charmap = match font.cmap() {
            Ok(cmap) => selector.select_or_null(cmap),
            Err(e) => {
                log::warn!("{e}, mapping nothing");
                Charmap::null()
            }
        };
        Ok(Self::new(charmap, num_glyphs))
    }

    pub fn charmap(&self) -> &Charmap {
        &self.charmap
    }

    pub fn num_glyphs(&self) -> u32 {
        self.num_glyphs
    }

    /// The glyph substituted for unmapped characters.
    pub fn missing_glyph(&self) -> u32 {
        Self::MISSING_GLYPH
    }

    /// Maps a code point to a glyph code.
    pub fn char_to_glyph(&self, codepoint: u32) -> u32 {
        self.bounded(self.charmap.map(codepoint))
    }

    /// Maps a code point and variation selector to a glyph code.
    pub fn char_to_variation_glyph(&self, codepoint: u32, selector: u32) -> u32 {
        self.bounded(self.charmap.map_variant(codepoint, selector))
    }

    /// Maps UTF-16 text to glyph codes, one per code unit.
    ///
    /// A surrogate pair produces the glyph for the supplementary character
    /// followed by the invisible glyph. Unpaired surrogates are looked up as
    /// they are. At most `min(text.len(), glyphs.len())` entries are written.
    pub fn chars_to_glyphs(&self, text: &[u16], glyphs: &mut [u32]) {
        let len = text.len().min(glyphs.len());
        let mut i = 0;
        while i < len {
            let unit = text[i] as u32;
            match (unit, text.get(i + 1).filter(|_| i + 1 < len)) {
                (0xD800..=0xDBFF, Some(&(low @ 0xDC00..=0xDFFF))) => {
                    let codepoint = 0x10000 + ((unit - 0xD800) << 10) + (low as u32 - 0xDC00);
                    glyphs[i] = self.char_to_glyph(codepoint);
                    glyphs[i + 1] = GlyphId::INVISIBLE.to_u32();
                    i += 2;
                }
                _ => {
                    glyphs[i] = self.char_to_glyph(unit);
                    i += 1;
                }
            }
        }
    }

    /// Returns `true` if the code point maps to something other than the
    /// missing glyph.
    pub fn can_display(&self, codepoint: u32) -> bool {
        self.char_to_glyph(codepoint) != Self::MISSING_GLYPH
    }

    fn bounded(&self, glyph: GlyphId) -> u32 {
        let glyph = glyph.to_u32();
        if glyph < self.num_glyphs || glyph >= INVISIBLE_GLYPHS {
            glyph
        } else {
            Self::MISSING_GLYPH
        }
    }
}
