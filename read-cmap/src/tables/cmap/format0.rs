//! [Format 0](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-0-byte-encoding-table):
//! byte encoding table

use std::sync::Arc;

use super::map_bmp_codepoint;
use crate::encoding::TranslationTable;
use crate::{FontData, GlyphId, ReadError};

/// A flat 256 entry mapping from single byte codes to glyph identifiers.
#[derive(Clone, Debug)]
pub struct Cmap0 {
    glyph_ids: Box<[u8]>,
    pub(super) translation: Option<Arc<TranslationTable>>,
}

impl Cmap0 {
    const NUM_CODES: usize = 256;

    pub(super) fn read(
        data: FontData<'_>,
        translation: Option<Arc<TranslationTable>>,
    ) -> Result<Self, ReadError> {
        // format, length, language
        let mut cursor = data.cursor();
        cursor.advance_by(6);
        let glyph_ids = cursor.read_vec::<u8>(Self::NUM_CODES)?.into_boxed_slice();
        Ok(Self {
            glyph_ids,
            translation,
        })
    }

    /// Maps a codepoint to a nominal glyph identifier.
    pub fn map_codepoint(&self, codepoint: u32) -> GlyphId {
        map_bmp_codepoint(codepoint, self.translation.as_deref(), |code| {
            let gid = *self.glyph_ids.get(code as usize)?;
            Some(GlyphId::new(gid as u16))
        })
    }
}
