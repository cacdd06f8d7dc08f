//! [Format 6](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-6-trimmed-table-mapping):
//! trimmed table mapping

use std::sync::Arc;

use super::map_bmp_codepoint;
use crate::encoding::TranslationTable;
use crate::{FontData, GlyphId, ReadError};

/// A dense mapping of the contiguous code range
/// `first_code..first_code + entry_count`.
#[derive(Clone, Debug)]
pub struct Cmap6 {
    first_code: u16,
    glyph_ids: Vec<u16>,
    pub(super) translation: Option<Arc<TranslationTable>>,
}

impl Cmap6 {
    pub(super) fn read(
        data: FontData<'_>,
        subtable_len: usize,
        translation: Option<Arc<TranslationTable>>,
    ) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        // format, length, language
        cursor.advance_by(6);
        let first_code: u16 = cursor.read()?;
        let entry_count = cursor.read::<u16>()? as usize;
        let available = subtable_len.saturating_sub(cursor.position()) / 2;
        if entry_count > available {
            log::warn!("cmap format 6 declares {entry_count} entries, only {available} present");
        }
        let glyph_ids = cursor.read_vec::<u16>(entry_count.min(available))?;
        Ok(Self {
            first_code,
            glyph_ids,
            translation,
        })
    }

    /// The first code mapped by this subtable.
    pub fn first_code(&self) -> u16 {
        self.first_code
    }

    /// Maps a codepoint to a nominal glyph identifier.
    pub fn map_codepoint(&self, codepoint: u32) -> GlyphId {
        map_bmp_codepoint(codepoint, self.translation.as_deref(), |code| {
            let index = code.checked_sub(self.first_code as u32)?;
            self.glyph_ids
                .get(index as usize)
                .map(|gid| GlyphId::new(*gid))
        })
    }
}
