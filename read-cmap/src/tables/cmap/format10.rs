//! [Format 10](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-10-trimmed-array):
//! trimmed array

use super::{control_code_glyph, format_char_glyph};
use crate::{FontData, GlyphId, ReadError};

/// The 32-bit analogue of format 6.
#[derive(Clone, Debug)]
pub struct Cmap10 {
    start_char_code: u32,
    glyph_ids: Vec<u16>,
}

impl Cmap10 {
    pub(super) fn read(data: FontData<'_>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        // format, reserved, length, language
        cursor.advance_by(12);
        let start_char_code: u32 = cursor.read()?;
        let num_chars = cursor.read::<u32>()? as usize;
        if cursor.remaining_bytes() / 2 < num_chars {
            return Err(ReadError::MalformedData("Format 10 table exceeded"));
        }
        let glyph_ids = cursor.read_vec::<u16>(num_chars)?;
        Ok(Self {
            start_char_code,
            glyph_ids,
        })
    }

    /// Maps a codepoint to a nominal glyph identifier.
    pub fn map_codepoint(&self, codepoint: u32) -> GlyphId {
        if let Some(gid) = control_code_glyph(codepoint, false) {
            return gid;
        }
        codepoint
            .checked_sub(self.start_char_code)
            .and_then(|index| self.glyph_ids.get(index as usize))
            .map(|gid| GlyphId::new(*gid))
            .filter(|gid| !gid.is_notdef())
            .unwrap_or_else(|| format_char_glyph(codepoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_array() {
        let bytes = cmap_test_data::format10(0x1_F600, &[7, 8, 9]);
        let cmap = Cmap10::read(FontData::new(&bytes)).unwrap();
        assert_eq!(cmap.map_codepoint(0x1_F600), GlyphId::new(7));
        assert_eq!(cmap.map_codepoint(0x1_F602), GlyphId::new(9));
        assert_eq!(cmap.map_codepoint(0x1_F603), GlyphId::NOTDEF);
        assert_eq!(cmap.map_codepoint(0x1_F5FF), GlyphId::NOTDEF);
    }

    #[test]
    fn count_past_end() {
        let mut bytes = cmap_test_data::format10(0x1_F600, &[7]);
        bytes.write_at(16, 0xFFFF_FFFF_u32);
        assert!(Cmap10::read(FontData::new(&bytes)).is_err());
    }
}
