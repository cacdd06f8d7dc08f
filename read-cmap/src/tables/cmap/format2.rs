//! [Format 2](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-2-high-byte-mapping-through-table):
//! high-byte mapping through table

use std::sync::Arc;

use super::map_bmp_codepoint;
use crate::encoding::TranslationTable;
use crate::{FontData, GlyphId, ReadError};

/// A sub-header record of a format 2 subtable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubHeader {
    /// First valid low byte for this sub-header.
    pub first_code: u16,
    /// Number of valid low bytes for this sub-header.
    pub entry_count: u16,
    /// Added to non-zero glyph indices, modulo 65536.
    pub id_delta: i16,
    /// Byte distance from this field to the first glyph index of the
    /// sub-header's range.
    pub id_range_offset: u16,
}

/// A mapping for mixed 8/16-bit encodings.
///
/// The high byte of a code indexes `sub_header_keys`, which selects the
/// sub-header used to map the low byte. Sub-header zero is used for single
/// byte codes.
#[derive(Clone, Debug)]
pub struct Cmap2 {
    sub_header_keys: Box<[u16]>,
    sub_headers: Vec<SubHeader>,
    glyph_index_array: Vec<u16>,
    pub(super) translation: Option<Arc<TranslationTable>>,
}

impl Cmap2 {
    // format, length, language and the 256 sub-header keys
    const SUB_HEADERS_START: usize = 6 + 256 * 2;

    pub(super) fn read(
        data: FontData<'_>,
        subtable_len: usize,
        translation: Option<Arc<TranslationTable>>,
    ) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance_by(6);
        let sub_header_keys = cursor.read_vec::<u16>(256)?.into_boxed_slice();
        // keys are sub-header index * 8
        let max_key = sub_header_keys.iter().copied().max().unwrap_or_default();
        let num_sub_headers = (max_key >> 3) as usize + 1;
        let mut sub_headers = Vec::with_capacity(num_sub_headers);
        for _ in 0..num_sub_headers {
            sub_headers.push(SubHeader {
                first_code: cursor.read()?,
                entry_count: cursor.read()?,
                id_delta: cursor.read()?,
                id_range_offset: cursor.read()?,
            });
        }
        let headers_end = Self::SUB_HEADERS_START + num_sub_headers * 8;
        let array_len = subtable_len.saturating_sub(headers_end) / 2;
        let array_len = array_len.min(cursor.remaining_bytes() / 2);
        let glyph_index_array = cursor.read_vec::<u16>(array_len)?;
        Ok(Self {
            sub_header_keys,
            sub_headers,
            glyph_index_array,
            translation,
        })
    }

    /// The sub-header records.
    pub fn sub_headers(&self) -> &[SubHeader] {
        &self.sub_headers
    }

    /// Maps a codepoint to a nominal glyph identifier.
    pub fn map_codepoint(&self, codepoint: u32) -> GlyphId {
        map_bmp_codepoint(codepoint, self.translation.as_deref(), |code| {
            self.lookup(code)
        })
    }

    fn lookup(&self, code: u32) -> Option<GlyphId> {
        let high_byte = ((code >> 8) & 0xFF) as u16;
        let low_byte = (code & 0xFF) as u16;
        let key = (*self.sub_header_keys.get(high_byte as usize)? >> 3) as usize;
        // Sub-header zero maps single byte codes. If the high byte is itself a
        // single byte code, it is the byte we map.
        let map_me = if key != 0 || high_byte == 0 {
            low_byte
        } else {
            high_byte
        };
        let sub_header = self.sub_headers.get(key)?;
        let index = map_me.checked_sub(sub_header.first_code)?;
        if index >= sub_header.entry_count {
            return None;
        }
        // id_range_offset counts bytes from the sub-header's own
        // id_range_offset field. The glyph index array follows the
        // sub-headers, so that field is (N - key) * 8 - 6 bytes before it.
        let glyph_array_offset = ((self.sub_headers.len() - key) * 8 - 6) as i64;
        let sub_array_start = (sub_header.id_range_offset as i64 - glyph_array_offset) / 2;
        let glyph_index = usize::try_from(sub_array_start + index as i64).ok()?;
        let gid = *self.glyph_index_array.get(glyph_index)?;
        (gid != 0).then(|| GlyphId::new(gid.wrapping_add_signed(sub_header.id_delta)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_width_table() -> cmap_test_data::BeBuffer {
        let mut single = [0u16; 256];
        single[0x41] = 10;
        single[0x61] = 11;
        cmap_test_data::format2(
            &[(0x81, 1), (0x82, 2)],
            &[
                (0, 0, &single[..]),
                (0x40, 0, &[20, 0, 22][..]),
                (0x50, -5, &[30, 31][..]),
            ],
        )
    }

    #[test]
    fn single_byte_codes() {
        let bytes = mixed_width_table();
        let cmap = Cmap2::read(FontData::new(&bytes), bytes.len(), None).unwrap();
        assert_eq!(cmap.sub_headers().len(), 3);
        assert_eq!(cmap.map_codepoint(0x41), GlyphId::new(10));
        assert_eq!(cmap.map_codepoint(0x61), GlyphId::new(11));
        assert_eq!(cmap.map_codepoint(0x62), GlyphId::NOTDEF);
    }

    #[test]
    fn double_byte_codes() {
        let bytes = mixed_width_table();
        let cmap = Cmap2::read(FontData::new(&bytes), bytes.len(), None).unwrap();
        assert_eq!(cmap.map_codepoint(0x8140), GlyphId::new(20));
        // explicit zero in the glyph array
        assert_eq!(cmap.map_codepoint(0x8141), GlyphId::NOTDEF);
        assert_eq!(cmap.map_codepoint(0x8142), GlyphId::new(22));
        // past entry_count
        assert_eq!(cmap.map_codepoint(0x8143), GlyphId::NOTDEF);
        // below first_code
        assert_eq!(cmap.map_codepoint(0x813F), GlyphId::NOTDEF);
        // id_delta applies to non-zero entries
        assert_eq!(cmap.map_codepoint(0x8250), GlyphId::new(25));
        assert_eq!(cmap.map_codepoint(0x8251), GlyphId::new(26));
    }

    #[test]
    fn high_byte_without_sub_header_maps_high_byte() {
        let bytes = mixed_width_table();
        let cmap = Cmap2::read(FontData::new(&bytes), bytes.len(), None).unwrap();
        // 0x41 has no sub-header of its own, so it is a single byte code
        assert_eq!(cmap.map_codepoint(0x4142), GlyphId::new(10));
        assert_eq!(cmap.map_codepoint(0x4100), GlyphId::new(10));
    }

    #[test]
    fn truncated_glyph_array() {
        let bytes = mixed_width_table();
        // drop the last sub-header's glyphs
        let truncated = &bytes[..bytes.len() - 4];
        let cmap = Cmap2::read(FontData::new(truncated), bytes.len(), None).unwrap();
        assert_eq!(cmap.map_codepoint(0x8142), GlyphId::new(22));
        assert_eq!(cmap.map_codepoint(0x8250), GlyphId::NOTDEF);
    }
}
