//! [Format 8](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-8-mixed-16-bit-and-32-bit-coverage):
//! mixed 16-bit and 32-bit coverage
//!
//! Microsoft platform fonts are not expected to use this format, so support
//! is limited to decoding the groups and searching them.

use super::format12::SequentialMapGroup;
use super::{control_code_glyph, format_char_glyph};
use crate::{FontData, GlyphId, ReadError};

#[derive(Clone, Debug)]
pub struct Cmap8 {
    is32: Box<[u8]>,
    groups: Vec<SequentialMapGroup>,
}

impl Cmap8 {
    const IS32_LEN: usize = 8192;

    pub(super) fn read(data: FontData<'_>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        // format, reserved, length, language
        cursor.advance_by(12);
        let is32 = cursor.read_vec::<u8>(Self::IS32_LEN)?.into_boxed_slice();
        let num_groups = cursor.read::<u32>()? as usize;
        if cursor.remaining_bytes() / SequentialMapGroup::RAW_BYTE_LEN < num_groups {
            return Err(ReadError::MalformedData("Format 8 table exceeded"));
        }
        let groups = SequentialMapGroup::read_groups(&mut cursor, num_groups)?;
        Ok(Self { is32, groups })
    }

    /// Returns true if the given 16-bit value is the first half of a 32-bit
    /// code.
    pub fn is_32_bit_lead(&self, value: u16) -> bool {
        let byte = self.is32[value as usize / 8];
        byte & (0x80 >> (value % 8)) != 0
    }

    /// Maps a code to a nominal glyph identifier.
    pub fn map_codepoint(&self, codepoint: u32) -> GlyphId {
        if let Some(gid) = control_code_glyph(codepoint, false) {
            return gid;
        }
        let index = self
            .groups
            .partition_point(|group| group.end_char_code < codepoint);
        self.groups
            .get(index)
            .and_then(|group| group.map(codepoint))
            .filter(|gid| !gid.is_notdef())
            .unwrap_or_else(|| format_char_glyph(codepoint))
    }
}
