//! [Format 12](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-12-segmented-coverage):
//! segmented coverage

use super::{control_code_glyph, format_char_glyph};
use crate::{Cursor, FontData, GlyphId, ReadError};

/// A `(startCharCode, endCharCode, startGlyphID)` record, shared by formats 8
/// and 12.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

impl SequentialMapGroup {
    pub(super) const RAW_BYTE_LEN: usize = 12;

    pub(super) fn read_groups(
        cursor: &mut Cursor<'_>,
        count: usize,
    ) -> Result<Vec<Self>, ReadError> {
        let len = count.checked_mul(3).ok_or(ReadError::OutOfBounds)?;
        let raw = cursor.read_vec::<u32>(len)?;
        Ok(raw
            .chunks_exact(3)
            .map(|chunk| Self {
                start_char_code: chunk[0],
                end_char_code: chunk[1],
                start_glyph_id: chunk[2],
            })
            .collect())
    }

    /// The glyph for `codepoint` if this group covers it. Glyph ids are
    /// truncated to 16 bits.
    pub(super) fn map(&self, codepoint: u32) -> Option<GlyphId> {
        if !(self.start_char_code..=self.end_char_code).contains(&codepoint) {
            return None;
        }
        let gid = self
            .start_glyph_id
            .wrapping_add(codepoint - self.start_char_code);
        Some(GlyphId::new(gid as u16))
    }
}

#[derive(Clone, Debug)]
pub struct Cmap12 {
    groups: Vec<SequentialMapGroup>,
    // largest power of two <= groups.len(), and the remainder
    power: usize,
    extra: usize,
}

impl Cmap12 {
    pub(super) fn read(data: FontData<'_>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        // format, reserved, length, language
        cursor.advance_by(12);
        let num_groups = cursor.read::<u32>()? as usize;
        if cursor.remaining_bytes() / SequentialMapGroup::RAW_BYTE_LEN < num_groups {
            return Err(ReadError::MalformedData("Format 12 table exceeded"));
        }
        let groups = SequentialMapGroup::read_groups(&mut cursor, num_groups)?;
        let power = match num_groups {
            0 => 0,
            n => 1 << n.ilog2(),
        };
        Ok(Self {
            extra: num_groups - power,
            power,
            groups,
        })
    }

    /// The sequential map groups, in table order.
    pub fn groups(&self) -> &[SequentialMapGroup] {
        &self.groups
    }

    /// Maps a codepoint to a nominal glyph identifier.
    pub fn map_codepoint(&self, codepoint: u32) -> GlyphId {
        if let Some(gid) = control_code_glyph(codepoint, false) {
            return gid;
        }
        self.lookup(codepoint)
            .filter(|gid| !gid.is_notdef())
            .unwrap_or_else(|| format_char_glyph(codepoint))
    }

    fn lookup(&self, codepoint: u32) -> Option<GlyphId> {
        if self.groups.is_empty() {
            return None;
        }
        let start = |index: usize| self.groups[index].start_char_code;
        let mut range = 0;
        if self.extra > 0 && codepoint >= start(self.extra) {
            range = self.extra;
        }
        let mut step = self.power;
        while step > 1 {
            step >>= 1;
            if codepoint >= start(range + step) {
                range += step;
            }
        }
        self.groups[range].map(codepoint)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    #[test]
    fn groups_map_sequentially() {
        let bytes = cmap_test_data::format12(&[
            (0x20, 0x7E, 3),
            (0x4E00, 0x4E10, 100),
            (0x1_F600, 0x1_F64F, 500),
        ]);
        let cmap = Cmap12::read(FontData::new(&bytes)).unwrap();
        assert_eq!(cmap.groups().len(), 3);
        assert_eq!(cmap.map_codepoint(0x20), GlyphId::new(3));
        assert_eq!(cmap.map_codepoint(0x41), GlyphId::new(36));
        assert_eq!(cmap.map_codepoint(0x4E10), GlyphId::new(116));
        assert_eq!(cmap.map_codepoint(0x1_F601), GlyphId::new(501));
        assert_eq!(cmap.map_codepoint(0x7F), GlyphId::NOTDEF);
        assert_eq!(cmap.map_codepoint(0x1F), GlyphId::NOTDEF);
        assert_eq!(cmap.map_codepoint(0x10_FFFF), GlyphId::NOTDEF);
    }

    #[test]
    fn empty() {
        let bytes = cmap_test_data::format12(&[]);
        let cmap = Cmap12::read(FontData::new(&bytes)).unwrap();
        assert_eq!(cmap.map_codepoint(0x41), GlyphId::NOTDEF);
        assert_eq!(cmap.map_codepoint(0x0A), GlyphId::INVISIBLE);
    }

    #[test]
    fn group_count_past_end() {
        let mut bytes = cmap_test_data::format12(&[(0x20, 0x7E, 3)]);
        bytes.write_at(12, 2_u32);
        assert_eq!(
            Cmap12::read(FontData::new(&bytes)).unwrap_err(),
            ReadError::MalformedData("Format 12 table exceeded")
        );
    }

    // The power of two search must agree with a plain scan for every group
    // count, not just powers of two.
    #[test]
    fn search_matches_linear_scan() {
        let mut rng = StdRng::seed_from_u64(0x636d6170);
        for num_groups in 1..40u32 {
            let groups = (0..num_groups)
                .map(|i| (i * 100 + 10, i * 100 + 10 + rng.gen_range(0..50), i * 7 + 1))
                .collect::<Vec<_>>();
            let bytes = cmap_test_data::format12(&groups);
            let cmap = Cmap12::read(FontData::new(&bytes)).unwrap();
            for _ in 0..200 {
                let cp = rng.gen_range(0x20..num_groups * 100 + 100);
                let expected = groups
                    .iter()
                    .find(|(start, end, _)| (*start..=*end).contains(&cp))
                    .map(|(start, _, gid)| GlyphId::new((gid + cp - start) as u16))
                    .unwrap_or(GlyphId::NOTDEF);
                assert_eq!(cmap.map_codepoint(cp), expected, "{num_groups} groups, {cp:#x}");
            }
        }
    }
}
