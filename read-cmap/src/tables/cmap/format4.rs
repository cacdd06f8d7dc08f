//! [Format 4](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-4-segment-mapping-to-delta-values):
//! segment mapping to delta values

use std::ops::Range;
use std::sync::Arc;

use super::map_bmp_codepoint;
use crate::encoding::TranslationTable;
use crate::{FontData, GlyphId, ReadError};

/// A segmented mapping of the Basic Multilingual Plane.
///
/// Segments are described by four parallel arrays, expected to be sorted by
/// `end_code`.
#[derive(Clone, Debug)]
pub struct Cmap4 {
    end_code: Vec<u16>,
    start_code: Vec<u16>,
    id_delta: Vec<i16>,
    /// Stored in units of glyph ids (the raw byte offset / 2).
    id_range_offset: Vec<u16>,
    glyph_ids: Vec<u16>,
    pub(super) translation: Option<Arc<TranslationTable>>,
}

impl Cmap4 {
    pub(super) fn read(
        data: FontData<'_>,
        subtable_len: usize,
        translation: Option<Arc<TranslationTable>>,
    ) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        // format, length, language
        cursor.advance_by(6);
        let seg_count = (cursor.read::<u16>()? / 2) as usize;
        // The binary search hints (searchRange, entrySelector, rangeShift)
        // are wrong in enough fonts that we ignore them.
        cursor.advance_by(6);
        let end_code = cursor.read_vec::<u16>(seg_count)?;
        // reservedPad
        cursor.advance::<u16>();
        let start_code = cursor.read_vec::<u16>(seg_count)?;
        let id_delta = cursor.read_vec::<i16>(seg_count)?;
        let id_range_offset = cursor
            .read_vec::<u16>(seg_count)?
            .into_iter()
            .map(|offset| offset >> 1)
            .collect();
        // everything from here to the end of the subtable is glyph ids
        let num_glyph_ids = (subtable_len / 2)
            .saturating_sub(cursor.position() / 2)
            .min(cursor.remaining_bytes() / 2);
        let glyph_ids = cursor.read_vec::<u16>(num_glyph_ids)?;
        Ok(Self {
            end_code,
            start_code,
            id_delta,
            id_range_offset,
            glyph_ids,
            translation,
        })
    }

    /// The number of segments.
    pub fn seg_count(&self) -> usize {
        self.end_code.len()
    }

    /// Maps a codepoint to a nominal glyph identifier.
    pub fn map_codepoint(&self, codepoint: u32) -> GlyphId {
        map_bmp_codepoint(codepoint, self.translation.as_deref(), |code| {
            self.lookup(code)
        })
    }

    /// Returns an iterator over all (code, glyph identifier) pairs in the
    /// subtable.
    ///
    /// Codes are in the subtable's own encoding; neither the translation
    /// table nor the control code rules are applied.
    pub fn iter(&self) -> Cmap4Iter<'_> {
        Cmap4Iter::new(self)
    }

    fn lookup(&self, code: u32) -> Option<GlyphId> {
        // Search for the first segment whose end code is >= code. This is a
        // plain lower bound search so it terminates even if the segments are
        // not actually sorted.
        let seg_count = self.seg_count();
        let (mut left, mut right) = (0, seg_count);
        let mut index = seg_count >> 1;
        while left < right {
            if (self.end_code[index] as u32) < code {
                left = index + 1;
            } else {
                right = index;
            }
            index = (left + right) >> 1;
        }
        let start_code = *self.start_code.get(index)?;
        if code < start_code as u32 {
            return None;
        }
        self.lookup_glyph_id(code as u16, index, start_code)
    }

    /// Does the final phase of glyph id lookup.
    ///
    /// Shared between Self::lookup and Cmap4Iter.
    fn lookup_glyph_id(&self, code: u16, index: usize, start_code: u16) -> Option<GlyphId> {
        let delta = *self.id_delta.get(index)?;
        let range_offset = *self.id_range_offset.get(index)? as i64;
        if range_offset == 0 {
            return Some(GlyphId::new(code.wrapping_add_signed(delta)));
        }
        // id_range_offset is relative to its own position in the
        // id_range_offset array, which directly precedes the glyph ids.
        let glyph_index =
            range_offset - self.seg_count() as i64 + index as i64 + (code - start_code) as i64;
        let gid = *self.glyph_ids.get(usize::try_from(glyph_index).ok()?)?;
        (gid != 0).then(|| GlyphId::new(gid.wrapping_add_signed(delta)))
    }

    /// Returns the [start_code, end_code] range at the given index.
    fn code_range(&self, index: usize) -> Option<Range<u32>> {
        // Extend to u32 to ensure we don't overflow on the end + 1 bound
        // below.
        let start = *self.start_code.get(index)? as u32;
        let end = *self.end_code.get(index)? as u32;
        // Use end + 1 here because the range in the table is inclusive
        Some(start..end + 1)
    }
}

/// Iterator over all (code, glyph identifier) pairs in a format 4 subtable.
#[derive(Clone)]
pub struct Cmap4Iter<'a> {
    subtable: &'a Cmap4,
    cur_range: Range<u32>,
    cur_start_code: u16,
    cur_range_ix: usize,
}

impl<'a> Cmap4Iter<'a> {
    fn new(subtable: &'a Cmap4) -> Self {
        let cur_range = subtable.code_range(0).unwrap_or_default();
        let cur_start_code = cur_range.start as u16;
        Self {
            subtable,
            cur_range,
            cur_start_code,
            cur_range_ix: 0,
        }
    }
}

impl Iterator for Cmap4Iter<'_> {
    type Item = (u32, GlyphId);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(code) = self.cur_range.next() {
                let Some(glyph_id) = self.subtable.lookup_glyph_id(
                    code as u16,
                    self.cur_range_ix,
                    self.cur_start_code,
                ) else {
                    continue;
                };
                // The table might explicitly map some codes to 0. Avoid
                // returning those here.
                if glyph_id.is_notdef() {
                    continue;
                }
                return Some((code, glyph_id));
            } else {
                self.cur_range_ix += 1;
                self.cur_range = self.subtable.code_range(self.cur_range_ix)?;
                self.cur_start_code = self.cur_range.start as u16;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmap_test_data::{be_buffer, BeBuffer};

    fn read(bytes: &BeBuffer) -> Cmap4 {
        Cmap4::read(FontData::new(bytes), bytes.len(), None).unwrap()
    }

    #[test]
    fn delta_segments() {
        let bytes = cmap_test_data::format4(&[(0x41, 0x5A, 1), (0x61, 0x7A, 100)]);
        let cmap = read(&bytes);
        // two segments plus the terminating 0xFFFF segment
        assert_eq!(cmap.seg_count(), 3);
        for code in 0x41..=0x5A {
            assert_eq!(cmap.map_codepoint(code), GlyphId::new((code - 0x40) as u16));
        }
        assert_eq!(cmap.map_codepoint(0x61), GlyphId::new(100));
        assert_eq!(cmap.map_codepoint(0x7A), GlyphId::new(125));
        for code in [0x20, 0x40, 0x5B, 0x60, 0x7B, 0xFFFE] {
            assert_eq!(cmap.map_codepoint(code), GlyphId::NOTDEF, "{code:#x}");
        }
    }

    #[test]
    fn identity_delta_round_trip() {
        // a single segment with idDelta = 0 maps every code to itself
        let bytes =
            cmap_test_data::format4_segments(&[(0x41, 0x5A, 0, 0), (0xFFFF, 0xFFFF, 1, 0)], &[]);
        let cmap = read(&bytes);
        for code in 0x41..=0x5A_u32 {
            assert_eq!(cmap.map_codepoint(code).to_u32(), code);
        }
        assert_eq!(cmap.map_codepoint(0x40), GlyphId::NOTDEF);
        assert_eq!(cmap.map_codepoint(0x5B), GlyphId::NOTDEF);
    }

    #[test]
    fn delta_wraps_modulo_65536() {
        let bytes = cmap_test_data::format4_segments(
            &[(0xFFF0, 0xFFF2, 0x20, 0), (0xFFFF, 0xFFFF, 1, 0)],
            &[],
        );
        let cmap = read(&bytes);
        assert_eq!(cmap.map_codepoint(0xFFF0), GlyphId::new(0x10));
        assert_eq!(cmap.map_codepoint(0xFFF2), GlyphId::new(0x12));
    }

    #[test]
    fn range_offset_segments() {
        // segment 0 uses the glyph id array; offset is measured from its own
        // id_range_offset entry: 2 segments * 2 bytes = 4
        let bytes = cmap_test_data::format4_segments(
            &[(0x30, 0x33, 5, 4), (0xFFFF, 0xFFFF, 1, 0)],
            &[10, 0, 12, 13],
        );
        let cmap = read(&bytes);
        assert_eq!(cmap.map_codepoint(0x30), GlyphId::new(15));
        // a raw zero means no glyph, delta is not applied
        assert_eq!(cmap.map_codepoint(0x31), GlyphId::NOTDEF);
        assert_eq!(cmap.map_codepoint(0x32), GlyphId::new(17));
        assert_eq!(cmap.map_codepoint(0x33), GlyphId::new(18));
    }

    #[test]
    fn range_offset_out_of_bounds() {
        let bytes = cmap_test_data::format4_segments(
            &[(0x30, 0x33, 0, 400), (0xFFFF, 0xFFFF, 1, 0)],
            &[10],
        );
        let cmap = read(&bytes);
        assert_eq!(cmap.map_codepoint(0x30), GlyphId::NOTDEF);
    }

    #[test]
    fn unsorted_segments_terminate() {
        // end codes decreasing and start > end: malformed, but the search must
        // still terminate and produce something
        let bytes = cmap_test_data::format4_segments(
            &[(0x90, 0x80, 0, 0), (0x60, 0x50, 0, 0), (0x30, 0x20, 0, 0)],
            &[],
        );
        let cmap = read(&bytes);
        for code in 0..=0x100 {
            let _ = cmap.map_codepoint(code);
        }
    }

    #[test]
    fn adversarial_segments_terminate() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x636d6170);
        for _ in 0..64 {
            let segments: Vec<(u16, u16, i16, u16)> = (0..rng.gen_range(1..24))
                .map(|_| (rng.gen(), rng.gen(), rng.gen(), rng.gen::<u16>() & 0x1E))
                .collect();
            let glyphs: Vec<u16> = (0..rng.gen_range(0..16)).map(|_| rng.gen()).collect();
            let cmap = read(&cmap_test_data::format4_segments(&segments, &glyphs));
            for _ in 0..256 {
                let _ = cmap.map_codepoint(rng.gen_range(0..0x10000));
            }
        }
    }

    #[test]
    fn zero_segments() {
        let bytes = be_buffer! { 4u16, 16u16, 0u16, 0u16, 0u16, 0u16, 0u16, 0u16 };
        let cmap = read(&bytes);
        assert_eq!(cmap.seg_count(), 0);
        assert_eq!(cmap.map_codepoint(0x41), GlyphId::NOTDEF);
        assert_eq!(cmap.iter().count(), 0);
    }

    #[test]
    fn clamped_length_drops_glyph_ids() {
        let bytes = cmap_test_data::format4_segments(
            &[(0x30, 0x31, 0, 4), (0xFFFF, 0xFFFF, 1, 0)],
            &[7, 8],
        );
        // pretend the subtable ends before its last glyph id
        let cmap = Cmap4::read(FontData::new(&bytes), bytes.len() - 2, None).unwrap();
        assert_eq!(cmap.map_codepoint(0x30), GlyphId::new(7));
        assert_eq!(cmap.map_codepoint(0x31), GlyphId::NOTDEF);
    }

    #[test]
    fn iter_matches_lookup() {
        let bytes = cmap_test_data::format4_segments(
            &[
                (0x30, 0x33, 5, 6),
                (0x41, 0x43, -0x40, 0),
                (0xFFFF, 0xFFFF, 1, 0),
            ],
            &[10, 0, 12, 13],
        );
        let cmap = read(&bytes);
        let mut count = 0;
        for (code, gid) in cmap.iter() {
            assert_eq!(cmap.map_codepoint(code), gid);
            count += 1;
        }
        // 0x30..=0x33 minus the explicit zero, 0x41..=0x43, and 0xFFFF -> 0
        assert_eq!(count, 6);
    }
}
