//! Synthetic font data for tests, benchmarks and fuzzing.
//!
//! Every builder produces a complete subtable (or table) with correct
//! length fields, so tests only need to patch the bytes they are
//! interested in breaking.

mod bebuffer;

pub use bebuffer::{BeBuffer, BeBytes, U24};

/// Format 0 with the given `(code, glyph)` pairs; every other code maps
/// to glyph 0.
pub fn format0(mappings: &[(u8, u8)]) -> BeBuffer {
    let mut glyphs = [0u8; 256];
    for (code, glyph) in mappings {
        glyphs[*code as usize] = *glyph;
    }
    be_buffer!(0u16, 262u16, 0u16).extend(glyphs)
}

/// Format 2 with explicit sub-header keys and sub-headers.
///
/// `keys` assigns a sub-header index to each listed high byte; all other
/// high bytes use sub-header 0. Each sub-header is `(first_code, id_delta,
/// glyphs)` and its glyphs are laid out in order after the sub-header
/// array.
pub fn format2(keys: &[(u8, u16)], sub_headers: &[(u16, i16, &[u16])]) -> BeBuffer {
    const KEYS_END: usize = 6 + 512;
    let mut key_array = [0u16; 256];
    for (high, index) in keys {
        key_array[*high as usize] = index * 8;
    }
    let glyph_count: usize = sub_headers.iter().map(|(_, _, glyphs)| glyphs.len()).sum();
    let len = KEYS_END + sub_headers.len() * 8 + glyph_count * 2;
    let mut buf = be_buffer!(2u16, len as u16, 0u16).extend(key_array);
    let mut glyph_start = KEYS_END + sub_headers.len() * 8;
    for (i, (first_code, delta, glyphs)) in sub_headers.iter().enumerate() {
        let range_offset_pos = KEYS_END + i * 8 + 6;
        buf = buf
            .push(*first_code)
            .push(glyphs.len() as u16)
            .push(*delta)
            .push((glyph_start - range_offset_pos) as u16);
        glyph_start += glyphs.len() * 2;
    }
    for (_, _, glyphs) in sub_headers {
        buf = buf.extend(glyphs.iter().copied());
    }
    buf
}

/// Format 2 with a single sub-header covering all single byte codes.
pub fn format2_single_byte(mappings: &[(u8, u16)]) -> BeBuffer {
    let mut glyphs = [0u16; 256];
    for (code, glyph) in mappings {
        glyphs[*code as usize] = *glyph;
    }
    format2(&[], &[(0, 0, &glyphs[..])])
}

/// Format 4 from `(start, end, first_glyph)` ranges, each mapped through
/// its id delta, followed by the required 0xFFFF segment.
pub fn format4(ranges: &[(u16, u16, u16)]) -> BeBuffer {
    let mut segments = ranges
        .iter()
        .map(|(start, end, glyph)| (*start, *end, glyph.wrapping_sub(*start) as i16, 0))
        .collect::<Vec<_>>();
    segments.push((0xFFFF, 0xFFFF, 1, 0));
    format4_segments(&segments, &[])
}

/// Format 4 from raw `(start, end, id_delta, id_range_offset)` segments,
/// written in the given order, and a glyph id array.
///
/// The range offsets are in bytes, as stored in the font.
pub fn format4_segments(segments: &[(u16, u16, i16, u16)], glyph_ids: &[u16]) -> BeBuffer {
    let seg_count = segments.len();
    let len = 16 + seg_count * 8 + glyph_ids.len() * 2;
    let seg_count_x2 = (seg_count * 2) as u16;
    be_buffer!(4u16, len as u16, 0u16, seg_count_x2, 0u16, 0u16, 0u16)
        .extend(segments.iter().map(|seg| seg.1))
        .push(0u16)
        .extend(segments.iter().map(|seg| seg.0))
        .extend(segments.iter().map(|seg| seg.2))
        .extend(segments.iter().map(|seg| seg.3))
        .extend(glyph_ids.iter().copied())
}

/// Format 6 mapping `first_code + i` to `glyphs[i]`.
pub fn format6(first_code: u16, glyphs: &[u16]) -> BeBuffer {
    let len = 10 + glyphs.len() * 2;
    be_buffer!(6u16, len as u16, 0u16, first_code, glyphs.len() as u16)
        .extend(glyphs.iter().copied())
}

/// Format 8 with no 32-bit lead words and the given
/// `(start, end, start_glyph)` groups.
pub fn format8(groups: &[(u32, u32, u32)]) -> BeBuffer {
    let len = 16 + 8192 + groups.len() * 12;
    be_buffer!(8u16, 0u16, len as u32, 0u32)
        .extend([0u8; 8192])
        .push(groups.len() as u32)
        .extend(group_words(groups))
}

fn group_words(groups: &[(u32, u32, u32)]) -> impl Iterator<Item = u32> + '_ {
    groups
        .iter()
        .flat_map(|(start, end, gid)| [*start, *end, *gid])
}

/// Format 10 mapping `start + i` to `glyphs[i]`.
pub fn format10(start: u32, glyphs: &[u16]) -> BeBuffer {
    let len = 20 + glyphs.len() * 2;
    be_buffer!(10u16, 0u16, len as u32, 0u32, start, glyphs.len() as u32)
        .extend(glyphs.iter().copied())
}

/// Format 12 with the given `(start, end, start_glyph)` groups.
pub fn format12(groups: &[(u32, u32, u32)]) -> BeBuffer {
    let len = 16 + groups.len() * 12;
    be_buffer!(12u16, 0u16, len as u32, 0u32, groups.len() as u32)
        .extend(group_words(groups))
}

/// Format 14 with a non-default UVS table for each `(selector, mappings)`
/// record. Mappings are written in the order given.
pub fn format14(records: &[(u32, &[(u32, u16)])]) -> BeBuffer {
    let mut table_offset = 10 + records.len() * 11;
    let mut offsets = Vec::with_capacity(records.len());
    for (_, mappings) in records {
        offsets.push(table_offset);
        table_offset += 4 + mappings.len() * 5;
    }
    let mut buf = be_buffer! { 14u16, table_offset as u32, records.len() as u32 };
    for ((selector, _), offset) in records.iter().zip(&offsets) {
        buf = buf.push(U24(*selector)).push(0u32).push(*offset as u32);
    }
    for (_, mappings) in records {
        buf = buf.push(mappings.len() as u32);
        for (unicode, glyph) in mappings.iter() {
            buf = buf.push(U24(*unicode)).push(*glyph);
        }
    }
    buf
}

/// A cmap table with one encoding record per `(platform, encoding,
/// subtable)` entry. Subtables are laid out in order after the records.
pub fn cmap_table(entries: &[(u16, u16, BeBuffer)]) -> BeBuffer {
    let mut offset = 4 + entries.len() * 8;
    let mut buf = be_buffer! { 0u16, entries.len() as u16 };
    for (platform, encoding, subtable) in entries {
        buf = buf.push(*platform).push(*encoding).push(offset as u32);
        offset += subtable.len();
    }
    for (_, _, subtable) in entries {
        buf = buf.extend(subtable.iter().copied());
    }
    buf
}

/// A (3, 1) format 4 cmap mapping 'A'..='Z' to glyphs 1..=26.
pub fn ascii_upper_cmap4() -> BeBuffer {
    cmap_table(&[(3, 1, format4(&[(0x41, 0x5A, 1)]))])
}

/// A minimal TrueType font containing the given tables.
pub fn sfnt(tables: &[([u8; 4], &[u8])]) -> BeBuffer {
    sfnt_at(tables, 0)
}

/// A font collection containing one font per entry of `fonts`.
pub fn ttc(fonts: &[&[([u8; 4], &[u8])]]) -> BeBuffer {
    let header_len = 12 + fonts.len() * 4;
    let mut buf = BeBuffer::new()
        .push(*b"ttcf")
        .push(0x0001_0000u32)
        .push(fonts.len() as u32);
    let mut offset = header_len;
    let mut bodies = Vec::with_capacity(fonts.len());
    for tables in fonts {
        let font = sfnt_at(tables, offset);
        buf = buf.push(offset as u32);
        offset += font.len();
        bodies.push(font);
    }
    for font in bodies {
        buf = buf.extend(font.iter().copied());
    }
    buf
}

/// A font whose table offsets are relative to a file beginning `base`
/// bytes before it.
fn sfnt_at(tables: &[([u8; 4], &[u8])], base: usize) -> BeBuffer {
    let mut offset = 12 + tables.len() * 16;
    let mut buf = be_buffer! { 0x0001_0000u32, tables.len() as u16, 0u16, 0u16, 0u16 };
    for (tag, data) in tables {
        buf = buf
            .push(*tag)
            .push(0u32)
            .push((base + offset) as u32)
            .push(data.len() as u32);
        offset += data.len().next_multiple_of(4);
    }
    for (_, data) in tables {
        let padding = data.len().next_multiple_of(4) - data.len();
        buf = buf
            .extend(data.iter().copied())
            .extend(std::iter::repeat_n(0u8, padding));
    }
    buf
}

/// A maxp table declaring `num_glyphs` glyphs.
pub fn maxp(num_glyphs: u16) -> BeBuffer {
    be_buffer!(0x0000_5000u32, num_glyphs)
}
