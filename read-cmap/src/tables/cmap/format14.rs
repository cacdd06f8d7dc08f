//! [Format 14](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-14-unicode-variation-sequences):
//! Unicode variation sequences

use crate::{FontData, GlyphId, ReadError, Uint24};

/// The non-default mappings registered for one variation selector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariationSelectorRecord {
    selector: u32,
    unicode_values: Vec<u32>,
    glyph_ids: Vec<u16>,
}

impl VariationSelectorRecord {
    /// The variation selector code point.
    pub fn selector(&self) -> u32 {
        self.selector
    }

    /// The base characters with a non-default glyph for this selector, in
    /// ascending order.
    pub fn unicode_values(&self) -> &[u32] {
        &self.unicode_values
    }

    /// Glyphs parallel to [`unicode_values`](Self::unicode_values).
    pub fn glyph_ids(&self) -> &[u16] {
        &self.glyph_ids
    }

    fn lookup(&self, codepoint: u32) -> Option<GlyphId> {
        let index = self.unicode_values.binary_search(&codepoint).ok()?;
        let gid = GlyphId::new(self.glyph_ids[index]);
        (!gid.is_notdef()).then_some(gid)
    }
}

/// The variation sequence table.
///
/// Only non-default UVS mappings are retained: a sequence listed in a
/// default UVS table maps to the base character's nominal glyph, which is
/// exactly what a caller falls back to on a miss.
#[derive(Clone, Debug, Default)]
pub struct Cmap14 {
    records: Vec<VariationSelectorRecord>,
}

impl Cmap14 {
    // format + length + numVarSelectorRecords
    const HEADER_LEN: usize = 10;
    // varSelector + defaultUVSOffset + nonDefaultUVSOffset
    const RECORD_LEN: usize = 11;
    // unicodeValue + glyphID
    const MAPPING_LEN: usize = 5;

    /// Parses the format 14 subtable at `offset` in the given cmap table data.
    pub fn read(data: FontData<'_>, offset: usize) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(offset)?;
        if format != 14 {
            return Err(ReadError::InvalidFormat(format as i64));
        }
        let declared_len = data.read_at::<u32>(offset + 2)? as usize;
        let available = data.len().saturating_sub(offset);
        if declared_len > available {
            log::warn!(
                "cmap format 14 subtable at offset {offset} overflows buffer \
                 ({declared_len} bytes declared, {available} available)"
            );
        }
        let data = data.split_off(offset).ok_or(ReadError::OutOfBounds)?;
        let num_records = data.read_at::<u32>(6)? as usize;
        if (data.len().saturating_sub(Self::HEADER_LEN)) / Self::RECORD_LEN < num_records {
            return Err(ReadError::MalformedData("Format 14 table exceeded"));
        }
        let records = (0..num_records)
            .map(|i| Self::read_record(data, Self::HEADER_LEN + i * Self::RECORD_LEN))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    fn read_record(data: FontData<'_>, pos: usize) -> Result<VariationSelectorRecord, ReadError> {
        let selector = data.read_at::<Uint24>(pos)?.to_u32();
        // the default UVS offset at pos + 3 is not needed
        let non_default_offset = data.read_at::<u32>(pos + 7)? as usize;
        if non_default_offset == 0 {
            return Ok(VariationSelectorRecord {
                selector,
                ..Default::default()
            });
        }
        let mut cursor = data
            .split_off(non_default_offset)
            .ok_or(ReadError::OutOfBounds)?
            .cursor();
        let count = cursor.read::<u32>()? as usize;
        if cursor.remaining_bytes() / Self::MAPPING_LEN < count {
            return Err(ReadError::MalformedData("Format 14 mappings exceeded"));
        }
        let mut mappings = Vec::with_capacity(count);
        for _ in 0..count {
            let unicode = cursor.read::<Uint24>()?.to_u32();
            let glyph: u16 = cursor.read()?;
            mappings.push((unicode, glyph));
        }
        if !mappings.is_sorted_by_key(|(unicode, _)| *unicode) {
            mappings.sort_by_key(|(unicode, _)| *unicode);
        }
        let (unicode_values, glyph_ids) = mappings.into_iter().unzip();
        Ok(VariationSelectorRecord {
            selector,
            unicode_values,
            glyph_ids,
        })
    }

    /// The selector records, in table order.
    pub fn records(&self) -> &[VariationSelectorRecord] {
        &self.records
    }

    /// Returns the glyph registered for the variation sequence, or `None`
    /// if the sequence has no non-default glyph.
    pub fn map_variant(&self, codepoint: u32, selector: u32) -> Option<GlyphId> {
        self.records
            .iter()
            .find(|record| record.selector == selector)
            .and_then(|record| record.lookup(codepoint))
    }
}
