//! Choosing the canonical subtable of a cmap table.

use std::sync::Arc;

use super::{Charmap, Cmap14, CmapSubtable};
use crate::encoding::{EncodingRegistry, LegacyEncoding};
use crate::{FontData, PlatformId, ReadError, TableProvider};

/// The encoding record a [`Charmap`] was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    pub platform_id: PlatformId,
    pub encoding_id: u16,
    /// Offset of the subtable from the start of the cmap table.
    pub offset: u32,
    /// The legacy encoding lookups are translated into, if any.
    pub encoding: Option<LegacyEncoding>,
}

/// Microsoft platform encodings we know how to use.
///
/// The ordering is significant and determines the priority of subtable
/// selection (greater is better).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum MappingKind {
    Johab = 1,
    Wansung = 2,
    Big5 = 3,
    Gbk = 4,
    ShiftJis = 5,
    UnicodeBmp = 6,
    Symbol = 7,
    UnicodeFull = 8,
}

impl MappingKind {
    fn from_encoding_id(encoding_id: u16) -> Option<Self> {
        Some(match encoding_id {
            PlatformId::ENCODING_MS_UCS_4 => Self::UnicodeFull,
            PlatformId::ENCODING_MS_SYMBOL => Self::Symbol,
            PlatformId::ENCODING_MS_UNICODE_BMP => Self::UnicodeBmp,
            2 => Self::ShiftJis,
            3 => Self::Gbk,
            4 => Self::Big5,
            5 => Self::Wansung,
            6 => Self::Johab,
            _ => return None,
        })
    }
}

/// Picks the subtable used to map characters in a font.
///
/// ## Selection strategy
///
/// When the font has Microsoft platform subtables, the preferred encoding is
/// the full Unicode repertoire (10), then symbol (0), then Unicode BMP (1),
/// then the legacy CJK encodings Shift-JIS (2), GBK (3), Big5 (4), Wansung
/// (5) and Johab (6). The order of the encoding records does not matter.
///
/// If none of those exist, the subtable referenced by the first encoding
/// record is used, whatever its platform.
///
/// Subtables in a legacy encoding are paired with a translation table from
/// the selector's [`EncodingRegistry`] so they can be queried with Unicode
/// code points. A Unicode platform variation sequences subtable, if present,
/// is attached to the result; if it is malformed it is dropped.
#[derive(Clone, Debug, Default)]
pub struct CmapSelector {
    registry: Arc<EncodingRegistry>,
}

impl CmapSelector {
    // version, numTables
    const HEADER_LEN: usize = 4;
    // platformID, encodingID, offset
    const RECORD_LEN: usize = 8;

    pub fn new(registry: Arc<EncodingRegistry>) -> Self {
        Self { registry }
    }

    /// The registry that supplies translation tables.
    pub fn registry(&self) -> &Arc<EncodingRegistry> {
        &self.registry
    }

    /// Selects and parses the preferred subtable of the given cmap table.
    ///
    /// Fails if the chosen subtable has an unsupported format or is
    /// truncated before its fixed-size arrays.
    pub fn select(&self, cmap: FontData<'_>) -> Result<Charmap, ReadError> {
        let num_tables = cmap.read_at::<u16>(2)? as usize;
        let available = cmap.len().saturating_sub(Self::HEADER_LEN) / Self::RECORD_LEN;
        if num_tables > available {
            log::warn!("cmap declares {num_tables} encoding records, only {available} present");
        }
        let records = (0..num_tables.min(available))
            .map(|i| self.record(cmap, i))
            .collect::<Result<Vec<_>, _>>()?;

        let mut best: Option<(MappingKind, Selection)> = None;
        let mut variations_offset = None;
        for selection in &records {
            // an offset of zero marks a record as absent
            if selection.offset == 0 {
                continue;
            }
            match (selection.platform_id, selection.encoding_id) {
                (PlatformId::Windows, encoding_id) => {
                    let Some(kind) = MappingKind::from_encoding_id(encoding_id) else {
                        continue;
                    };
                    if best.is_none_or(|(best_kind, _)| kind > best_kind) {
                        best = Some((kind, *selection));
                    }
                }
                (PlatformId::Unicode, PlatformId::ENCODING_UNICODE_VARIATIONS) => {
                    variations_offset.get_or_insert(selection.offset);
                }
                _ => {}
            }
        }

        let selection = match best {
            Some((_, selection)) => selection,
            None => match records.iter().find(|record| record.offset != 0) {
                Some(first) => {
                    log::warn!(
                        "no Microsoft cmap subtable, using first record ({:?}, {})",
                        first.platform_id,
                        first.encoding_id
                    );
                    *first
                }
                None => {
                    log::warn!("cmap has no usable encoding records");
                    return Ok(Charmap::null());
                }
            },
        };
        let selection = Selection {
            encoding: match selection.platform_id {
                PlatformId::Windows => LegacyEncoding::from_encoding_id(selection.encoding_id),
                _ => None,
            },
            ..selection
        };

        let translation = selection
            .encoding
            .map(|encoding| self.registry.translation(encoding));
        let subtable = CmapSubtable::read(cmap, selection.offset as usize, translation)?;
        log::debug!(
            "selected cmap subtable ({:?}, {}) format {:?}",
            selection.platform_id,
            selection.encoding_id,
            subtable.format()
        );

        let variations = variations_offset.and_then(|offset| {
            Cmap14::read(cmap, offset as usize)
                .inspect_err(|e| log::warn!("ignoring malformed variation sequences: {e}"))
                .ok()
        });
        Ok(Charmap::new(subtable, variations).with_selection(selection))
    }

    /// Selects the preferred subtable from a font's cmap table.
    pub fn select_from<'a>(&self, font: &impl TableProvider<'a>) -> Result<Charmap, ReadError> {
        self.select(font.cmap()?)
    }

    /// Like [`select`](Self::select), but substitutes the null mapping for a
    /// cmap table that cannot be used.
    pub fn select_or_null(&self, cmap: FontData<'_>) -> Charmap {
        self.select(cmap).unwrap_or_else(|e| {
            log::warn!("unusable cmap table, mapping nothing: {e}");
            Charmap::null()
        })
    }

    fn record(&self, cmap: FontData<'_>, index: usize) -> Result<Selection, ReadError> {
        let pos = Self::HEADER_LEN + index * Self::RECORD_LEN;
        Ok(Selection {
            platform_id: PlatformId::new(cmap.read_at(pos)?),
            encoding_id: cmap.read_at(pos + 2)?,
            offset: cmap.read_at(pos + 4)?,
            encoding: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use cmap_test_data::{self as data, BeBuffer};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::GlyphId;

    fn selector() -> CmapSelector {
        CmapSelector::new(Arc::new(EncodingRegistry::without_decoder()))
    }

    fn select(bytes: &BeBuffer) -> Charmap {
        selector().select(FontData::new(bytes)).unwrap()
    }

    fn selected(charmap: &Charmap) -> (PlatformId, u16) {
        let selection = charmap.selection().unwrap();
        (selection.platform_id, selection.encoding_id)
    }

    #[test]
    fn ascii_upper_end_to_end() {
        let charmap = select(&data::ascii_upper_cmap4());
        assert_eq!(selected(&charmap), (PlatformId::Windows, 1));
        assert_eq!(charmap.subtable().format(), Some(4));
        assert!(!charmap.subtable().has_translation());
        for (i, ch) in ('A'..='Z').enumerate() {
            assert_eq!(charmap.map(ch), GlyphId::new(i as u16 + 1));
        }
        assert_eq!(charmap.map('M'), GlyphId::new(13));
        assert_eq!(charmap.map('a'), GlyphId::NOTDEF);
    }

    #[test]
    fn symbol_beats_unicode_bmp_in_any_order() {
        let symbol = || data::format4(&[(0xF020, 0xF0FF, 1)]);
        let bmp = || data::format4(&[(0x20, 0xFF, 1)]);
        for entries in [
            vec![(3, 0, symbol()), (3, 1, bmp())],
            vec![(3, 1, bmp()), (3, 0, symbol())],
        ] {
            let charmap = select(&data::cmap_table(&entries));
            assert_eq!(selected(&charmap), (PlatformId::Windows, 0));
            assert_eq!(charmap.map(0xF041_u32), GlyphId::new(0x22));
        }
    }

    #[test]
    fn full_repertoire_beats_everything() {
        let entries = vec![
            (3, 0, data::format4(&[(0xF020, 0xF0FF, 1)])),
            (3, 1, data::format4(&[(0x20, 0xFF, 1)])),
            (3, 10, data::format12(&[(0x20, 0x1_F000, 1)])),
            (3, 2, data::format4(&[(0x20, 0xFF, 1)])),
        ];
        let charmap = select(&data::cmap_table(&entries));
        assert_eq!(selected(&charmap), (PlatformId::Windows, 10));
        assert_eq!(charmap.subtable().format(), Some(12));
    }

    #[test]
    fn legacy_priority() {
        let subtable = || data::format4(&[(0x20, 0x7E, 1)]);
        let mut entries = vec![(3, 6, subtable()), (3, 5, subtable()), (3, 4, subtable())];
        for expected in [4, 5, 6] {
            let charmap = select(&data::cmap_table(&entries));
            assert_eq!(selected(&charmap), (PlatformId::Windows, expected));
            assert!(charmap.subtable().has_translation());
            assert_eq!(
                charmap.selection().unwrap().encoding,
                LegacyEncoding::from_encoding_id(expected)
            );
            entries.retain(|(_, encoding, _)| *encoding != expected);
        }
    }

    #[test]
    fn legacy_subtable_is_translated() {
        // the subtable is indexed by legacy codes; ASCII translates to itself
        let bytes = data::cmap_table(&[(3, 2, data::format4(&[(0x41, 0x5A, 1)]))]);
        let charmap = select(&bytes);
        let encoding = charmap.selection().unwrap().encoding;
        assert_eq!(encoding, Some(LegacyEncoding::ShiftJis));
        assert_eq!(charmap.map('B'), GlyphId::new(2));
        // no decoder, so nothing outside ASCII and katakana translates
        assert_eq!(charmap.map('\u{3042}'), GlyphId::NOTDEF);
    }

    #[test]
    fn legacy_32_bit_subtable_is_rejected() {
        let bytes = data::cmap_table(&[(3, 3, data::format12(&[(0x20, 0x7E, 1)]))]);
        assert_eq!(
            selector().select(FontData::new(&bytes)).unwrap_err(),
            ReadError::TranslationNotSupported { format: 12 }
        );
        assert!(selector().select_or_null(FontData::new(&bytes)).is_null());
    }

    #[test]
    fn falls_back_to_first_record() {
        let _ = env_logger::builder().is_test(true).try_init();
        let entries = vec![
            (1, 0, data::format6(0x41, &[5, 6])),
            (0, 3, data::format4(&[(0x41, 0x5A, 1)])),
        ];
        let charmap = select(&data::cmap_table(&entries));
        assert_eq!(selected(&charmap), (PlatformId::Macintosh, 0));
        assert_eq!(charmap.map('B'), GlyphId::new(6));
    }

    #[test]
    fn zero_offset_is_absent() {
        let mut bytes = data::cmap_table(&[
            (3, 10, data::format12(&[(0x41, 0x5A, 100)])),
            (3, 1, data::format4(&[(0x41, 0x5A, 1)])),
        ]);
        // clear the offset of the (3, 10) record
        bytes.write_at(8, 0u32);
        let charmap = select(&bytes);
        assert_eq!(selected(&charmap), (PlatformId::Windows, 1));
    }

    #[test]
    fn fallback_skips_absent_records() {
        let mut bytes = data::cmap_table(&[
            (1, 0, data::format6(0x41, &[5, 6])),
            (0, 3, data::format4(&[(0x41, 0x5A, 1)])),
        ]);
        bytes.write_at(8, 0u32);
        let charmap = select(&bytes);
        assert_eq!(selected(&charmap), (PlatformId::Unicode, 3));
        assert_eq!(charmap.map('B'), GlyphId::new(2));
    }

    #[test]
    fn no_records() {
        let bytes = cmap_test_data::be_buffer! { 0u16, 0u16 };
        assert!(select(&bytes).is_null());
    }

    #[test]
    fn unknown_format_fails() {
        let bytes = data::cmap_table(&[(3, 1, cmap_test_data::be_buffer! { 3u16, 8u16, 0u32 })]);
        let err = selector().select(FontData::new(&bytes)).unwrap_err();
        assert_eq!(err, ReadError::InvalidFormat(3));
        assert_eq!(err.to_string(), "Cmap format unimplemented: 3");
    }

    #[test]
    fn attaches_variations() {
        let uvs = data::format14(&[(0xFE00, &[(0x41, 77)])]);
        let bytes = data::cmap_table(&[(0, 5, uvs), (3, 1, data::format4(&[(0x41, 0x5A, 1)]))]);
        let charmap = select(&bytes);
        assert!(charmap.has_variant_map());
        assert_eq!(charmap.map_variant('A', 0xFE00_u32), GlyphId::new(77));
        assert_eq!(charmap.map_variant('B', 0xFE00_u32), GlyphId::new(2));
        assert_eq!(charmap.map_variant('A', 0xFE01_u32), GlyphId::new(1));
    }

    #[test]
    fn broken_variations_are_ignored() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut uvs = data::format14(&[(0xFE00, &[(0x41, 77)])]);
        uvs.write_at(6, 0x00FF_FFFF_u32);
        let bytes = data::cmap_table(&[(3, 1, data::format4(&[(0x41, 0x5A, 1)])), (0, 5, uvs)]);
        let charmap = select(&bytes);
        assert!(!charmap.has_variant_map());
        assert_eq!(charmap.map_variant('A', 0xFE00_u32), GlyphId::new(1));
    }

    #[test]
    fn from_font() {
        let cmap = data::ascii_upper_cmap4();
        let font_bytes = data::sfnt(&[(*b"cmap", cmap.as_slice())]);
        let font = crate::FontRef::new(&font_bytes).unwrap();
        let charmap = selector().select_from(&font).unwrap();
        assert_eq!(charmap.map('Z'), GlyphId::new(26));
    }
}
