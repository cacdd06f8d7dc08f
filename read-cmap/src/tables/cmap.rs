//! The [cmap](https://docs.microsoft.com/en-us/typography/opentype/spec/cmap) table
//!
//! Each supported subtable format is parsed once into owned arrays so that
//! lookups need no further validation and the result can be shared freely
//! between threads.

mod format0;
mod format10;
mod format12;
mod format14;
mod format2;
mod format4;
mod format6;
mod format8;
mod selector;

use std::sync::Arc;

use crate::encoding::TranslationTable;
use crate::{FontData, GlyphId, ReadError, Tag};

pub use format0::Cmap0;
pub use format10::Cmap10;
pub use format12::Cmap12;
pub use format14::{Cmap14, VariationSelectorRecord};
pub use format2::{Cmap2, SubHeader};
pub use format4::{Cmap4, Cmap4Iter};
pub use format6::Cmap6;
pub use format8::Cmap8;
pub use selector::{CmapSelector, Selection};

/// 'cmap'
pub const TAG: Tag = Tag::new(b"cmap");

/// A parsed cmap subtable.
///
/// The variant is fixed by the format discriminator read at construction;
/// lookups dispatch on it without any further inspection of the font data.
#[derive(Clone, Debug)]
pub enum CmapSubtable {
    Format0(Cmap0),
    Format2(Cmap2),
    Format4(Cmap4),
    Format6(Cmap6),
    Format8(Cmap8),
    Format10(Cmap10),
    Format12(Cmap12),
    /// The fallback used when a font has no usable mapping: every lookup
    /// produces [`GlyphId::NOTDEF`].
    Null,
}

impl CmapSubtable {
    /// Parses the subtable at `offset` in the given cmap table data.
    ///
    /// If the subtable's native encoding is not Unicode, `translation` maps
    /// Unicode code points to that encoding before the subtable is
    /// consulted. Supplying a translation table for formats 8, 10 or 12 is an
    /// error.
    pub fn read(
        data: FontData<'_>,
        offset: usize,
        translation: Option<Arc<TranslationTable>>,
    ) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(offset)?;
        let declared_len = if format < 8 {
            data.read_at::<u16>(offset + 2)? as usize
        } else {
            data.read_at::<u32>(offset + 4)? as usize
        };
        let available = data.len().saturating_sub(offset);
        if declared_len > available {
            log::warn!(
                "cmap subtable format {format} at offset {offset} overflows buffer \
                 ({declared_len} bytes declared, {available} available)"
            );
        }
        // Some malformed fonts declare a length past the end of the table.
        // Parse whatever is actually present rather than rejecting them.
        let subtable_len = declared_len.min(available);
        let subtable = data
            .slice(offset..offset + available)
            .ok_or(ReadError::OutOfBounds)?;
        match format {
            0 => Cmap0::read(subtable, translation).map(Self::Format0),
            2 => Cmap2::read(subtable, subtable_len, translation).map(Self::Format2),
            4 => Cmap4::read(subtable, subtable_len, translation).map(Self::Format4),
            6 => Cmap6::read(subtable, subtable_len, translation).map(Self::Format6),
            8 | 10 | 12 if translation.is_some() => {
                Err(ReadError::TranslationNotSupported { format })
            }
            8 => Cmap8::read(subtable).map(Self::Format8),
            10 => Cmap10::read(subtable).map(Self::Format10),
            12 => Cmap12::read(subtable).map(Self::Format12),
            other => Err(ReadError::InvalidFormat(other as i64)),
        }
    }

    /// The format number of this subtable, or `None` for the null mapping.
    pub fn format(&self) -> Option<u16> {
        Some(match self {
            Self::Format0(_) => 0,
            Self::Format2(_) => 2,
            Self::Format4(_) => 4,
            Self::Format6(_) => 6,
            Self::Format8(_) => 8,
            Self::Format10(_) => 10,
            Self::Format12(_) => 12,
            Self::Null => return None,
        })
    }

    /// Returns `true` if lookups are routed through an encoding translation
    /// table.
    pub fn has_translation(&self) -> bool {
        match self {
            Self::Format0(cmap) => cmap.translation.is_some(),
            Self::Format2(cmap) => cmap.translation.is_some(),
            Self::Format4(cmap) => cmap.translation.is_some(),
            Self::Format6(cmap) => cmap.translation.is_some(),
            _ => false,
        }
    }

    /// Maps a code point to a glyph identifier.
    ///
    /// Returns [`GlyphId::NOTDEF`] if the code point is not mapped. Tab, line
    /// feed and carriage return always map to [`GlyphId::INVISIBLE`], as do
    /// the Unicode format controls when the table has no glyph for them.
    pub fn map_codepoint(&self, codepoint: u32) -> GlyphId {
        match self {
            Self::Format0(cmap) => cmap.map_codepoint(codepoint),
            Self::Format2(cmap) => cmap.map_codepoint(codepoint),
            Self::Format4(cmap) => cmap.map_codepoint(codepoint),
            Self::Format6(cmap) => cmap.map_codepoint(codepoint),
            Self::Format8(cmap) => cmap.map_codepoint(codepoint),
            Self::Format10(cmap) => cmap.map_codepoint(codepoint),
            Self::Format12(cmap) => cmap.map_codepoint(codepoint),
            Self::Null => GlyphId::NOTDEF,
        }
    }
}

/// A selected subtable together with its optional variation sequence
/// companion.
///
/// This is the object higher level code uses to turn characters into glyph
/// identifiers; see [`CmapSelector`] for how one is obtained from a font.
#[derive(Clone, Debug)]
pub struct Charmap {
    subtable: CmapSubtable,
    variations: Option<Cmap14>,
    selection: Option<Selection>,
}

impl Charmap {
    /// Creates a character map from a subtable and an optional format 14
    /// subtable.
    pub fn new(subtable: CmapSubtable, variations: Option<Cmap14>) -> Self {
        Self {
            subtable,
            variations,
            selection: None,
        }
    }

    /// A character map that maps nothing.
    pub fn null() -> Self {
        Self::new(CmapSubtable::Null, None)
    }

    pub(crate) fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// The subtable used for nominal mappings.
    pub fn subtable(&self) -> &CmapSubtable {
        &self.subtable
    }

    /// The encoding record the subtable was selected from, if any.
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Returns true if this is the null mapping.
    pub fn is_null(&self) -> bool {
        matches!(self.subtable, CmapSubtable::Null)
    }

    /// Returns true if a Unicode variation sequence mapping is available.
    pub fn has_variant_map(&self) -> bool {
        self.variations.is_some()
    }

    /// The variation sequence subtable, if one was attached.
    pub fn variations(&self) -> Option<&Cmap14> {
        self.variations.as_ref()
    }

    /// Maps a code point to a nominal glyph identifier.
    pub fn map(&self, codepoint: impl Into<u32>) -> GlyphId {
        self.subtable.map_codepoint(codepoint.into())
    }

    /// Maps a code point and variation selector to a glyph identifier.
    ///
    /// If the variation sequence is not registered, or no variation
    /// subtable is attached, this is the same as [`Charmap::map`].
    pub fn map_variant(&self, codepoint: impl Into<u32>, selector: impl Into<u32>) -> GlyphId {
        let codepoint = codepoint.into();
        self.variations
            .as_ref()
            .and_then(|uvs| uvs.map_variant(codepoint, selector.into()))
            .unwrap_or_else(|| self.map(codepoint))
    }
}

impl Default for Charmap {
    fn default() -> Self {
        Self::null()
    }
}

/// The glyph for tab, line feed and carriage return, which are never drawn.
///
/// For subtables limited to the Basic Multilingual Plane, code points at or
/// above U+FFFF resolve to [`GlyphId::NOTDEF`] here as well.
pub(crate) fn control_code_glyph(codepoint: u32, bmp_only: bool) -> Option<GlyphId> {
    match codepoint {
        0x09 | 0x0A | 0x0D => Some(GlyphId::INVISIBLE),
        0xFFFF.. if bmp_only => Some(GlyphId::NOTDEF),
        _ => None,
    }
}

/// The glyph substituted when a lookup misses: invisible for the bidi and
/// formatting controls, otherwise [`GlyphId::NOTDEF`].
pub(crate) fn format_char_glyph(codepoint: u32) -> GlyphId {
    match codepoint {
        0x200C..=0x200F | 0x2028..=0x202E | 0x206A..=0x206F => GlyphId::INVISIBLE,
        _ => GlyphId::NOTDEF,
    }
}

/// The lookup sequence shared by the 16-bit formats.
///
/// Applies the control code rule, routes the code point through the
/// translation table if there is one, and substitutes the format character
/// glyph on a miss.
pub(crate) fn map_bmp_codepoint(
    codepoint: u32,
    translation: Option<&TranslationTable>,
    lookup: impl FnOnce(u32) -> Option<GlyphId>,
) -> GlyphId {
    if let Some(gid) = control_code_glyph(codepoint, true) {
        return gid;
    }
    let code = match translation {
        Some(table) => table.translate(codepoint),
        None => Some(codepoint),
    };
    code.and_then(lookup)
        .filter(|gid| !gid.is_notdef())
        .unwrap_or_else(|| format_char_glyph(codepoint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmap_test_data::{self as data, BeBuffer};

    pub(super) const FORMAT_CHARS: &[u32] = &[
        0x200C, 0x200D, 0x200E, 0x200F, 0x2028, 0x202B, 0x202E, 0x206A, 0x206D, 0x206F,
    ];
    pub(super) const NOT_FORMAT_CHARS: &[u32] = &[0x200B, 0x2010, 0x2027, 0x202F, 0x2069, 0x2070];

    fn every_format() -> Vec<(u16, BeBuffer)> {
        vec![
            (0, data::format0(&[(0x09, 5), (0x41, 7)])),
            (2, data::format2_single_byte(&[(0x09, 5), (0x41, 7)])),
            (4, data::format4(&[(0x09, 0x41, 1)])),
            (6, data::format6(0x09, &[5, 6, 7])),
            (8, data::format8(&[(0x09, 0x41, 1)])),
            (10, data::format10(0x09, &[5, 6, 7])),
            (12, data::format12(&[(0x09, 0x41, 1)])),
        ]
    }

    #[test]
    fn dispatch_on_format() {
        for (format, bytes) in every_format() {
            let subtable = CmapSubtable::read(FontData::new(&bytes), 0, None).unwrap();
            assert_eq!(subtable.format(), Some(format));
        }
        assert_eq!(CmapSubtable::Null.format(), None);
    }

    #[test]
    fn unknown_format_is_fatal() {
        for format in [1u16, 3, 5, 7, 9, 11, 13, 14, 15] {
            let bytes = cmap_test_data::be_buffer! { format, 0u16, 0u32, 0u32 };
            let err = CmapSubtable::read(FontData::new(&bytes), 0, None).unwrap_err();
            assert_eq!(err, ReadError::InvalidFormat(format as i64));
            assert!(err.to_string().contains("unimplemented"));
        }
    }

    #[test]
    fn control_codes_are_invisible() {
        for (format, bytes) in every_format() {
            let subtable = CmapSubtable::read(FontData::new(&bytes), 0, None).unwrap();
            for code in [0x09, 0x0A, 0x0D] {
                assert_eq!(
                    subtable.map_codepoint(code),
                    GlyphId::INVISIBLE,
                    "format {format} code {code:#x}"
                );
            }
        }
    }

    #[test]
    fn format_chars_fall_back_to_invisible() {
        for (format, bytes) in every_format() {
            let subtable = CmapSubtable::read(FontData::new(&bytes), 0, None).unwrap();
            for &code in FORMAT_CHARS {
                assert_eq!(
                    subtable.map_codepoint(code),
                    GlyphId::INVISIBLE,
                    "format {format} code {code:#x}"
                );
            }
            for &code in NOT_FORMAT_CHARS {
                assert_eq!(
                    subtable.map_codepoint(code),
                    GlyphId::NOTDEF,
                    "format {format} code {code:#x}"
                );
            }
        }
    }

    #[test]
    fn null_maps_nothing() {
        let charmap = Charmap::null();
        assert!(charmap.is_null());
        assert_eq!(charmap.map('A'), GlyphId::NOTDEF);
        assert_eq!(charmap.map(0x09_u32), GlyphId::NOTDEF);
        assert_eq!(charmap.map_variant('A', 0xFE00_u32), GlyphId::NOTDEF);
    }

    #[test]
    fn translation_rejected_for_32_bit_formats() {
        let table = Arc::new(TranslationTable::ascii_only());
        for (format, bytes) in every_format() {
            let result = CmapSubtable::read(FontData::new(&bytes), 0, Some(table.clone()));
            if format >= 8 {
                assert_eq!(
                    result.unwrap_err(),
                    ReadError::TranslationNotSupported { format }
                );
            } else {
                assert!(result.unwrap().has_translation());
            }
        }
    }

    #[test]
    fn overflowing_length_is_tolerated() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut bytes = data::format4(&[(0x41, 0x5A, 1)]);
        // declare a length far past the end of the buffer
        bytes.write_at(2, 0xFFF0_u16);
        let subtable = CmapSubtable::read(FontData::new(&bytes), 0, None).unwrap();
        assert_eq!(subtable.map_codepoint(0x41), GlyphId::new(1));
    }

    #[test]
    fn variant_defers_without_uvs() {
        let bytes = data::format4(&[(0x41, 0x5A, 1)]);
        let subtable = CmapSubtable::read(FontData::new(&bytes), 0, None).unwrap();
        let charmap = Charmap::new(subtable, None);
        assert!(!charmap.has_variant_map());
        assert_eq!(charmap.map_variant('B', 0xFE0F_u32), GlyphId::new(2));
    }
}
