//! Translation from Unicode to the legacy Microsoft platform CJK encodings.
//!
//! A cmap subtable with encoding ID 2 to 6 is indexed by legacy double-byte
//! codes rather than Unicode. To query it with a Unicode code point we need
//! the inverse of the legacy decoder: a 64K entry table taking each BMP code
//! point to the legacy code that decodes to it.
//!
//! Building such a table means decoding every code in the encoding's
//! double-byte range, so tables are built at most once per encoding and
//! shared through an [`EncodingRegistry`].

#[cfg(feature = "legacy_encodings")]
mod johab;

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use parking_lot::RwLock;

#[cfg(feature = "legacy_encodings")]
pub use johab::EncodingRsDecoder;

/// A legacy double-byte encoding used by Microsoft platform cmap subtables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LegacyEncoding {
    /// Encoding ID 2.
    ShiftJis,
    /// Encoding ID 3, also known as PRC.
    Gbk,
    /// Encoding ID 4.
    Big5,
    /// Encoding ID 5, the EUC-KR encoding of KS X 1001.
    Wansung,
    /// Encoding ID 6.
    Johab,
}

impl LegacyEncoding {
    pub const ALL: [LegacyEncoding; 5] = [
        Self::ShiftJis,
        Self::Gbk,
        Self::Big5,
        Self::Wansung,
        Self::Johab,
    ];

    /// Returns the legacy encoding for a Microsoft platform encoding ID.
    pub fn from_encoding_id(encoding_id: u16) -> Option<Self> {
        match encoding_id {
            2 => Some(Self::ShiftJis),
            3 => Some(Self::Gbk),
            4 => Some(Self::Big5),
            5 => Some(Self::Wansung),
            6 => Some(Self::Johab),
            _ => None,
        }
    }

    /// The Microsoft platform encoding ID.
    pub fn encoding_id(self) -> u16 {
        match self {
            Self::ShiftJis => 2,
            Self::Gbk => 3,
            Self::Big5 => 4,
            Self::Wansung => 5,
            Self::Johab => 6,
        }
    }

    /// The span of double-byte codes decoded when building a translation
    /// table.
    pub fn double_byte_range(self) -> RangeInclusive<u16> {
        match self {
            Self::ShiftJis => 0x8140..=0xFCFC,
            Self::Gbk => 0x8140..=0xFEA0,
            Self::Big5 => 0xA140..=0xFEFE,
            Self::Wansung => 0xA1A1..=0xFEDE,
            Self::Johab => 0x8141..=0xFDFE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ShiftJis => "Shift_JIS",
            Self::Gbk => "GBK",
            Self::Big5 => "Big5",
            Self::Wansung => "EUC-KR",
            Self::Johab => "Johab",
        }
    }
}

/// Decodes a single legacy byte sequence.
///
/// Implementations return `Some` only when `bytes` decode, without errors, to
/// exactly one character.
pub trait LegacyDecoder: Send + Sync {
    fn decode(&self, encoding: LegacyEncoding, bytes: &[u8]) -> Option<char>;
}

/// A map from BMP code points to legacy codes.
///
/// An entry of zero means the code point has no legacy equivalent.
#[derive(Clone, PartialEq, Eq)]
pub struct TranslationTable(Box<[u16]>);

impl TranslationTable {
    const LEN: usize = 0x10000;
    const ASCII: RangeInclusive<u16> = 0x20..=0x7E;
    const HALF_WIDTH_KATAKANA: RangeInclusive<u16> = 0xA1..=0xDF;
    const HALF_WIDTH_KATAKANA_START: u16 = 0xFF61;

    /// A table translating only printable ASCII, each to itself.
    pub fn ascii_only() -> Self {
        let mut table = vec![0u16; Self::LEN];
        for code in Self::ASCII {
            table[code as usize] = code;
        }
        Self(table.into_boxed_slice())
    }

    /// Builds the table for `encoding` by decoding each code in its double
    /// byte range and inverting the result.
    ///
    /// When several legacy codes decode to the same character, the highest
    /// one wins. Without a decoder, only the ranges that need no decoding
    /// are filled in.
    pub fn build(encoding: LegacyEncoding, decoder: Option<&dyn LegacyDecoder>) -> Self {
        let mut table = vec![0u16; Self::LEN];
        if let Some(decoder) = decoder {
            for code in encoding.double_byte_range() {
                let Some(ch) = decoder.decode(encoding, &code.to_be_bytes()) else {
                    continue;
                };
                if let Some(slot) = table.get_mut(ch as usize) {
                    *slot = code;
                }
            }
        }
        for code in Self::ASCII {
            table[code as usize] = code;
        }
        if encoding == LegacyEncoding::ShiftJis {
            for code in Self::HALF_WIDTH_KATAKANA {
                let offset = code - Self::HALF_WIDTH_KATAKANA.start();
                let unicode = Self::HALF_WIDTH_KATAKANA_START + offset;
                table[unicode as usize] = code;
            }
        }
        Self(table.into_boxed_slice())
    }

    /// Returns the legacy code for a code point, or `None` if there is
    /// none.
    pub fn translate(&self, codepoint: u32) -> Option<u32> {
        match self.0.get(codepoint as usize) {
            Some(0) | None => None,
            Some(code) => Some(*code as u32),
        }
    }

    /// The raw table, indexed by BMP code point.
    pub fn as_slice(&self) -> &[u16] {
        &self.0
    }

    /// The number of code points with a translation.
    pub fn mapped_count(&self) -> usize {
        self.0.iter().filter(|code| **code != 0).count()
    }
}

impl std::fmt::Debug for TranslationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationTable")
            .field("mapped", &self.mapped_count())
            .finish()
    }
}

/// A cache of translation tables, one per legacy encoding.
///
/// Tables are created on first request and never evicted. Two threads
/// asking for the same encoding at once may both build a table; the first
/// one published is kept and returned to both.
pub struct EncodingRegistry {
    decoder: Option<Arc<dyn LegacyDecoder>>,
    tables: RwLock<HashMap<LegacyEncoding, Arc<TranslationTable>>>,
}

impl EncodingRegistry {
    /// Creates a registry using the default decoder, if the
    /// `legacy_encodings` feature is enabled.
    pub fn new() -> Self {
        #[cfg(feature = "legacy_encodings")]
        let decoder: Option<Arc<dyn LegacyDecoder>> = Some(Arc::new(EncodingRsDecoder));
        #[cfg(not(feature = "legacy_encodings"))]
        let decoder: Option<Arc<dyn LegacyDecoder>> = None;
        Self {
            decoder,
            tables: Default::default(),
        }
    }

    /// Creates a registry that decodes with the given decoder.
    pub fn with_decoder(decoder: impl LegacyDecoder + 'static) -> Self {
        Self {
            decoder: Some(Arc::new(decoder)),
            tables: Default::default(),
        }
    }

    /// Creates a registry that never decodes, producing tables that only
    /// cover ASCII (and half width katakana for Shift-JIS).
    pub fn without_decoder() -> Self {
        Self {
            decoder: None,
            tables: Default::default(),
        }
    }

    /// Returns the translation table for `encoding`, building it if needed.
    pub fn translation(&self, encoding: LegacyEncoding) -> Arc<TranslationTable> {
        if let Some(table) = self.tables.read().get(&encoding) {
            return table.clone();
        }
        let table = Arc::new(TranslationTable::build(encoding, self.decoder.as_deref()));
        log::debug!(
            "built {} translation table ({} code points)",
            encoding.name(),
            table.mapped_count()
        );
        self.tables.write().entry(encoding).or_insert(table).clone()
    }

    /// Returns `true` if a table for `encoding` has already been built.
    pub fn is_cached(&self, encoding: LegacyEncoding) -> bool {
        self.tables.read().contains_key(&encoding)
    }
}

impl Default for EncodingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EncodingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut cached = self.tables.read().keys().copied().collect::<Vec<_>>();
        cached.sort();
        f.debug_struct("EncodingRegistry")
            .field("has_decoder", &self.decoder.is_some())
            .field("cached", &cached)
            .finish()
    }
}
