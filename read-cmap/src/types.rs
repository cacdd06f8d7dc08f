//! Scalar types used by the cmap reader.

use std::fmt::{Debug, Display, Formatter};

/// Glyph codes at or above this value are never rasterized; they resolve to
/// the shared invisible glyph.
pub const INVISIBLE_GLYPHS: u32 = 0xFFFE;

/// A 16-bit glyph identifier.
///
/// Although these are treated as u16s in the font, we choose to represent them
/// as a distinct type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlyphId(u16);

impl GlyphId {
    /// The identifier reserved for unknown glyphs.
    ///
    /// A lookup that produces this value has no mapping and the caller is
    /// expected to substitute a fallback glyph.
    pub const NOTDEF: GlyphId = GlyphId(0);

    /// The sentinel identifier for characters that are never drawn (tab,
    /// line feed, carriage return and the Unicode format controls).
    pub const INVISIBLE: GlyphId = GlyphId(0xFFFF);

    /// Construct a new `GlyphId`.
    pub const fn new(raw: u16) -> Self {
        GlyphId(raw)
    }

    /// The identifier as a u16.
    pub const fn to_u16(self) -> u16 {
        self.0
    }

    /// The identifier as a u32 glyph code.
    pub const fn to_u32(self) -> u32 {
        self.0 as u32
    }

    /// Returns `true` if this is [`GlyphId::NOTDEF`].
    pub const fn is_notdef(self) -> bool {
        self.0 == 0
    }
}

impl Display for GlyphId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GID_{}", self.0)
    }
}

impl From<GlyphId> for u32 {
    fn from(value: GlyphId) -> u32 {
        value.0 as u32
    }
}

/// An OpenType tag.
///
/// A tag is a 4-byte array where each byte is expected to be in the printable
/// ASCII range. This is not enforced, since invalid tags do exist in the wild
/// and need to be representable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Tag([u8; 4]);

impl Tag {
    /// Construct a `Tag` from raw bytes.
    pub const fn new(src: &[u8; 4]) -> Tag {
        Tag(*src)
    }

    /// Construct a `Tag` from a big-endian `u32`.
    pub const fn from_u32(src: u32) -> Tag {
        Tag(src.to_be_bytes())
    }

    /// The tag as raw bytes.
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            if (0x20..=0x7E).contains(&byte) {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "{{0x{byte:02X}}}")?;
            }
        }
        Ok(())
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag({self})")
    }
}

/// 24-bit unsigned integer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Uint24(u32);

impl Uint24 {
    /// The largest value that can be represented by this integer type.
    pub const MAX: Self = Uint24(0xffffff);

    /// Create from a u32. Saturates on overflow.
    pub const fn new(raw: u32) -> Uint24 {
        if raw > Self::MAX.0 {
            Self::MAX
        } else {
            Uint24(raw)
        }
    }

    /// Returns this value as an unsigned 32-bit integer.
    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub const fn from_be_bytes(bytes: [u8; 3]) -> Self {
        Uint24((bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32)
    }
}

impl From<Uint24> for u32 {
    fn from(src: Uint24) -> u32 {
        src.0
    }
}

/// The platform identifier of a cmap encoding record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlatformId {
    Unicode,
    Macintosh,
    Iso,
    Windows,
    Custom,
    Unknown(u16),
}

impl PlatformId {
    /// Microsoft symbol encoding.
    pub const ENCODING_MS_SYMBOL: u16 = 0;
    /// Microsoft Unicode BMP encoding.
    pub const ENCODING_MS_UNICODE_BMP: u16 = 1;
    /// Microsoft Unicode full repertoire encoding.
    pub const ENCODING_MS_UCS_4: u16 = 10;
    /// Unicode platform variation sequences encoding (format 14).
    pub const ENCODING_UNICODE_VARIATIONS: u16 = 5;

    pub const fn new(raw: u16) -> Self {
        match raw {
            0 => Self::Unicode,
            1 => Self::Macintosh,
            2 => Self::Iso,
            3 => Self::Windows,
            4 => Self::Custom,
            other => Self::Unknown(other),
        }
    }
}

impl From<u16> for PlatformId {
    fn from(raw: u16) -> Self {
        Self::new(raw)
    }
}
