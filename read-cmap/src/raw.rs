//! types for working with raw big-endian bytes

use crate::types::{GlyphId, Tag, Uint24};

/// A trait for font scalars.
///
/// This is an internal trait for decoding big-endian bytes.
pub trait Scalar: Sized {
    /// The raw byte representation of this type.
    type Raw: bytemuck::Pod;

    /// The size of the raw type.
    const RAW_BYTE_LEN: usize = std::mem::size_of::<Self::Raw>();

    /// Create an instance of this type from raw big-endian bytes
    fn from_raw(raw: Self::Raw) -> Self;

    /// Read an instance of this type from a byte slice of exactly
    /// [`Self::RAW_BYTE_LEN`] bytes.
    fn read(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_from_bytes::<Self::Raw>(bytes)
            .ok()
            .copied()
            .map(Self::from_raw)
    }
}

macro_rules! int_scalar {
    ($ty:ty, $raw:ty) => {
        impl Scalar for $ty {
            type Raw = $raw;

            fn from_raw(raw: $raw) -> $ty {
                Self::from_be_bytes(raw)
            }
        }
    };
}

int_scalar!(u8, [u8; 1]);
int_scalar!(i8, [u8; 1]);
int_scalar!(u16, [u8; 2]);
int_scalar!(i16, [u8; 2]);
int_scalar!(u32, [u8; 4]);
int_scalar!(i32, [u8; 4]);
int_scalar!(Uint24, [u8; 3]);

impl Scalar for GlyphId {
    type Raw = [u8; 2];

    fn from_raw(raw: [u8; 2]) -> Self {
        GlyphId::new(u16::from_be_bytes(raw))
    }
}

impl Scalar for Tag {
    type Raw = [u8; 4];

    fn from_raw(raw: [u8; 4]) -> Self {
        Tag::new(&raw)
    }
}
