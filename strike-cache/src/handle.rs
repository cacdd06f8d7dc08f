//! Opaque native image handles.

use std::num::NonZeroU64;

/// A handle to a glyph image owned by a [`Rasterizer`](crate::Rasterizer).
///
/// Zero is never a valid handle; the caches use it to mark empty slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageHandle(NonZeroU64);

impl ImageHandle {
    /// Wraps a raw handle value, returning `None` for zero.
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

/// The number of bits needed to store a native handle.
///
/// This is fixed for a process, so a cache stores handles in the narrowest
/// slots that can hold them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleWidth {
    Narrow,
    Wide,
}

impl HandleWidth {
    /// The width of a native pointer.
    pub const fn native() -> Self {
        if std::mem::size_of::<usize>() <= 4 {
            Self::Narrow
        } else {
            Self::Wide
        }
    }

    /// Returns `true` if slots of this width can hold `handle`.
    pub fn fits(self, handle: ImageHandle) -> bool {
        match self {
            Self::Narrow => handle.get() <= u32::MAX as u64,
            Self::Wide => true,
        }
    }
}

impl Default for HandleWidth {
    fn default() -> Self {
        Self::native()
    }
}
