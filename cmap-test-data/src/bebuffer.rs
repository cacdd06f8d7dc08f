//! small utilities used in tests

/// A value with a big-endian byte representation.
pub trait BeBytes: Copy {
    fn append_to(self, out: &mut Vec<u8>);
}

macro_rules! be_bytes {
    ($($ty:ty),*) => {
        $(
            impl BeBytes for $ty {
                fn append_to(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_be_bytes())
                }
            }
        )*
    };
}

be_bytes!(u8, i8, u16, i16, u32, i32, u64, i64);

/// Four byte tags.
impl BeBytes for [u8; 4] {
    fn append_to(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self)
    }
}

/// A 24-bit unsigned value; the high byte is discarded.
#[derive(Clone, Copy, Debug)]
pub struct U24(pub u32);

impl BeBytes for U24 {
    fn append_to(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0.to_be_bytes()[1..])
    }
}

/// A convenience type for generating a buffer of big-endian bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeBuffer {
    data: Vec<u8>,
}

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// The current length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer contains zero bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Return a reference to the contents of the buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Write any scalar to this buffer.
    pub fn push(mut self, item: impl BeBytes) -> Self {
        item.append_to(&mut self.data);
        self
    }

    /// Write multiple scalars into the buffer
    pub fn extend<T: BeBytes>(mut self, iter: impl IntoIterator<Item = T>) -> Self {
        for item in iter {
            item.append_to(&mut self.data);
        }
        self
    }

    /// Overwrite the bytes at `pos` with `item`.
    ///
    /// Panics if the write would extend past the end of the buffer.
    pub fn write_at(&mut self, pos: usize, item: impl BeBytes) {
        let mut raw = Vec::new();
        item.append_to(&mut raw);
        let Some(dest) = self.data.get_mut(pos..pos + raw.len()) else {
            panic!("not enough room left in buffer for the requested write.");
        };
        dest.copy_from_slice(&raw);
    }
}

impl std::ops::Deref for BeBuffer {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// Build a [`BeBuffer`] from a list of scalars.
///
/// ```
/// let buf = cmap_test_data::be_buffer! { 4u16, 0xFFFF_u16, 7u32 };
/// assert_eq!(buf.as_slice(), &[0, 4, 0xFF, 0xFF, 0, 0, 0, 7]);
/// ```
#[macro_export]
macro_rules! be_buffer {
    ( $( $item:expr ),* $(,)? ) => {{
        let buf = $crate::BeBuffer::new();
        $( let buf = buf.push($item); )*
        buf
    }};
}
