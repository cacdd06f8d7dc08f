//! a trait for things that can serve font tables

use crate::tables::cmap;
use crate::{FontData, ReadError, Tag};

/// 'maxp'
pub const MAXP: Tag = Tag::new(b"maxp");

/// An interface for accessing tables from a font (or font-like object)
pub trait TableProvider<'a> {
    fn data_for_tag(&self, tag: Tag) -> Option<FontData<'a>>;

    fn expect_data_for_tag(&self, tag: Tag) -> Result<FontData<'a>, ReadError> {
        self.data_for_tag(tag).ok_or(ReadError::TableIsMissing(tag))
    }

    /// The raw bytes of the cmap table.
    fn cmap(&self) -> Result<FontData<'a>, ReadError> {
        self.expect_data_for_tag(cmap::TAG)
    }

    /// The glyph count from the maxp table.
    fn num_glyphs(&self) -> Result<u16, ReadError> {
        // version (4 bytes) precedes numGlyphs in both maxp versions
        self.expect_data_for_tag(MAXP)?.read_at(4)
    }
}
