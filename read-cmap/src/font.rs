//! In-memory fonts and font collections.

use crate::{FontData, ReadError, TableProvider, Tag};

const TT_SFNT_VERSION: u32 = 0x00010000;
const CFF_SFNT_VERSION: u32 = 0x4F54544F;
const TRUE_SFNT_VERSION: u32 = 0x74727565;
const TTC_HEADER_TAG: Tag = Tag::new(b"ttcf");

// sfntVersion, numTables, searchRange, entrySelector, rangeShift
const TABLE_DIRECTORY_LEN: usize = 12;
// tableTag, checksum, offset, length
const TABLE_RECORD_LEN: usize = 16;

/// Reference to an in-memory font.
///
/// This is a simple implementation of the [`TableProvider`] trait backed
/// by a borrowed slice containing font data.
#[derive(Clone, Debug)]
pub struct FontRef<'a> {
    data: FontData<'a>,
    records: FontData<'a>,
    /// The index of this font in a TrueType collection
    ttc_index: Option<u32>,
}

impl<'a> FontRef<'a> {
    /// Creates a new reference to an in-memory font backed by the given data.
    ///
    /// The data must be a single font, not a font collection. To load a
    /// font from a collection, use [`FontRef::from_index`].
    pub fn new(data: &'a [u8]) -> Result<Self, ReadError> {
        Self::with_table_directory(FontData::new(data), 0, None)
    }

    /// Creates a new reference to the font at `index` in the given data.
    ///
    /// The data may be either a font collection or a single font, in which
    /// case the index must be 0.
    pub fn from_index(data: &'a [u8], index: u32) -> Result<Self, ReadError> {
        let data = FontData::new(data);
        let tag: Tag = data.read_at(0)?;
        if tag != TTC_HEADER_TAG {
            return match index {
                0 => Self::with_table_directory(data, 0, None),
                _ => Err(ReadError::InvalidCollectionIndex(index)),
            };
        }
        // ttcTag, majorVersion, minorVersion, numFonts
        let num_fonts: u32 = data.read_at(8)?;
        if index >= num_fonts {
            return Err(ReadError::InvalidCollectionIndex(index));
        }
        let offset: u32 = data.read_at(12 + index as usize * 4)?;
        Self::with_table_directory(data, offset as usize, Some(index))
    }

    /// Returns the number of fonts in the given data: the collection size
    /// for a font collection, otherwise 1.
    pub fn count(data: &'a [u8]) -> u32 {
        let data = FontData::new(data);
        match data.read_at::<Tag>(0) {
            Ok(TTC_HEADER_TAG) => data.read_at(8).unwrap_or_default(),
            Ok(_) => 1,
            Err(_) => 0,
        }
    }

    /// If the font is in a TrueType collection (ttc) file, returns the index
    /// of the font in that collection.
    pub fn ttc_index(&self) -> Option<u32> {
        self.ttc_index
    }

    /// Returns the underlying font data.
    ///
    /// For collections this is the whole file, since table offsets are
    /// relative to its start.
    pub fn data(&self) -> FontData<'a> {
        self.data
    }

    /// Returns the data for the table with the specified tag, if present.
    pub fn table_data(&self, tag: Tag) -> Option<FontData<'a>> {
        let num_records = self.records.len() / TABLE_RECORD_LEN;
        (0..num_records)
            .map(|i| i * TABLE_RECORD_LEN)
            .find(|pos| self.records.read_at::<Tag>(*pos).ok() == Some(tag))
            .and_then(|pos| {
                let offset = self.records.read_at::<u32>(pos + 8).ok()? as usize;
                let len = self.records.read_at::<u32>(pos + 12).ok()? as usize;
                if offset == 0 {
                    return None;
                }
                self.data.slice(offset..offset.checked_add(len)?)
            })
    }

    fn with_table_directory(
        data: FontData<'a>,
        offset: usize,
        ttc_index: Option<u32>,
    ) -> Result<Self, ReadError> {
        let sfnt_version: u32 = data.read_at(offset)?;
        if ![TT_SFNT_VERSION, CFF_SFNT_VERSION, TRUE_SFNT_VERSION].contains(&sfnt_version) {
            return Err(ReadError::InvalidSfnt(sfnt_version));
        }
        let num_tables = data.read_at::<u16>(offset + 4)? as usize;
        let start = offset + TABLE_DIRECTORY_LEN;
        let records = data
            .slice(start..start + num_tables * TABLE_RECORD_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        Ok(Self {
            data,
            records,
            ttc_index,
        })
    }
}

impl<'a> TableProvider<'a> for FontRef<'a> {
    fn data_for_tag(&self, tag: Tag) -> Option<FontData<'a>> {
        self.table_data(tag)
    }
}
