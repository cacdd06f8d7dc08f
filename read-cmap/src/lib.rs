//! Reading and querying OpenType character to glyph mapping tables
//!
//! This crate parses the subtables of the [cmap] table into owned,
//! immutable structures and answers the question "which glyph draws this
//! character?" for text rendering code.
//!
//! All of the subtable formats used in practice are supported: 0, 2, 4, 6,
//! 8, 10 and 12 for nominal mappings, and 14 for Unicode variation
//! sequences. Subtables in the legacy Microsoft CJK encodings are queried
//! with Unicode code points through translation tables built by an
//! [`EncodingRegistry`](encoding::EncodingRegistry).
//!
//! # Example
//!
//! ```no_run
//! # let path_to_my_font_file = std::path::Path::new("");
//! use read_cmap::{tables::cmap::CmapSelector, FontRef, GlyphMapper};
//! let font_bytes = std::fs::read(path_to_my_font_file).unwrap();
//! // Single fonts only. for font collections (.ttc) use FontRef::from_index
//! let font = FontRef::new(&font_bytes).expect("failed to read font data");
//! let mapper = GlyphMapper::from_font(&CmapSelector::default(), &font).expect("missing 'maxp' table");
//!
//! println!("'A' is glyph {} of {}", mapper.char_to_glyph('A' as u32), mapper.num_glyphs());
//! ```
//!
//! [cmap]: https://learn.microsoft.com/en-us/typography/opentype/spec/cmap

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod encoding;
mod font;
mod font_data;
mod mapper;
mod raw;
mod read;
mod table_provider;
pub mod tables;
pub mod types;

pub use font::FontRef;
pub use font_data::{Cursor, FontData};
pub use mapper::GlyphMapper;
pub use raw::Scalar;
pub use read::ReadError;
pub use table_provider::TableProvider;
pub use types::{GlyphId, PlatformId, Tag, Uint24, INVISIBLE_GLYPHS};
