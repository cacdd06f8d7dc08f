//! Glyph image and advance caches for rendering strikes.
//!
//! A strike is one font rendered at one size under one device transform.
//! Text rendering asks a strike for the same glyphs over and over, so each
//! [`Strike`] keeps the native images produced by its [`Rasterizer`] in a
//! [`GlyphImageCache`] and the horizontal advances in an [`AdvanceCache`],
//! both indexed by glyph code.
//!
//! The caches are shared between threads. Lookups never block; stores are
//! serialized per cache, and when two threads render the same glyph at the
//! same time the first image stored wins and the other is released.
//!
//! Storage is chosen per strike by [`CacheLayout::select`]: a flat array for
//! small fonts at common sizes, or an array of lazily allocated 32 glyph
//! segments when only a few glyphs of a large set are likely to be used.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod advance;
mod handle;
mod image_cache;
mod layout;
mod rasterizer;
mod slots;
mod strike;
mod transform;

#[cfg(test)]
mod testing;

pub use advance::AdvanceCache;
pub use handle::{HandleWidth, ImageHandle};
pub use image_cache::{GlyphImageCache, Insertion, SLOT_MASK};
pub use layout::{CacheLayout, StrikeDesc};
pub use rasterizer::Rasterizer;
pub use slots::{SEGMENT_LEN, SEGMENT_SHIFT};
pub use strike::Strike;
pub use transform::Transform;
