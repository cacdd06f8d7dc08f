//! The cmap table and its subtables.

pub mod cmap;
