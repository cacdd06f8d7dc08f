//! Choosing how a strike stores its cached glyphs.

use crate::{HandleWidth, Transform};

/// The parameters of a strike that determine its cache layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrikeDesc {
    /// The number of glyphs in the font.
    pub num_glyphs: u32,
    /// The font size in points.
    pub point_size: f32,
    /// The device transform.
    pub transform: Transform,
}

impl StrikeDesc {
    /// Strikes whose glyph matrix stays within this scale fetch the image
    /// and advance of a glyph together.
    pub const MAX_IMAGE_WITH_ADVANCE_SCALE: f32 = 48.0;

    pub fn new(num_glyphs: u32, point_size: f32) -> Self {
        Self {
            num_glyphs,
            point_size,
            transform: Transform::IDENTITY,
        }
    }

    pub fn with_transform(self, transform: Transform) -> Self {
        Self { transform, ..self }
    }

    /// The transform from glyph space to device space: the device transform
    /// scaled by the point size.
    pub fn glyph_transform(&self) -> Transform {
        self.transform * Transform::scale(self.point_size)
    }

    /// Returns `true` if rasterizing a glyph is cheap enough that its
    /// advance should be read from the image rather than queried separately.
    pub fn image_with_advance(&self) -> bool {
        self.glyph_transform().max_scale_component() <= Self::MAX_IMAGE_WITH_ADVANCE_SCALE
    }

    /// Returns `true` if caches for this strike should allocate storage a
    /// segment at a time.
    ///
    /// Large fonts always segment. Smaller fonts segment at transforms and
    /// sizes outside the typical UI range, where few glyphs tend to be used
    /// per strike.
    pub fn is_segmented(&self) -> bool {
        let int_size = self.point_size as i32;
        let atypical = !self.transform.is_simple()
            || self.point_size != int_size as f32
            || int_size < CacheLayout::MIN_TYPICAL_SIZE
            || int_size > CacheLayout::MAX_TYPICAL_SIZE;
        self.num_glyphs > CacheLayout::SEGMENTED_ALWAYS
            || (self.num_glyphs > CacheLayout::SEGMENTED_IF_ATYPICAL && atypical)
    }
}

impl Default for StrikeDesc {
    fn default() -> Self {
        Self::new(0, 12.0)
    }
}

/// The storage used by a [`GlyphImageCache`](crate::GlyphImageCache).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheLayout {
    Flat32,
    Flat64,
    Segmented32,
    Segmented64,
}

impl CacheLayout {
    /// Fonts with more glyphs than this always use segmented storage.
    pub const SEGMENTED_ALWAYS: u32 = 8 * crate::SEGMENT_LEN as u32;
    /// Fonts with more glyphs than this use segmented storage for atypical
    /// strikes.
    pub const SEGMENTED_IF_ATYPICAL: u32 = 2 * crate::SEGMENT_LEN as u32;
    pub const MIN_TYPICAL_SIZE: i32 = 6;
    pub const MAX_TYPICAL_SIZE: i32 = 36;

    pub fn select(desc: &StrikeDesc, width: HandleWidth) -> Self {
        match (desc.is_segmented(), width) {
            (false, HandleWidth::Narrow) => Self::Flat32,
            (false, HandleWidth::Wide) => Self::Flat64,
            (true, HandleWidth::Narrow) => Self::Segmented32,
            (true, HandleWidth::Wide) => Self::Segmented64,
        }
    }

    pub fn is_segmented(self) -> bool {
        matches!(self, Self::Segmented32 | Self::Segmented64)
    }

    pub fn handle_width(self) -> HandleWidth {
        match self {
            Self::Flat32 | Self::Segmented32 => HandleWidth::Narrow,
            Self::Flat64 | Self::Segmented64 => HandleWidth::Wide,
        }
    }
}
