//! The interface to the code that actually renders glyphs.

use std::sync::Arc;

use crate::{HandleWidth, ImageHandle, StrikeDesc};

/// Produces and releases native glyph images.
///
/// A rasterizer owns every handle it returns. Once a handle is stored in a
/// cache, the cache owns it and hands it back through
/// [`release_image`](Rasterizer::release_image) exactly once.
///
/// Failure to render a glyph is not an error: the rasterizer should return
/// a placeholder image, which is cached like any other so that a glyph that
/// cannot be rendered is not attempted again. The same placeholder may be
/// returned for many glyphs; it is released once.
pub trait Rasterizer: Send + Sync {
    /// Renders the glyph `code` for the strike described by `desc`.
    fn glyph_image(&self, code: u32, desc: &StrikeDesc) -> ImageHandle;

    /// The horizontal advance of the glyph `code`, in device units.
    fn glyph_advance(&self, code: u32, desc: &StrikeDesc) -> f32;

    /// The horizontal advance recorded in a previously rendered image.
    fn image_advance(&self, image: ImageHandle) -> f32;

    /// The shared image returned for invisible glyphs.
    ///
    /// This handle is never stored in a cache and never released.
    fn invisible_image(&self) -> ImageHandle;

    /// Frees an image that is no longer referenced by any cache.
    fn release_image(&self, image: ImageHandle);

    /// The size of the handles this rasterizer produces.
    fn handle_width(&self) -> HandleWidth {
        HandleWidth::native()
    }
}

impl<R: Rasterizer + ?Sized> Rasterizer for &R {
    fn glyph_image(&self, code: u32, desc: &StrikeDesc) -> ImageHandle {
        (**self).glyph_image(code, desc)
    }

    fn glyph_advance(&self, code: u32, desc: &StrikeDesc) -> f32 {
        (**self).glyph_advance(code, desc)
    }

    fn image_advance(&self, image: ImageHandle) -> f32 {
        (**self).image_advance(image)
    }

    fn invisible_image(&self) -> ImageHandle {
        (**self).invisible_image()
    }

    fn release_image(&self, image: ImageHandle) {
        (**self).release_image(image)
    }

    fn handle_width(&self) -> HandleWidth {
        (**self).handle_width()
    }
}

impl<R: Rasterizer + ?Sized> Rasterizer for Arc<R> {
    fn glyph_image(&self, code: u32, desc: &StrikeDesc) -> ImageHandle {
        (**self).glyph_image(code, desc)
    }

    fn glyph_advance(&self, code: u32, desc: &StrikeDesc) -> f32 {
        (**self).glyph_advance(code, desc)
    }

    fn image_advance(&self, image: ImageHandle) -> f32 {
        (**self).image_advance(image)
    }

    fn invisible_image(&self) -> ImageHandle {
        (**self).invisible_image()
    }

    fn release_image(&self, image: ImageHandle) {
        (**self).release_image(image)
    }

    fn handle_width(&self) -> HandleWidth {
        (**self).handle_width()
    }
}
