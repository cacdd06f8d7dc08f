//! A rendering strike: one font at one size and transform.

use std::sync::atomic::{AtomicBool, Ordering};

use read_cmap::INVISIBLE_GLYPHS;

use crate::{AdvanceCache, CacheLayout, GlyphImageCache, ImageHandle, Rasterizer, StrikeDesc};

/// Owns the image and advance caches of a strike along with the rasterizer
/// that fills them.
///
/// Dropping a strike releases every image it cached.
pub struct Strike<R: Rasterizer> {
    rasterizer: R,
    images: GlyphImageCache,
    advances: AdvanceCache,
    image_with_advance: bool,
    warned_out_of_range: AtomicBool,
}

impl<R: Rasterizer> Strike<R> {
    pub fn new(desc: StrikeDesc, rasterizer: R) -> Self {
        let width = rasterizer.handle_width();
        Self {
            images: GlyphImageCache::new(desc, width),
            advances: AdvanceCache::new(&desc),
            image_with_advance: desc.image_with_advance(),
            warned_out_of_range: AtomicBool::new(false),
            rasterizer,
        }
    }

    pub fn desc(&self) -> &StrikeDesc {
        self.images.desc()
    }

    pub fn layout(&self) -> CacheLayout {
        self.images.layout()
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn image_cache(&self) -> &GlyphImageCache {
        &self.images
    }

    pub fn advance_cache(&self) -> &AdvanceCache {
        &self.advances
    }

    /// Returns `true` if advances are read from rendered images.
    pub fn image_with_advance(&self) -> bool {
        self.image_with_advance
    }

    fn is_invisible(&self, code: u32) -> bool {
        if code >= INVISIBLE_GLYPHS {
            return true;
        }
        if code >= self.desc().num_glyphs {
            // once per strike; a bad font asks for the same glyphs repeatedly
            if !self.warned_out_of_range.swap(true, Ordering::Relaxed) {
                log::warn!(
                    "glyph {code} out of range for strike with {} glyphs",
                    self.desc().num_glyphs
                );
            }
            return true;
        }
        false
    }

    /// The image for glyph `code`, rendered on first use.
    pub fn glyph_image(&self, code: u32) -> ImageHandle {
        if self.is_invisible(code) {
            return self.rasterizer.invisible_image();
        }
        self.images.get_or_create(code, &self.rasterizer)
    }

    pub fn glyph_images(&self, codes: &[u32], images: &mut [ImageHandle]) {
        for (code, image) in codes.iter().zip(images.iter_mut()) {
            *image = self.glyph_image(*code);
        }
    }

    /// Resolves the leading run of codes without composite font slot bits,
    /// returning how many were resolved.
    pub fn slot0_glyph_images(&self, codes: &[u32], images: &mut [ImageHandle]) -> usize {
        let run = codes
            .iter()
            .position(|code| code & crate::SLOT_MASK != 0)
            .unwrap_or(codes.len())
            .min(images.len());
        if codes[..run]
            .iter()
            .all(|code| *code >= INVISIBLE_GLYPHS || *code < self.desc().num_glyphs)
        {
            return self
                .images
                .get_or_create_slot0_batch(&codes[..run], &mut images[..run], &self.rasterizer);
        }
        self.glyph_images(&codes[..run], &mut images[..run]);
        run
    }

    /// The horizontal advance of glyph `code`, or zero for invisible glyphs.
    pub fn glyph_advance(&self, code: u32) -> f32 {
        if self.is_invisible(code) {
            return 0.0;
        }
        self.advances.get_or_insert_with(code, || {
            if self.image_with_advance {
                let image = self.images.get_or_create(code, &self.rasterizer);
                self.rasterizer.image_advance(image)
            } else {
                self.rasterizer.glyph_advance(code, self.images.desc())
            }
        })
    }
}

impl<R: Rasterizer> Drop for Strike<R> {
    fn drop(&mut self) {
        let images = self.images.drain();
        log::trace!("releasing {} cached glyph images", images.len());
        for image in images {
            self.rasterizer.release_image(image);
        }
    }
}

impl<R: Rasterizer> std::fmt::Debug for Strike<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strike")
            .field("images", &self.images)
            .field("advances", &self.advances)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{TestRasterizer, INVISIBLE};
    use crate::{HandleWidth, Transform};

    fn strike(num_glyphs: u32, point_size: f32) -> Strike<Arc<TestRasterizer>> {
        Strike::new(
            StrikeDesc::new(num_glyphs, point_size),
            Arc::new(TestRasterizer::new()),
        )
    }

    #[test]
    fn out_of_range_glyphs_are_invisible() {
        let _ = env_logger::builder().is_test(true).try_init();
        let strike = strike(10, 12.0);
        assert!(!strike.warned_out_of_range.load(Ordering::Relaxed));
        assert_eq!(strike.glyph_image(10).get(), INVISIBLE);
        assert!(strike.warned_out_of_range.load(Ordering::Relaxed));
        assert_eq!(strike.glyph_image(11).get(), INVISIBLE);
        assert_eq!(strike.glyph_image(0xFFFE).get(), INVISIBLE);
        assert_eq!(strike.glyph_advance(10), 0.0);
        assert_eq!(strike.glyph_advance(0xFFFF), 0.0);
        assert!(strike.rasterizer().rendered().is_empty());
        assert!(strike.rasterizer().advances_queried().is_empty());
    }

    #[test]
    fn small_strikes_read_advance_from_image() {
        let strike = strike(10, 12.0);
        assert!(strike.image_with_advance());
        assert_eq!(strike.glyph_advance(4), TestRasterizer::advance_for(4));
        assert_eq!(strike.glyph_advance(4), TestRasterizer::advance_for(4));
        assert_eq!(strike.rasterizer().rendered(), [4]);
        assert!(strike.rasterizer().advances_queried().is_empty());
        // the image rendered for the advance is reused
        strike.glyph_image(4);
        assert_eq!(strike.rasterizer().rendered(), [4]);
    }

    #[test]
    fn large_strikes_query_advance() {
        let desc = StrikeDesc::new(10, 12.0).with_transform(Transform::scale(10.0));
        let strike = Strike::new(desc, TestRasterizer::new());
        assert!(!strike.image_with_advance());
        assert_eq!(strike.glyph_advance(4), TestRasterizer::advance_for(4));
        assert_eq!(strike.glyph_advance(4), TestRasterizer::advance_for(4));
        assert_eq!(strike.rasterizer().advances_queried(), [4]);
        assert!(strike.rasterizer().rendered().is_empty());
    }

    #[test]
    fn slot0_images() {
        let strike = strike(100, 12.0);
        let codes = [5, 6, 200, 0x0200_0001];
        let mut images = [ImageHandle::new(1).unwrap(); 4];
        assert_eq!(strike.slot0_glyph_images(&codes, &mut images), 3);
        assert_eq!(images[2].get(), INVISIBLE);
        assert_eq!(strike.rasterizer().rendered(), [5, 6]);
    }

    #[test]
    fn drop_releases_each_image_once() {
        let raster = Arc::new(TestRasterizer::with_width(HandleWidth::Narrow));
        let desc = StrikeDesc::new(500, 12.0);
        let strike = Strike::new(desc, raster.clone());
        assert_eq!(strike.layout(), CacheLayout::Segmented32);
        let mut images = [0, 1, 100, 499, 100, 0xFFFF]
            .into_iter()
            .map(|code| strike.glyph_image(code).get())
            .filter(|raw| *raw != INVISIBLE)
            .collect::<Vec<_>>();
        images.sort_unstable();
        images.dedup();
        drop(strike);
        assert_eq!(raster.released(), images);
    }

    #[test]
    fn shared_placeholder_released_once() {
        const PLACEHOLDER: u64 = 0xEEEE;
        let raster = TestRasterizer::new().sharing(&[3, 5], PLACEHOLDER);
        let raster = Arc::new(raster);
        let strike = Strike::new(StrikeDesc::new(10, 12.0), raster.clone());
        assert_eq!(strike.glyph_image(3).get(), PLACEHOLDER);
        assert_eq!(strike.glyph_image(5).get(), PLACEHOLDER);
        let other = strike.glyph_image(1).get();
        assert_ne!(other, PLACEHOLDER);
        drop(strike);
        assert_eq!(raster.released(), vec![other, PLACEHOLDER]);
    }
}
