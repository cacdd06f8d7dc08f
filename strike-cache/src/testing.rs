//! A rasterizer that records what the caches ask of it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::{HandleWidth, ImageHandle, Rasterizer, StrikeDesc};

pub(crate) const INVISIBLE: u64 = 0xFFFF_FFFF;

pub(crate) struct TestRasterizer {
    next: AtomicU64,
    width: HandleWidth,
    images: Mutex<HashMap<u64, u32>>,
    rendered: Mutex<Vec<u32>>,
    advances_queried: Mutex<Vec<u32>>,
    released: Mutex<Vec<u64>>,
    shared: HashMap<u32, u64>,
}

impl TestRasterizer {
    pub(crate) fn new() -> Self {
        Self::with_width(HandleWidth::Wide)
    }

    pub(crate) fn with_width(width: HandleWidth) -> Self {
        Self {
            next: AtomicU64::new(1),
            width,
            images: Default::default(),
            rendered: Default::default(),
            advances_queried: Default::default(),
            released: Default::default(),
            shared: Default::default(),
        }
    }

    /// Hand out the same handle, `raw`, for every code in `codes`.
    pub(crate) fn sharing(mut self, codes: &[u32], raw: u64) -> Self {
        self.shared.extend(codes.iter().map(|code| (*code, raw)));
        self
    }

    /// Start handing out handles from `first`.
    pub(crate) fn starting_at(self, first: u64) -> Self {
        self.next.store(first, Ordering::Relaxed);
        self
    }

    pub(crate) fn advance_for(code: u32) -> f32 {
        code as f32 * 0.5 + 1.0
    }

    pub(crate) fn rendered(&self) -> Vec<u32> {
        self.rendered.lock().clone()
    }

    pub(crate) fn advances_queried(&self) -> Vec<u32> {
        self.advances_queried.lock().clone()
    }

    pub(crate) fn released(&self) -> Vec<u64> {
        let mut released = self.released.lock().clone();
        released.sort_unstable();
        released
    }
}

impl Rasterizer for TestRasterizer {
    fn glyph_image(&self, code: u32, _desc: &StrikeDesc) -> ImageHandle {
        let raw = match self.shared.get(&code) {
            Some(raw) => *raw,
            None => self.next.fetch_add(1, Ordering::Relaxed),
        };
        self.images.lock().insert(raw, code);
        self.rendered.lock().push(code);
        ImageHandle::new(raw).unwrap()
    }

    fn glyph_advance(&self, code: u32, _desc: &StrikeDesc) -> f32 {
        self.advances_queried.lock().push(code);
        Self::advance_for(code)
    }

    fn image_advance(&self, image: ImageHandle) -> f32 {
        let code = self.images.lock().get(&image.get()).copied().unwrap();
        Self::advance_for(code)
    }

    fn invisible_image(&self) -> ImageHandle {
        ImageHandle::new(INVISIBLE).unwrap()
    }

    fn release_image(&self, image: ImageHandle) {
        assert_ne!(image.get(), INVISIBLE, "released the invisible image");
        self.released.lock().push(image.get());
    }

    fn handle_width(&self) -> HandleWidth {
        self.width
    }
}
