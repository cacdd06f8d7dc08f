//! The per-strike cache of horizontal advances.

use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::slots::{AdvanceSlot, Slot, Slots};
use crate::StrikeDesc;

/// Maps glyph codes to horizontal advances for one strike.
///
/// Layout code asks for advances far more often than rendering code asks
/// for images, so advances are cached separately and can be filled without
/// rendering anything. The cache uses flat or segmented storage under the
/// same rule as [`GlyphImageCache`](crate::GlyphImageCache).
pub struct AdvanceCache {
    num_glyphs: u32,
    segmented: bool,
    slots: OnceLock<Slots<AdvanceSlot>>,
    lock: Mutex<()>,
}

impl AdvanceCache {
    pub fn new(desc: &StrikeDesc) -> Self {
        Self {
            num_glyphs: desc.num_glyphs,
            segmented: desc.is_segmented(),
            slots: OnceLock::new(),
            lock: Mutex::new(()),
        }
    }

    pub fn is_segmented(&self) -> bool {
        self.segmented
    }

    pub fn is_initialized(&self) -> bool {
        self.slots.get().is_some()
    }

    pub fn get(&self, code: u32) -> Option<f32> {
        let advance = self
            .slots
            .get()
            .map(|slots| slots.get(code as usize))
            .unwrap_or(AdvanceSlot::EMPTY);
        (advance != AdvanceSlot::EMPTY).then_some(advance)
    }

    /// Stores `advance` for `code` unless one is already cached, returning
    /// the cached value.
    ///
    /// Codes outside the glyph range are not stored.
    pub fn insert(&self, code: u32, advance: f32) -> f32 {
        if code >= self.num_glyphs || advance == AdvanceSlot::EMPTY {
            return advance;
        }
        let _guard = self.lock.lock();
        let slots = self.slots.get_or_init(|| {
            let len = self.num_glyphs as usize;
            if self.segmented {
                Slots::segmented(len)
            } else {
                Slots::flat(len)
            }
        });
        match slots.slot(code as usize) {
            Some(slot) if slot.is_empty() => {
                slot.store(advance);
                advance
            }
            Some(slot) => slot.load(),
            None => advance,
        }
    }

    /// Returns the cached advance for `code`, computing and storing it with
    /// `f` on a miss.
    pub fn get_or_insert_with(&self, code: u32, f: impl FnOnce() -> f32) -> f32 {
        match self.get(code) {
            Some(advance) => advance,
            None => self.insert(code, f()),
        }
    }
}

impl std::fmt::Debug for AdvanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvanceCache")
            .field("num_glyphs", &self.num_glyphs)
            .field("segmented", &self.segmented)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
