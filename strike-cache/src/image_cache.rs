//! The per-strike cache of glyph images.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use parking_lot::Mutex;
use read_cmap::INVISIBLE_GLYPHS;

use crate::slots::{NarrowSlot, Slot, Slots, WideSlot};
use crate::{CacheLayout, HandleWidth, ImageHandle, Rasterizer, StrikeDesc};

/// Glyph codes with any of these bits set carry a composite font slot and
/// are not handled by the slot 0 batch path.
pub const SLOT_MASK: u32 = 0xFF00_0000;

/// The result of storing an image in a [`GlyphImageCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion {
    /// The slot was empty and now holds the image.
    Stored(ImageHandle),
    /// Another image was stored first.
    ///
    /// The caller still owns `loser` and must release it.
    Lost {
        winner: ImageHandle,
        loser: ImageHandle,
    },
}

impl Insertion {
    /// The image now cached for the glyph.
    pub fn winner(self) -> ImageHandle {
        match self {
            Self::Stored(winner) | Self::Lost { winner, .. } => winner,
        }
    }
}

enum Storage {
    Narrow(Slots<NarrowSlot>),
    Wide(Slots<WideSlot>),
}

enum Store {
    Stored,
    Occupied(u64),
    NoSlot,
}

impl Storage {
    fn new(layout: CacheLayout, len: usize) -> Self {
        match layout {
            CacheLayout::Flat32 => Self::Narrow(Slots::flat(len)),
            CacheLayout::Segmented32 => Self::Narrow(Slots::segmented(len)),
            CacheLayout::Flat64 => Self::Wide(Slots::flat(len)),
            CacheLayout::Segmented64 => Self::Wide(Slots::segmented(len)),
        }
    }

    fn get(&self, index: usize) -> u64 {
        match self {
            Self::Narrow(slots) => slots.get(index),
            Self::Wide(slots) => slots.get(index),
        }
    }

    // callers hold the cache lock
    fn store_if_empty(&self, index: usize, handle: ImageHandle) -> Store {
        fn store<S: Slot<Value = u64>>(slot: Option<&S>, raw: u64) -> Store {
            let Some(slot) = slot else {
                return Store::NoSlot;
            };
            match slot.load() {
                0 => {
                    slot.store(raw);
                    Store::Stored
                }
                existing => Store::Occupied(existing),
            }
        }
        match self {
            Self::Narrow(slots) if HandleWidth::Narrow.fits(handle) => {
                store(slots.slot(index), handle.get())
            }
            Self::Narrow(_) => Store::NoSlot,
            Self::Wide(slots) => store(slots.slot(index), handle.get()),
        }
    }

    fn take_all(&mut self) -> Vec<ImageHandle> {
        fn take<S: Slot<Value = u64>>(slots: &mut Slots<S>) -> Vec<ImageHandle> {
            let handles = slots.values().filter_map(ImageHandle::new).collect();
            slots.clear();
            handles
        }
        match self {
            Self::Narrow(slots) => take(slots),
            Self::Wide(slots) => take(slots),
        }
    }

    fn allocated(&self) -> usize {
        match self {
            Self::Narrow(slots) => slots.allocated(),
            Self::Wide(slots) => slots.allocated(),
        }
    }
}

/// Maps glyph codes to the native images rendered for one strike.
///
/// Reads are lock free. Stores are serialized by a per-cache lock and follow
/// a first writer wins policy: once a slot holds an image it is never
/// replaced, and a thread that rendered the same glyph concurrently gets the
/// stored image back along with the duty to release its own.
///
/// Storage is allocated on the first store, in the [`CacheLayout`] chosen
/// for the strike. Images that the layout cannot hold (codes beyond the
/// glyph count, or handles too wide for 32 bit slots) are kept in a side
/// table so they are still released by [`drain`](Self::drain).
pub struct GlyphImageCache {
    desc: StrikeDesc,
    width: HandleWidth,
    storage: OnceLock<Storage>,
    lock: Mutex<()>,
    has_overflow: AtomicBool,
    overflow: Mutex<HashMap<u32, ImageHandle>>,
}

impl GlyphImageCache {
    pub fn new(desc: StrikeDesc, width: HandleWidth) -> Self {
        Self {
            desc,
            width,
            storage: OnceLock::new(),
            lock: Mutex::new(()),
            has_overflow: AtomicBool::new(false),
            overflow: Mutex::new(HashMap::new()),
        }
    }

    pub fn desc(&self) -> &StrikeDesc {
        &self.desc
    }

    /// The layout this cache uses (or will use) for its storage.
    pub fn layout(&self) -> CacheLayout {
        CacheLayout::select(&self.desc, self.width)
    }

    /// Returns `true` once storage has been allocated.
    pub fn is_initialized(&self) -> bool {
        self.storage.get().is_some()
    }

    /// The number of slots with backing storage.
    pub fn allocated(&self) -> usize {
        self.storage
            .get()
            .map(Storage::allocated)
            .unwrap_or_default()
    }

    /// The cached image for `code`, if any.
    ///
    /// Invisible glyph codes are never cached.
    pub fn get(&self, code: u32) -> Option<ImageHandle> {
        if code >= INVISIBLE_GLYPHS {
            return None;
        }
        let raw = self
            .storage
            .get()
            .map(|storage| storage.get(code as usize))
            .unwrap_or_default();
        ImageHandle::new(raw).or_else(|| self.overflow_get(code))
    }

    fn overflow_get(&self, code: u32) -> Option<ImageHandle> {
        if !self.has_overflow.load(Ordering::Acquire) {
            return None;
        }
        self.overflow.lock().get(&code).copied()
    }

    /// Stores `image` for `code` unless an image is already cached.
    pub fn insert(&self, code: u32, image: ImageHandle) -> Insertion {
        let _guard = self.lock.lock();
        let storage = self.storage.get_or_init(|| {
            let layout = self.layout();
            log::debug!(
                "allocating {layout:?} glyph cache for {} glyphs at {}pt",
                self.desc.num_glyphs,
                self.desc.point_size
            );
            Storage::new(layout, self.desc.num_glyphs as usize)
        });
        let stored = if code < self.desc.num_glyphs {
            storage.store_if_empty(code as usize, image)
        } else {
            Store::NoSlot
        };
        match stored {
            Store::Stored => Insertion::Stored(image),
            Store::Occupied(existing) => match ImageHandle::new(existing) {
                Some(winner) => Insertion::Lost {
                    winner,
                    loser: image,
                },
                None => Insertion::Stored(image),
            },
            Store::NoSlot => {
                let mut overflow = self.overflow.lock();
                let insertion = match overflow.get(&code) {
                    Some(&winner) => Insertion::Lost {
                        winner,
                        loser: image,
                    },
                    None => {
                        overflow.insert(code, image);
                        Insertion::Stored(image)
                    }
                };
                self.has_overflow.store(true, Ordering::Release);
                insertion
            }
        }
    }

    /// Returns the cached image for `code`, rendering and storing it on a
    /// miss.
    ///
    /// When another thread stores an image for the same glyph first, the
    /// image rendered here is released and the stored one returned.
    pub fn get_or_create<R: Rasterizer + ?Sized>(&self, code: u32, rasterizer: &R) -> ImageHandle {
        if code >= INVISIBLE_GLYPHS {
            return rasterizer.invisible_image();
        }
        if let Some(image) = self.get(code) {
            return image;
        }
        let image = rasterizer.glyph_image(code, &self.desc);
        match self.insert(code, image) {
            Insertion::Stored(image) => image,
            Insertion::Lost { winner, loser } => {
                // a rasterizer may hand out one shared placeholder
                if loser != winner {
                    log::trace!("releasing duplicate image for glyph {code}");
                    rasterizer.release_image(loser);
                }
                winner
            }
        }
    }

    /// Resolves every code in `codes`, writing images to the matching
    /// positions of `images`.
    pub fn get_or_create_batch<R: Rasterizer + ?Sized>(
        &self,
        codes: &[u32],
        images: &mut [ImageHandle],
        rasterizer: &R,
    ) {
        for (code, image) in codes.iter().zip(images.iter_mut()) {
            *image = self.get_or_create(*code, rasterizer);
        }
    }

    /// Resolves the leading run of codes that carry no composite font slot
    /// bits, returning how many were resolved.
    ///
    /// The caller handles the remaining codes, starting with the first
    /// tagged one.
    pub fn get_or_create_slot0_batch<R: Rasterizer + ?Sized>(
        &self,
        codes: &[u32],
        images: &mut [ImageHandle],
        rasterizer: &R,
    ) -> usize {
        let mut count = 0;
        for (code, image) in codes.iter().zip(images.iter_mut()) {
            if code & SLOT_MASK != 0 {
                break;
            }
            *image = match self.get(*code) {
                Some(cached) => cached,
                None => self.get_or_create(*code, rasterizer),
            };
            count += 1;
        }
        count
    }

    /// Removes every cached image, returning them to the caller for release.
    ///
    /// A handle cached for several codes is returned once.
    pub fn drain(&mut self) -> Vec<ImageHandle> {
        let mut images = self
            .storage
            .get_mut()
            .map(Storage::take_all)
            .unwrap_or_default();
        images.extend(self.overflow.get_mut().drain().map(|(_, image)| image));
        *self.has_overflow.get_mut() = false;
        images.sort_unstable();
        images.dedup();
        images
    }
}

impl std::fmt::Debug for GlyphImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphImageCache")
            .field("desc", &self.desc)
            .field("layout", &self.layout())
            .field("allocated", &self.allocated())
            .finish()
    }
}
