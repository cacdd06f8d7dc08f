//! Flat and segmented arrays of atomic cache slots.
//!
//! Reads never lock. Writers are expected to hold the owning cache's lock,
//! which makes the check for an empty slot and the following store atomic
//! with respect to other writers.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::OnceLock;

/// A single atomic cache entry with a distinguished empty value.
pub(crate) trait Slot: Send + Sync {
    type Value: Copy + PartialEq;

    const EMPTY: Self::Value;

    fn empty() -> Self;
    fn load(&self) -> Self::Value;
    fn store(&self, value: Self::Value);

    fn is_empty(&self) -> bool {
        self.load() == Self::EMPTY
    }
}

/// A handle stored in 32 bits.
pub(crate) struct NarrowSlot(AtomicU32);

impl Slot for NarrowSlot {
    type Value = u64;
    const EMPTY: u64 = 0;

    fn empty() -> Self {
        Self(AtomicU32::new(0))
    }

    fn load(&self) -> u64 {
        self.0.load(Ordering::Acquire) as u64
    }

    fn store(&self, value: u64) {
        debug_assert!(value <= u32::MAX as u64);
        self.0.store(value as u32, Ordering::Release)
    }
}

/// A handle stored in 64 bits.
pub(crate) struct WideSlot(AtomicU64);

impl Slot for WideSlot {
    type Value = u64;
    const EMPTY: u64 = 0;

    fn empty() -> Self {
        Self(AtomicU64::new(0))
    }

    fn load(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    fn store(&self, value: u64) {
        self.0.store(value, Ordering::Release)
    }
}

/// An advance stored as the bits of an `f32`, with `f32::MAX` meaning
/// empty.
pub(crate) struct AdvanceSlot(AtomicU32);

impl Slot for AdvanceSlot {
    type Value = f32;
    const EMPTY: f32 = f32::MAX;

    fn empty() -> Self {
        Self(AtomicU32::new(f32::MAX.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release)
    }
}

/// log2 of the number of slots in a segment.
pub const SEGMENT_SHIFT: u32 = 5;
/// The number of slots in a segment.
pub const SEGMENT_LEN: usize = 1 << SEGMENT_SHIFT;
const SEGMENT_MASK: usize = SEGMENT_LEN - 1;

pub(crate) enum Slots<S> {
    /// Every slot allocated up front.
    Flat(Box<[S]>),
    /// Slots allocated a segment at a time, on first write.
    Segmented(Box<[OnceLock<Box<[S]>>]>),
}

impl<S: Slot> Slots<S> {
    pub(crate) fn flat(len: usize) -> Self {
        Self::Flat(new_slots(len))
    }

    pub(crate) fn segmented(len: usize) -> Self {
        let num_segments = len.div_ceil(SEGMENT_LEN);
        Self::Segmented((0..num_segments).map(|_| OnceLock::new()).collect())
    }

    /// The value at `index`, or [`Slot::EMPTY`] if nothing has been stored.
    pub(crate) fn get(&self, index: usize) -> S::Value {
        let value = match self {
            Self::Flat(slots) => slots.get(index).map(S::load),
            Self::Segmented(segments) => segments
                .get(index >> SEGMENT_SHIFT)
                .and_then(OnceLock::get)
                .map(|segment| segment[index & SEGMENT_MASK].load()),
        };
        value.unwrap_or(S::EMPTY)
    }

    /// The slot at `index`, allocating its segment if needed.
    pub(crate) fn slot(&self, index: usize) -> Option<&S> {
        match self {
            Self::Flat(slots) => slots.get(index),
            Self::Segmented(segments) => {
                let segment = segments.get(index >> SEGMENT_SHIFT)?;
                let slots = segment.get_or_init(|| new_slots(SEGMENT_LEN));
                slots.get(index & SEGMENT_MASK)
            }
        }
    }

    /// Every non-empty value, in index order.
    pub(crate) fn values(&self) -> impl Iterator<Item = S::Value> + '_ {
        let segments: Box<dyn Iterator<Item = &[S]> + '_> = match self {
            Self::Flat(slots) => Box::new(std::iter::once(&slots[..])),
            Self::Segmented(segments) => Box::new(
                segments
                    .iter()
                    .filter_map(OnceLock::get)
                    .map(|slots| &slots[..]),
            ),
        };
        segments
            .flat_map(|slots| slots.iter())
            .map(S::load)
            .filter(|value| *value != S::EMPTY)
    }

    /// Resets every slot to empty, releasing segments.
    pub(crate) fn clear(&mut self) {
        match self {
            Self::Flat(slots) => slots.iter().for_each(|slot| slot.store(S::EMPTY)),
            Self::Segmented(segments) => segments.iter_mut().for_each(|segment| {
                segment.take();
            }),
        }
    }

    /// The number of slots that have backing storage.
    pub(crate) fn allocated(&self) -> usize {
        match self {
            Self::Flat(slots) => slots.len(),
            Self::Segmented(segments) => {
                let live = segments.iter().filter_map(OnceLock::get).count();
                live * SEGMENT_LEN
            }
        }
    }
}

fn new_slots<S: Slot>(len: usize) -> Box<[S]> {
    std::iter::repeat_with(S::empty).take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_allocate_on_write() {
        let slots = Slots::<WideSlot>::segmented(100);
        assert_eq!(slots.allocated(), 0);
        assert_eq!(slots.get(40), 0);
        slots.slot(40).unwrap().store(9);
        assert_eq!(slots.allocated(), SEGMENT_LEN);
        assert_eq!(slots.get(40), 9);
        assert_eq!(slots.get(41), 0);
        // the last, partial segment
        slots.slot(99).unwrap().store(3);
        assert_eq!(slots.allocated(), 2 * SEGMENT_LEN);
        assert!(slots.slot(128).is_none());
        assert_eq!(slots.values().collect::<Vec<_>>(), [9, 3]);
    }

    #[test]
    fn flat_and_clear() {
        let mut slots = Slots::<NarrowSlot>::flat(10);
        assert_eq!(slots.allocated(), 10);
        slots.slot(2).unwrap().store(u32::MAX as u64);
        assert_eq!(slots.get(2), u32::MAX as u64);
        assert_eq!(slots.get(10), 0);
        slots.clear();
        assert_eq!(slots.values().count(), 0);
    }

    #[test]
    fn advance_empty_is_max() {
        let slots = Slots::<AdvanceSlot>::segmented(64);
        assert_eq!(slots.get(3), f32::MAX);
        slots.slot(3).unwrap().store(0.0);
        assert!(!slots.slot(3).unwrap().is_empty());
        assert_eq!(slots.get(3), 0.0);
    }
}
