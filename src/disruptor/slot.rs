//! Tagged slot storage.
//!
//! A slot carries the payload, the sequence it currently represents, and an
//! availability flag. Readers accept a slot only when the flag is set AND the
//! tag equals the sequence they expect, so a flag left over from a previous
//! lap of the ring is never mistaken for fresh data.

use std::cell::UnsafeCell;
use std::sync::atomic::{ AtomicBool, AtomicI64, Ordering };

use crate::disruptor::Sequence;

/// Tag of a slot that has never been written
const UNWRITTEN: Sequence = Sequence::MIN;

pub struct Slot<T> {
    value: UnsafeCell<Option<T>>,
    sequence: AtomicI64,
    available: AtomicBool,
}

// SAFETY: the payload is written only by the producer that owns the slot's
// current sequence, and only after every consumer has moved past the previous
// occupant (gating barrier). Readers clone through a shared reference, so
// `T: Sync` is required to hand `&T` to several consumer threads.
unsafe impl<T: Send> Send for Slot<T> {}
unsafe impl<T: Send + Sync> Sync for Slot<T> {}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self {
            value: UnsafeCell::new(None),
            sequence: AtomicI64::new(UNWRITTEN),
            available: AtomicBool::new(false),
        }
    }

    /// Write `value` as the payload for `sequence` and publish it.
    ///
    /// # Safety
    /// - Caller must own `sequence` (claimed from the write cursor)
    /// - Every consumer must have consumed `sequence - capacity`
    #[inline]
    pub unsafe fn publish(&self, sequence: Sequence, value: T) {
        self.available.store(false, Ordering::Relaxed);
        *self.value.get() = Some(value);
        // The tag store is what readers synchronise with; the payload write
        // above is visible to any reader that observes this tag.
        self.sequence.store(sequence, Ordering::Release);
        self.available.store(true, Ordering::Release);
    }

    /// Whether this slot holds the fully written payload for `sequence`.
    #[inline]
    pub fn is_published(&self, sequence: Sequence) -> bool {
        self.available.load(Ordering::Acquire) && self.sequence.load(Ordering::Acquire) == sequence
    }

    /// Clone the payload.
    ///
    /// # Safety
    /// `is_published(sequence)` must have returned true for the sequence the
    /// caller is reading, and the caller's consumer cursor must still be below
    /// that sequence so no producer can reclaim the slot meanwhile.
    #[inline]
    pub unsafe fn read(&self) -> Option<T> where T: Clone {
        (*self.value.get()).clone()
    }

    /// Tag currently stored in the slot, if it has ever been written
    pub fn tag(&self) -> Option<Sequence> {
        match self.sequence.load(Ordering::Acquire) {
            UNWRITTEN => None,
            seq => Some(seq),
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("sequence", &self.tag())
            .field("available", &self.available.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
