use std::sync::atomic::{ AtomicBool, AtomicI64, Ordering };

use crossbeam::utils::CachePadded;

use crate::constants::INITIAL_CURSOR;
use crate::disruptor::Sequence;

/// Cache-line padded sequence to prevent false sharing.
///
/// Every consumer advances its own cursor on every item it reads while
/// producers scan all of them. Padding each cursor to its own cache line
/// keeps one consumer's stores from invalidating the line another consumer
/// is writing.
#[derive(Debug)]
pub struct PaddedSequence {
    sequence: CachePadded<AtomicI64>,
}

impl PaddedSequence {
    pub fn new(initial: Sequence) -> Self {
        Self {
            sequence: CachePadded::new(AtomicI64::new(initial)),
        }
    }

    #[inline(always)]
    pub fn get(&self) -> Sequence {
        self.sequence.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn relaxed(&self) -> Sequence {
        self.sequence.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub fn set(&self, value: Sequence) {
        self.sequence.store(value, Ordering::Release);
    }

    /// Reserve `count` sequences, returning the first one
    #[inline(always)]
    pub fn claim(&self, count: i64) -> Sequence {
        self.sequence.fetch_add(count, Ordering::AcqRel) + 1
    }

    #[inline(always)]
    pub fn compare_exchange(&self, current: Sequence, next: Sequence) -> bool {
        self.sequence
            .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    /// Raise the value to at least `value`, never lowering it
    #[inline(always)]
    pub fn raise_to(&self, value: Sequence) {
        self.sequence.fetch_max(value, Ordering::AcqRel);
    }
}

impl Default for PaddedSequence {
    fn default() -> Self {
        Self::new(INITIAL_CURSOR)
    }
}

/// A consumer's cursor plus the flag that keeps its reader exclusive.
#[derive(Debug, Default)]
pub struct ConsumerSequence {
    pub(crate) cursor: PaddedSequence,
    reading: AtomicBool,
}

impl ConsumerSequence {
    /// Mark this consumer as being read from.
    ///
    /// # Panics
    /// Panics if another thread is already inside a read for the same consumer.
    pub(crate) fn enter(&self, consumer_id: usize) -> ReadSession<'_> {
        if self.reading.swap(true, Ordering::Acquire) {
            panic!("concurrent reads for consumer {consumer_id}: each consumer id belongs to one thread");
        }
        ReadSession { owner: self }
    }
}

/// Held for the duration of one read; releases the consumer on drop.
pub(crate) struct ReadSession<'a> {
    owner: &'a ConsumerSequence,
}

impl Drop for ReadSession<'_> {
    fn drop(&mut self) {
        self.owner.reading.store(false, Ordering::Release);
    }
}
