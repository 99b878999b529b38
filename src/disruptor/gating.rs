//! Gating barrier: the minimum consumer cursor.
//!
//! Producers may only write sequence `S` once the slot's previous occupant
//! `S - capacity` has been consumed by every consumer. The barrier caches the
//! slowest cursor so the producer fast path is a single load; producers fall
//! back to a full scan when the cached value is too old to admit them.

use crate::disruptor::common::{ ConsumerSequence, PaddedSequence };
use crate::disruptor::Sequence;
use crate::error::{ Result, SluiceError };

#[derive(Debug)]
pub struct GatingBarrier {
    consumers: Box<[ConsumerSequence]>,
    cached_min: PaddedSequence,
}

impl GatingBarrier {
    pub fn new(num_consumers: usize) -> Self {
        let consumers = (0..num_consumers)
            .map(|_| ConsumerSequence::default())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            consumers,
            cached_min: PaddedSequence::default(),
        }
    }

    #[inline]
    pub fn num_consumers(&self) -> usize {
        self.consumers.len()
    }

    #[inline]
    pub fn consumer(&self, id: usize) -> Result<&ConsumerSequence> {
        self.consumers
            .get(id)
            .ok_or_else(|| SluiceError::invalid_consumer(id, self.consumers.len()))
    }

    /// Scan every consumer cursor without touching the cache
    #[inline]
    pub fn minimum(&self) -> Sequence {
        self.consumers
            .iter()
            .map(|c| c.cursor.get())
            .min()
            .unwrap_or(Sequence::MAX)
    }

    /// Recompute the minimum from current (post-advance) cursors and publish it.
    pub fn refresh(&self) -> Sequence {
        let min = self.minimum();
        self.cached_min.raise_to(min);
        min
    }

    /// Last published minimum; may lag the true value but never exceeds it
    #[inline]
    pub fn cached(&self) -> Sequence {
        self.cached_min.get()
    }

    /// Whether a producer may overwrite the slot for `sequence`.
    #[inline]
    pub fn admits(&self, sequence: Sequence, capacity: i64) -> bool {
        sequence - self.cached() <= capacity || sequence - self.refresh() <= capacity
    }
}
