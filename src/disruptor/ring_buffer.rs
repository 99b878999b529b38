//! RingBuffer - broadcast ring buffer with sequence-tagged slots
//!
//! Any number of producers publish through `put()`; each of the
//! `num_consumers` consumers independently reads the whole stream through
//! `get()` with its own id.
//!
//! ## APIs
//!
//! Blocking (suspends through the configured wait strategy):
//! - `put()` / `put_one()` - reserve, wait for the slowest consumer, publish
//! - `get()` - read up to `batch_size` items, returning early only on shutdown
//!
//! Non-blocking:
//! - `try_put()` - publish only if the whole batch fits right now
//! - `try_get()` - read whatever is already published
//!
//! `shutdown()` is terminal: blocked producers fail with
//! `SluiceError::Shutdown`, blocked consumers return their partial batch.

use std::sync::atomic::{ AtomicBool, Ordering };

use tracing::{ debug, info, trace };

use crate::disruptor::common::PaddedSequence;
use crate::disruptor::gating::GatingBarrier;
use crate::disruptor::slot::Slot;
use crate::disruptor::wait_strategy::WaitStrategy;
use crate::disruptor::{ RingBufferConfig, Sequence };
use crate::error::{ Result, SluiceError };
use crate::metrics::{ Metrics, MetricsSnapshot };

/// Lock-free multi-producer, broadcast multi-consumer ring buffer
pub struct RingBuffer<T> {
    slots: Box<[Slot<T>]>,
    /// Capacity as a sequence delta
    capacity: i64,
    /// Highest sequence claimed by any producer
    write_cursor: PaddedSequence,
    gating: GatingBarrier,
    running: AtomicBool,
    wait_strategy: Box<dyn WaitStrategy>,
    metrics: Metrics,
}

impl<T> RingBuffer<T> {
    /// Create a ring buffer with the default (yielding) wait strategy
    pub fn new(capacity: usize, num_consumers: usize) -> Result<Self> {
        let config = RingBufferConfig::new(capacity)?.with_consumers(num_consumers)?;
        Self::from_config(config)
    }

    /// Create a ring buffer using the wait strategy named in the config
    pub fn from_config(config: RingBufferConfig) -> Result<Self> {
        let wait_strategy = config.wait_strategy.into_strategy();
        Self::with_wait_strategy(config, wait_strategy)
    }

    /// Create a ring buffer with a caller-supplied wait strategy.
    ///
    /// `config.wait_strategy` is ignored.
    pub fn with_wait_strategy(
        config: RingBufferConfig,
        wait_strategy: Box<dyn WaitStrategy>
    ) -> Result<Self> {
        config.validate()?;

        let slots = (0..config.capacity)
            .map(|_| Slot::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        debug!(
            capacity = config.capacity,
            num_consumers = config.num_consumers,
            wait_strategy = wait_strategy.name(),
            "ring buffer created"
        );

        Ok(Self {
            slots,
            capacity: config.capacity as i64,
            write_cursor: PaddedSequence::default(),
            gating: GatingBarrier::new(config.num_consumers),
            running: AtomicBool::new(true),
            wait_strategy,
            metrics: Metrics::new(),
        })
    }

    // ========================================================================
    // PRODUCER API
    // ========================================================================

    /// Publish `values` as one contiguous block of sequences.
    ///
    /// Safe to call from many threads at once; each call's items stay
    /// contiguous and in order. Blocks while the slowest consumer is a full
    /// lap behind. On shutdown the remaining items of the block are dropped
    /// and `SluiceError::Shutdown` is returned.
    ///
    /// A wait strategy deadline only applies before anything is reserved: a
    /// put that fails with `SluiceError::Timeout` published nothing and can be
    /// retried. Once sequences are claimed they are always published unless
    /// the ring buffer shuts down.
    pub fn put<I>(&self, values: I) -> Result<()> where I: IntoIterator<Item = T> {
        let values: Vec<T> = values.into_iter().collect();
        if values.is_empty() {
            return Ok(());
        }
        if self.is_shutdown() {
            return Err(SluiceError::Shutdown);
        }

        self.wait_for_free_slot()?;
        let first = self.write_cursor.claim(values.len() as i64);
        for (sequence, value) in (first..).zip(values) {
            self.publish_at(sequence, value)?;
        }
        Ok(())
    }

    /// Publish a single value
    pub fn put_one(&self, value: T) -> Result<()> {
        if self.is_shutdown() {
            return Err(SluiceError::Shutdown);
        }
        self.wait_for_free_slot()?;
        let sequence = self.write_cursor.claim(1);
        self.publish_at(sequence, value)
    }

    /// Publish `values` only if every one of them fits without waiting.
    ///
    /// Nothing is reserved when this fails with `SluiceError::RingBufferFull`.
    /// A batch larger than the capacity never fits.
    pub fn try_put<I>(&self, values: I) -> Result<()> where I: IntoIterator<Item = T> {
        let values: Vec<T> = values.into_iter().collect();
        if values.is_empty() {
            return Ok(());
        }
        if self.is_shutdown() {
            return Err(SluiceError::Shutdown);
        }

        let count = values.len() as i64;
        let first = loop {
            let current = self.write_cursor.relaxed();
            let last = current + count;
            if !self.gating.admits(last, self.capacity) {
                self.metrics.record_full_rejection();
                return Err(SluiceError::RingBufferFull);
            }
            if self.write_cursor.compare_exchange(current, last) {
                break current + 1;
            }
            std::hint::spin_loop();
        };

        // The barrier only moves forward, so admitting `last` admits the whole block.
        for (sequence, value) in (first..).zip(values) {
            // SAFETY: `sequence` was reserved by the CAS above and the gating
            // barrier admitted it, so every consumer is done with the previous
            // occupant of this slot.
            unsafe {
                self.slot(sequence).publish(sequence, value);
            }
        }
        self.metrics.record_publish(count as u64);
        self.wait_strategy.signal_all_when_blocking();
        Ok(())
    }

    fn publish_at(&self, sequence: Sequence, value: T) -> Result<()> {
        self.wait_for_capacity(sequence)?;

        // SAFETY: `sequence` came from the write cursor so no other producer
        // owns it, and the gating barrier admitted it so every consumer has
        // consumed `sequence - capacity`, the slot's previous occupant.
        unsafe {
            self.slot(sequence).publish(sequence, value);
        }
        self.metrics.record_publish(1);
        self.wait_strategy.signal_all_when_blocking();
        Ok(())
    }

    /// Wait until the next unclaimed sequence is admitted by the gate.
    ///
    /// Nothing is reserved yet, so a timeout here leaves no gap behind.
    fn wait_for_free_slot(&self) -> Result<()> {
        let mut admitted = || self.gating.admits(self.write_cursor.get() + 1, self.capacity);
        if admitted() {
            return Ok(());
        }

        self.metrics.record_producer_wait();
        trace!(barrier = self.gating.cached(), "producer gated before claiming");

        let result = self.wait_strategy.wait_until(&mut admitted, &self.running);
        if let Err(SluiceError::Shutdown) = result {
            self.metrics.record_shutdown_return();
        }
        result
    }

    /// Wait until a claimed `sequence` may be written.
    ///
    /// A claimed sequence must be published or consumers stall on the gap,
    /// so timeouts are waited through; only shutdown gives up.
    fn wait_for_capacity(&self, sequence: Sequence) -> Result<()> {
        if self.gating.admits(sequence, self.capacity) {
            return Ok(());
        }

        self.metrics.record_producer_wait();
        trace!(sequence, barrier = self.gating.cached(), "producer gated by slowest consumer");

        loop {
            let result = self.wait_strategy.wait_until(
                &mut || self.gating.admits(sequence, self.capacity),
                &self.running
            );
            match result {
                Err(SluiceError::Timeout) => {
                    trace!(sequence, "claimed sequence still gated, waiting past deadline");
                }
                Err(SluiceError::Shutdown) => {
                    self.metrics.record_shutdown_return();
                    debug!(sequence, "put abandoned on shutdown");
                    return Err(SluiceError::Shutdown);
                }
                other => {
                    return other;
                }
            }
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Signal shutdown. Terminal: the ring buffer cannot be restarted.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!(
                write_cursor = self.write_cursor(),
                read_barrier = self.read_barrier(),
                "ring buffer shutdown signalled"
            );
        }
        self.wait_strategy.signal_all_when_blocking();
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        !self.running.load(Ordering::Acquire)
    }

    // ========================================================================
    // UTILITY METHODS
    // ========================================================================

    #[inline(always)]
    fn slot(&self, sequence: Sequence) -> &Slot<T> {
        &self.slots[(sequence % self.capacity) as usize]
    }

    #[inline]
    fn is_readable(&self, sequence: Sequence) -> bool {
        sequence <= self.write_cursor.get() && self.slot(sequence).is_published(sequence)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn num_consumers(&self) -> usize {
        self.gating.num_consumers()
    }

    /// Highest sequence claimed by any producer (`-1` before the first put)
    #[inline]
    pub fn write_cursor(&self) -> Sequence {
        self.write_cursor.get()
    }

    /// Highest sequence fully consumed by `consumer_id` (`-1` before the first get)
    pub fn consumer_cursor(&self, consumer_id: usize) -> Result<Sequence> {
        Ok(self.gating.consumer(consumer_id)?.cursor.get())
    }

    /// Minimum consumer cursor; slots at or below it may be overwritten
    pub fn read_barrier(&self) -> Sequence {
        self.gating.minimum()
    }

    /// Sequences claimed by producers that `consumer_id` has not read yet.
    ///
    /// Includes sequences still being written.
    pub fn pending(&self, consumer_id: usize) -> Result<usize> {
        let cursor = self.consumer_cursor(consumer_id)?;
        Ok((self.write_cursor() - cursor).max(0) as usize)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Zero every counter, e.g. between benchmark phases
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    pub fn wait_strategy(&self) -> &dyn WaitStrategy {
        self.wait_strategy.as_ref()
    }
}

impl<T: Clone> RingBuffer<T> {
    // ========================================================================
    // CONSUMER API
    // ========================================================================

    /// Read the next `batch_size` items for `consumer_id`.
    ///
    /// Waits for items that are not yet published. Returns fewer than
    /// `batch_size` items only when the ring buffer is shut down (an empty
    /// result then means end of stream). Items already published are still
    /// returned after shutdown.
    ///
    /// # Panics
    /// Panics if another thread is reading for the same `consumer_id`.
    pub fn get(&self, batch_size: usize, consumer_id: usize) -> Result<Vec<T>> {
        self.read(batch_size, consumer_id, true)
    }

    /// Read up to `batch_size` items that are already published, without waiting
    pub fn try_get(&self, batch_size: usize, consumer_id: usize) -> Result<Vec<T>> {
        self.read(batch_size, consumer_id, false)
    }

    fn read(&self, batch_size: usize, consumer_id: usize, block: bool) -> Result<Vec<T>> {
        let consumer = self.gating.consumer(consumer_id)?;
        if batch_size == 0 {
            return Ok(Vec::new());
        }
        let _session = consumer.enter(consumer_id);

        let mut next = consumer.cursor.relaxed() + 1;
        let mut items = Vec::with_capacity(batch_size.min(self.slots.len()));
        let mut unreleased = false;

        while items.len() < batch_size {
            if !self.is_readable(next) {
                if !block {
                    break;
                }
                // Free what we already consumed before parking so producers
                // gated on this consumer can make progress.
                if unreleased {
                    self.release_consumed();
                    unreleased = false;
                }
                match self.wait_for_data(next, consumer_id) {
                    Ok(()) => {}
                    Err(SluiceError::Shutdown) => {
                        self.metrics.record_shutdown_return();
                        debug!(consumer_id, collected = items.len(), "get cut short by shutdown");
                        break;
                    }
                    Err(err) if items.is_empty() => {
                        return Err(err);
                    }
                    Err(_) => {
                        break;
                    }
                }
            }

            // SAFETY: the slot is tagged with `next` and our cursor is still
            // `next - 1`, so no producer can reclaim it until we advance.
            let value = unsafe { self.slot(next).read() }.ok_or_else(|| {
                SluiceError::unexpected(format!("sequence {next} published without a payload"))
            })?;
            items.push(value);
            consumer.cursor.set(next);
            unreleased = true;
            next += 1;
        }

        if unreleased {
            self.release_consumed();
        }
        self.metrics.record_consume(items.len() as u64);
        Ok(items)
    }

    fn wait_for_data(&self, sequence: Sequence, consumer_id: usize) -> Result<()> {
        self.metrics.record_consumer_wait();
        trace!(consumer_id, sequence, "consumer waiting for publish");
        self.wait_strategy.wait_until(&mut || self.is_readable(sequence), &self.running)
    }

    /// Recompute the barrier from post-advance cursors and wake gated producers
    fn release_consumed(&self) {
        self.gating.refresh();
        self.wait_strategy.signal_all_when_blocking();
    }
}

impl<T> std::fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("num_consumers", &self.num_consumers())
            .field("write_cursor", &self.write_cursor())
            .field("read_barrier", &self.read_barrier())
            .field("wait_strategy", &self.wait_strategy.name())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

static_assertions::assert_impl_all!(RingBuffer<u64>: Send, Sync);
static_assertions::assert_impl_all!(RingBuffer<String>: Send, Sync);
static_assertions::assert_not_impl_any!(RingBuffer<std::cell::Cell<u64>>: Sync);
static_assertions::assert_not_impl_any!(RingBuffer<std::rc::Rc<u64>>: Send, Sync);
