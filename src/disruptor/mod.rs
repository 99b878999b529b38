//! Lock-free broadcast ring buffer based on the LMAX Disruptor pattern.
//!
//! ## Protocol
//!
//! | Step | Who | Mechanism |
//! |------|-----|-----------|
//! | Reserve | producer | fetch-and-add on the write cursor |
//! | Gate | producer | wait until `seq - min(consumer cursors) <= capacity` |
//! | Publish | producer | write payload, tag slot with `seq`, Release-store availability |
//! | Read | consumer | Acquire-load availability + exact tag match, clone payload |
//! | Advance | consumer | Release-store its own cursor, refresh the barrier |
//!
//! Every consumer sees every item (broadcast, not work-stealing).
//!
//! ## Module Organization
//!
//! - `common` - cache-padded cursors
//! - `slot` - tagged payload cells
//! - `gating` - minimum consumer cursor
//! - `wait_strategy` - how waiting threads suspend
//! - `ring_buffer` - the `RingBuffer<T>` aggregate

pub mod common;
pub mod gating;
pub mod ring_buffer;
pub mod slot;
pub mod wait_strategy;

pub use gating::GatingBarrier;
pub use ring_buffer::RingBuffer;
pub use slot::Slot;
pub use wait_strategy::{
    WaitStrategy,
    BusySpinWaitStrategy,
    YieldingWaitStrategy,
    SleepingWaitStrategy,
    BlockingWaitStrategy,
    TimeoutWaitStrategy,
};

use crate::constants::{ DEFAULT_CAPACITY, DEFAULT_NUM_CONSUMERS };
use crate::error::{ Result, SluiceError };

/// Sequence number type for ring buffer positions (`-1` = before the first element)
pub type Sequence = i64;

/// Configuration for ring buffer behavior
#[derive(Debug, Clone)]
pub struct RingBufferConfig {
    /// Number of slots
    pub capacity: usize,
    /// Number of consumers, each reading the full stream
    pub num_consumers: usize,
    /// Wait strategy for producers and consumers
    pub wait_strategy: WaitStrategyType,
}

/// Available wait strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitStrategyType {
    /// Busy spin for lowest latency
    BusySpin,
    /// Spin with backoff, then yield
    #[default]
    Yielding,
    /// Sleep for lowest CPU usage
    Sleeping,
    /// Park on a condition variable
    Blocking,
}

impl Default for RingBufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            num_consumers: DEFAULT_NUM_CONSUMERS,
            wait_strategy: WaitStrategyType::default(),
        }
    }
}

impl RingBufferConfig {
    /// Create a new configuration with the specified capacity
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SluiceError::config("Ring buffer capacity must be greater than 0"));
        }
        if capacity > (i64::MAX as usize) {
            return Err(crate::config_error!("Ring buffer capacity {} does not fit a sequence number", capacity));
        }

        Ok(Self {
            capacity,
            ..Default::default()
        })
    }

    /// Set the number of consumers
    pub fn with_consumers(mut self, num_consumers: usize) -> Result<Self> {
        if num_consumers == 0 {
            return Err(SluiceError::config("Number of consumers must be greater than 0"));
        }

        self.num_consumers = num_consumers;
        Ok(self)
    }

    /// Set the wait strategy
    pub fn with_wait_strategy(mut self, strategy: WaitStrategyType) -> Self {
        self.wait_strategy = strategy;
        self
    }

    /// Re-check a configuration built by struct literal
    pub fn validate(&self) -> Result<()> {
        Self::new(self.capacity)?.with_consumers(self.num_consumers)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_config_creation() {
        let config = RingBufferConfig::new(1024).unwrap();
        assert_eq!(config.capacity, 1024);
        assert_eq!(config.num_consumers, 1);
        assert_eq!(config.wait_strategy, WaitStrategyType::Yielding);
    }

    #[test]
    fn test_ring_buffer_config_any_positive_capacity() {
        assert!(RingBufferConfig::new(10).is_ok());
        assert!(RingBufferConfig::new(1).is_ok());
        assert!(RingBufferConfig::new(0).is_err());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_ring_buffer_config_rejects_oversized_capacity() {
        let capacity = (i64::MAX as usize) + 1;
        let err = RingBufferConfig::new(capacity).unwrap_err();
        assert!(err.is_usage_error());
        assert!(err.to_string().contains(&capacity.to_string()));
    }

    #[test]
    fn test_ring_buffer_config_builder() {
        let config = RingBufferConfig::new(1024)
            .unwrap()
            .with_consumers(4)
            .unwrap()
            .with_wait_strategy(WaitStrategyType::Blocking);

        assert_eq!(config.capacity, 1024);
        assert_eq!(config.num_consumers, 4);
        assert_eq!(config.wait_strategy, WaitStrategyType::Blocking);
    }

    #[test]
    fn test_ring_buffer_config_invalid_consumers() {
        let result = RingBufferConfig::new(1024).unwrap().with_consumers(0);
        assert!(matches!(result, Err(SluiceError::InvalidConfig { .. })));

        // More consumers than slots is fine: every consumer reads every slot.
        assert!(RingBufferConfig::new(2).unwrap().with_consumers(8).is_ok());
    }

    #[test]
    fn test_validate_struct_literal() {
        let config = RingBufferConfig {
            capacity: 0,
            num_consumers: 1,
            wait_strategy: WaitStrategyType::BusySpin,
        };
        assert!(config.validate().is_err());
        assert!(RingBufferConfig::default().validate().is_ok());
    }
}
