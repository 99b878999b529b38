//! Sluice - lock-free broadcast ring buffer
//!
//! A fixed-capacity LMAX-Disruptor-style ring that moves events from any
//! number of producer threads to a fixed set of consumers. Every consumer
//! reads the complete stream in order, exactly once, and producers never
//! overwrite a slot the slowest consumer still needs.
//!
//! ```rust
//! use sluice::RingBuffer;
//!
//! let ring = RingBuffer::new(10, 1)?;
//! ring.put(0..10)?;
//! assert_eq!(ring.get(5, 0)?, vec![0, 1, 2, 3, 4]);
//! assert_eq!(ring.get(5, 0)?, vec![5, 6, 7, 8, 9]);
//! # Ok::<(), sluice::SluiceError>(())
//! ```

pub mod constants;
pub mod disruptor;
pub mod error;
pub mod metrics;

// Re-export main components
pub use disruptor::{
    RingBuffer,
    RingBufferConfig,
    Sequence,
    WaitStrategy,
    WaitStrategyType,
    BusySpinWaitStrategy,
    YieldingWaitStrategy,
    SleepingWaitStrategy,
    BlockingWaitStrategy,
    TimeoutWaitStrategy,
};
pub use error::{ SluiceError, Result };
pub use metrics::MetricsSnapshot;
