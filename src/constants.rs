//! Sluice Constants
//!
//! Defaults used by the ring buffer and its wait strategies.

use std::time::Duration;

/// Default ring buffer capacity
pub const DEFAULT_CAPACITY: usize = 64 * 1024; // 64K slots

/// Default number of consumers
pub const DEFAULT_NUM_CONSUMERS: usize = 1;

/// Position of a cursor before the first element
pub const INITIAL_CURSOR: i64 = -1;

/// Spins before the blocking strategy parks on its condition variable
pub const BLOCKING_SPIN_TRIES: usize = 100;

/// Upper bound on a single park of the blocking strategy
pub const BLOCKING_PARK_TIMEOUT: Duration = Duration::from_micros(100);

/// Spins before the sleeping strategy starts sleeping
pub const SLEEPING_SPIN_TRIES: usize = 10;

/// Default sleep of the sleeping strategy
pub const DEFAULT_SLEEP: Duration = Duration::from_micros(100);
