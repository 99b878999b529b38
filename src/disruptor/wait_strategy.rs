//! Wait strategies for producers and consumers
//!
//! This module provides different wait strategies that control how a thread
//! suspends while the ring buffer cannot serve it: a consumer waiting for the
//! next sequence to be published, or a producer waiting for the slowest
//! consumer to free a slot. Each strategy offers different trade-offs between
//! latency, CPU usage, and throughput. None of them encodes protocol
//! knowledge; they only poll the `ready` condition they are handed.

use std::sync::atomic::{ AtomicBool, AtomicUsize, Ordering };
use std::thread;
use std::time::{ Duration, Instant };

use crossbeam::utils::Backoff;

use crate::constants::{
    BLOCKING_PARK_TIMEOUT,
    BLOCKING_SPIN_TRIES,
    DEFAULT_SLEEP,
    SLEEPING_SPIN_TRIES,
};
use crate::disruptor::WaitStrategyType;
use crate::error::{ Result, SluiceError };

/// Trait for wait strategies that determine how threads wait on the ring
pub trait WaitStrategy: Send + Sync {
    /// Wait until `ready` returns true
    ///
    /// # Arguments
    ///
    /// * `ready` - Condition to poll; must be cheap and side-effect free
    /// * `running` - Cleared when the ring buffer is shut down
    ///
    /// # Returns
    ///
    /// `Ok(())` once `ready` holds. `Err(SluiceError::Shutdown)` if `running`
    /// was cleared first. A condition that is already true wins over shutdown.
    fn wait_until(&self, ready: &mut dyn FnMut() -> bool, running: &AtomicBool) -> Result<()>;

    /// Signal that the ring buffer state changed
    fn signal_all_when_blocking(&self);

    /// Short name for logs
    fn name(&self) -> &'static str;
}

#[inline(always)]
fn poll(ready: &mut dyn FnMut() -> bool, running: &AtomicBool) -> Option<Result<()>> {
    if ready() {
        return Some(Ok(()));
    }
    if !running.load(Ordering::Acquire) {
        return Some(Err(SluiceError::Shutdown));
    }
    None
}

/// Busy spin wait strategy - lowest latency, highest CPU usage.
/// This strategy continuously checks the condition in a tight loop, making it
/// ideal for scenarios where latency is critical and every waiting thread has
/// a dedicated core. It will consume 100% of a CPU core while waiting.
#[derive(Debug, Default)]
pub struct BusySpinWaitStrategy;

impl BusySpinWaitStrategy {
    /// Create a new busy spin wait strategy
    pub fn new() -> Self {
        Self
    }
}

impl WaitStrategy for BusySpinWaitStrategy {
    fn wait_until(&self, ready: &mut dyn FnMut() -> bool, running: &AtomicBool) -> Result<()> {
        loop {
            if let Some(outcome) = poll(ready, running) {
                return outcome;
            }
            std::hint::spin_loop();
        }
    }

    fn signal_all_when_blocking(&self) {
        // No-op for busy spin - no blocking threads to signal
    }

    fn name(&self) -> &'static str {
        "busy-spin"
    }
}

/// Yielding wait strategy - moderate CPU usage and latency.
/// Spins with exponential backoff, then yields the CPU to other threads on
/// every further attempt. The default strategy.
#[derive(Debug, Default)]
pub struct YieldingWaitStrategy;

impl YieldingWaitStrategy {
    /// Create a new yielding wait strategy
    pub fn new() -> Self {
        Self
    }
}

impl WaitStrategy for YieldingWaitStrategy {
    fn wait_until(&self, ready: &mut dyn FnMut() -> bool, running: &AtomicBool) -> Result<()> {
        let backoff = Backoff::new();
        loop {
            if let Some(outcome) = poll(ready, running) {
                return outcome;
            }
            backoff.snooze();
        }
    }

    fn signal_all_when_blocking(&self) {
        // No-op for yielding - threads will wake up naturally
    }

    fn name(&self) -> &'static str {
        "yielding"
    }
}

/// Sleeping wait strategy - lowest CPU usage, higher latency.
/// This strategy spins briefly and then puts the thread to sleep for a fixed
/// duration between checks. Shutdown is noticed within one sleep.
#[derive(Debug)]
pub struct SleepingWaitStrategy {
    sleep_duration: Duration,
}

impl SleepingWaitStrategy {
    /// Create a new sleeping wait strategy with custom sleep duration
    pub fn new(sleep_duration: Duration) -> Self {
        Self { sleep_duration }
    }

    pub fn sleep_duration(&self) -> Duration {
        self.sleep_duration
    }
}

impl Default for SleepingWaitStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_SLEEP)
    }
}

impl WaitStrategy for SleepingWaitStrategy {
    fn wait_until(&self, ready: &mut dyn FnMut() -> bool, running: &AtomicBool) -> Result<()> {
        let mut spin_count = 0;

        loop {
            if let Some(outcome) = poll(ready, running) {
                return outcome;
            }

            if spin_count < SLEEPING_SPIN_TRIES {
                std::hint::spin_loop();
                spin_count += 1;
            } else {
                thread::sleep(self.sleep_duration);
            }
        }
    }

    fn signal_all_when_blocking(&self) {
        // No-op for sleeping - threads will wake up naturally
    }

    fn name(&self) -> &'static str {
        "sleeping"
    }
}

/// Blocking wait strategy - balanced latency and CPU usage.
/// This strategy spins briefly and then parks the thread on a condition
/// variable until the ring signals progress. Parks are bounded by a short
/// timeout because signallers do not hold the mutex while changing cursors.
pub struct BlockingWaitStrategy {
    mutex: parking_lot::Mutex<()>,
    condition: parking_lot::Condvar,
    parked: AtomicUsize,
    park_timeout: Duration,
}

impl BlockingWaitStrategy {
    /// Create a new blocking wait strategy
    pub fn new() -> Self {
        Self::with_park_timeout(BLOCKING_PARK_TIMEOUT)
    }

    pub fn with_park_timeout(park_timeout: Duration) -> Self {
        Self {
            mutex: parking_lot::Mutex::new(()),
            condition: parking_lot::Condvar::new(),
            parked: AtomicUsize::new(0),
            park_timeout,
        }
    }
}

impl Default for BlockingWaitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitStrategy for BlockingWaitStrategy {
    fn wait_until(&self, ready: &mut dyn FnMut() -> bool, running: &AtomicBool) -> Result<()> {
        let mut spin_count = 0;

        loop {
            if let Some(outcome) = poll(ready, running) {
                return outcome;
            }

            // Try spinning first for low latency
            if spin_count < BLOCKING_SPIN_TRIES {
                std::hint::spin_loop();
                spin_count += 1;
                continue;
            }

            let mut guard = self.mutex.lock();
            self.parked.fetch_add(1, Ordering::SeqCst);
            if !ready() && running.load(Ordering::Acquire) {
                self.condition.wait_for(&mut guard, self.park_timeout);
            }
            self.parked.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn signal_all_when_blocking(&self) {
        if self.parked.load(Ordering::SeqCst) > 0 {
            let _guard = self.mutex.lock();
            self.condition.notify_all();
        }
    }

    fn name(&self) -> &'static str {
        "blocking"
    }
}

/// Timeout wait strategy - waits for a maximum duration.
/// This strategy wraps another wait strategy and adds a deadline. If the
/// condition does not hold before the deadline, `wait_until` returns
/// `SluiceError::Timeout`.
pub struct TimeoutWaitStrategy {
    timeout: Duration,
    base_strategy: Box<dyn WaitStrategy>,
}

impl TimeoutWaitStrategy {
    /// Create a new timeout wait strategy wrapping another strategy
    pub fn new(timeout: Duration, base_strategy: Box<dyn WaitStrategy>) -> Self {
        Self {
            timeout,
            base_strategy,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl WaitStrategy for TimeoutWaitStrategy {
    fn wait_until(&self, ready: &mut dyn FnMut() -> bool, running: &AtomicBool) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        let mut timed_out = false;

        self.base_strategy.wait_until(
            &mut || {
                if ready() {
                    return true;
                }
                if Instant::now() >= deadline {
                    timed_out = true;
                    return true;
                }
                false
            },
            running
        )?;

        if timed_out {
            Err(SluiceError::Timeout)
        } else {
            Ok(())
        }
    }

    fn signal_all_when_blocking(&self) {
        self.base_strategy.signal_all_when_blocking();
    }

    fn name(&self) -> &'static str {
        "timeout"
    }
}

impl WaitStrategyType {
    /// Build the strategy this variant names, with default parameters
    pub fn into_strategy(self) -> Box<dyn WaitStrategy> {
        match self {
            WaitStrategyType::BusySpin => Box::new(BusySpinWaitStrategy::new()),
            WaitStrategyType::Yielding => Box::new(YieldingWaitStrategy::new()),
            WaitStrategyType::Sleeping => Box::new(SleepingWaitStrategy::default()),
            WaitStrategyType::Blocking => Box::new(BlockingWaitStrategy::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;

    fn strategies() -> Vec<Box<dyn WaitStrategy>> {
        vec![
            WaitStrategyType::BusySpin.into_strategy(),
            WaitStrategyType::Yielding.into_strategy(),
            WaitStrategyType::Sleeping.into_strategy(),
            WaitStrategyType::Blocking.into_strategy()
        ]
    }

    #[test]
    fn test_ready_condition_returns_immediately() {
        let running = AtomicBool::new(true);
        for strategy in strategies() {
            assert!(strategy.wait_until(&mut || true, &running).is_ok(), "{}", strategy.name());
        }
    }

    #[test]
    fn test_ready_wins_over_shutdown() {
        let running = AtomicBool::new(false);
        for strategy in strategies() {
            assert!(strategy.wait_until(&mut || true, &running).is_ok(), "{}", strategy.name());
        }
    }

    #[test]
    fn test_shutdown_handling() {
        let running = AtomicBool::new(false); // Simulate shutdown
        for strategy in strategies() {
            let result = strategy.wait_until(&mut || false, &running);
            assert_eq!(result, Err(SluiceError::Shutdown), "{}", strategy.name());
        }
    }

    #[test]
    fn test_condition_polled_until_true() {
        let running = AtomicBool::new(true);
        for strategy in strategies() {
            let mut polls = 0;
            let result = strategy.wait_until(
                &mut || {
                    polls += 1;
                    polls >= 50
                },
                &running
            );
            assert!(result.is_ok());
            assert_eq!(polls, 50, "{}", strategy.name());
        }
    }

    #[test]
    fn test_blocking_wait_strategy_wakes_on_signal() {
        let strategy = Arc::new(BlockingWaitStrategy::with_park_timeout(Duration::from_secs(5)));
        let running = Arc::new(AtomicBool::new(true));
        let published = Arc::new(AtomicU64::new(0));

        let s = strategy.clone();
        let p = published.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            p.store(1, Ordering::Release);
            s.signal_all_when_blocking();
        });

        let start = Instant::now();
        let result = strategy.wait_until(&mut || published.load(Ordering::Acquire) == 1, &running);
        assert!(result.is_ok());
        assert!(start.elapsed() < Duration::from_secs(5));

        handle.join().unwrap();
    }

    #[test]
    fn test_sleeping_wait_strategy_notices_shutdown() {
        let strategy = Arc::new(SleepingWaitStrategy::new(Duration::from_millis(1)));
        let running = Arc::new(AtomicBool::new(true));

        let r = running.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            r.store(false, Ordering::Release);
        });

        let result = strategy.wait_until(&mut || false, &running);
        assert_eq!(result, Err(SluiceError::Shutdown));
        handle.join().unwrap();
    }

    #[test]
    fn test_timeout_wait_strategy() {
        let base_strategy = Box::new(SleepingWaitStrategy::new(Duration::from_millis(1)));
        let strategy = TimeoutWaitStrategy::new(Duration::from_millis(10), base_strategy);
        let running = AtomicBool::new(true);

        let start = Instant::now();
        let result = strategy.wait_until(&mut || false, &running);
        assert_eq!(result, Err(SluiceError::Timeout));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_timeout_wait_strategy_passes_through_success() {
        let strategy = TimeoutWaitStrategy::new(
            Duration::from_secs(1),
            Box::new(YieldingWaitStrategy::new())
        );
        let running = AtomicBool::new(true);
        assert!(strategy.wait_until(&mut || true, &running).is_ok());
    }
}
