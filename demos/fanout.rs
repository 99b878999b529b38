//! Fan-out demo
//!
//! One producer publishes 0..20 in groups of five while three consumers each
//! read the whole stream two items at a time. After the producer is done the
//! ring is shut down and every consumer drains and stops.
//!
//! Run with: cargo run --example fanout

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use sluice::{ RingBuffer, RingBufferConfig, WaitStrategyType };
use tracing::{ info, Level };

const CAPACITY: usize = 10;
const CONSUMERS: usize = 3;
const BATCH_SIZE: usize = 2;
const ITEMS: u64 = 20;
const GROUP: u64 = 5;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let config = RingBufferConfig::new(CAPACITY)?
        .with_consumers(CONSUMERS)?
        .with_wait_strategy(WaitStrategyType::Blocking);
    let ring = Arc::new(RingBuffer::<u64>::from_config(config)?);

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|id| {
            let ring = ring.clone();
            thread::Builder::new()
                .name(format!("consumer-{id}"))
                .spawn(move || -> sluice::Result<usize> {
                    let mut total = 0;
                    loop {
                        let batch = ring.get(BATCH_SIZE, id)?;
                        if batch.is_empty() && ring.is_shutdown() {
                            info!(consumer = id, total, "consumer stopping");
                            return Ok(total);
                        }
                        for value in &batch {
                            info!(consumer = id, value, "consumed");
                        }
                        total += batch.len();
                    }
                })
                .context("spawning consumer")
        })
        .collect::<anyhow::Result<_>>()?;

    for start in (0..ITEMS).step_by(GROUP as usize) {
        ring.put(start..start + GROUP)?;
        thread::sleep(Duration::from_millis(100));
    }

    // Let consumers catch up, then signal the end of the stream.
    thread::sleep(Duration::from_millis(200));
    ring.shutdown();

    for (id, handle) in consumers.into_iter().enumerate() {
        let total = handle
            .join()
            .map_err(|_| anyhow::anyhow!("consumer {id} panicked"))??;
        anyhow::ensure!(total as u64 == ITEMS, "consumer {id} saw {total} of {ITEMS} items");
    }

    info!(metrics = %ring.metrics(), "done");
    Ok(())
}
