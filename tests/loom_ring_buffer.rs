//! Loom models of the slot/cursor protocol.
//!
//! Each model mirrors the atomics the ring buffer uses (tag + availability
//! flag per slot, one cursor per consumer, fetch-and-add write cursor) on a
//! tiny ring so loom can explore every interleaving. Payloads live in loom's
//! `UnsafeCell`, so a producer overwriting a slot a consumer still reads is
//! reported as a data race.
//!
//! Run with: RUSTFLAGS="--cfg loom" cargo test --test loom_ring_buffer --release

#[cfg(loom)]
mod loom_tests {
    use loom::cell::UnsafeCell;
    use loom::sync::atomic::{ AtomicBool, AtomicI64, Ordering };
    use loom::sync::Arc;
    use loom::thread;

    struct ModelSlot {
        value: UnsafeCell<u64>,
        sequence: AtomicI64,
        available: AtomicBool,
    }

    impl ModelSlot {
        fn new() -> Self {
            Self {
                value: UnsafeCell::new(0),
                sequence: AtomicI64::new(i64::MIN),
                available: AtomicBool::new(false),
            }
        }

        fn publish(&self, sequence: i64, value: u64) {
            self.available.store(false, Ordering::Relaxed);
            self.value.with_mut(|p| unsafe { *p = value });
            self.sequence.store(sequence, Ordering::Release);
            self.available.store(true, Ordering::Release);
        }

        fn is_published(&self, sequence: i64) -> bool {
            self.available.load(Ordering::Acquire) &&
                self.sequence.load(Ordering::Acquire) == sequence
        }

        fn read(&self) -> u64 {
            self.value.with(|p| unsafe { *p })
        }
    }

    unsafe impl Sync for ModelSlot {}

    /// One slot, two laps: the producer must wait for the consumer before
    /// reusing the slot, and the consumer must never see a stale tag.
    #[test]
    fn test_single_slot_reuse_is_gated() {
        loom::model(|| {
            let slot = Arc::new(ModelSlot::new());
            let consumer_cursor = Arc::new(AtomicI64::new(-1));
            let capacity = 1i64;

            let s = slot.clone();
            let cc = consumer_cursor.clone();
            let producer = thread::spawn(move || {
                for sequence in 0..2i64 {
                    while sequence - cc.load(Ordering::Acquire) > capacity {
                        thread::yield_now();
                    }
                    s.publish(sequence, (sequence as u64) + 100);
                }
            });

            let mut seen = Vec::new();
            for sequence in 0..2i64 {
                while !slot.is_published(sequence) {
                    thread::yield_now();
                }
                seen.push(slot.read());
                consumer_cursor.store(sequence, Ordering::Release);
            }

            producer.join().unwrap();
            assert_eq!(seen, vec![100, 101]);
        });
    }

    /// The slowest of two consumers gates the producer.
    #[test]
    fn test_slowest_consumer_gates() {
        loom::model(|| {
            let slot = Arc::new(ModelSlot::new());
            let cursors = Arc::new([AtomicI64::new(-1), AtomicI64::new(-1)]);

            let s = slot.clone();
            let c = cursors.clone();
            let producer = thread::spawn(move || {
                for sequence in 0..2i64 {
                    loop {
                        let barrier = c
                            .iter()
                            .map(|cursor| cursor.load(Ordering::Acquire))
                            .min()
                            .unwrap();
                        if sequence - barrier <= 1 {
                            break;
                        }
                        thread::yield_now();
                    }
                    s.publish(sequence, sequence as u64);
                }
            });

            let consumers: Vec<_> = (0..2)
                .map(|id| {
                    let s = slot.clone();
                    let c = cursors.clone();
                    thread::spawn(move || {
                        let mut sum = 0;
                        for sequence in 0..2i64 {
                            while !s.is_published(sequence) {
                                thread::yield_now();
                            }
                            sum += s.read() + 1;
                            c[id].store(sequence, Ordering::Release);
                        }
                        sum
                    })
                })
                .collect();

            producer.join().unwrap();
            for consumer in consumers {
                assert_eq!(consumer.join().unwrap(), 3);
            }
        });
    }

    /// Concurrent reservations never hand out the same sequence twice.
    #[test]
    fn test_fetch_add_claims_are_disjoint() {
        loom::model(|| {
            let write_cursor = Arc::new(AtomicI64::new(-1));

            let handles: Vec<_> = [2i64, 1]
                .into_iter()
                .map(|count| {
                    let wc = write_cursor.clone();
                    thread::spawn(move || {
                        let first = wc.fetch_add(count, Ordering::AcqRel) + 1;
                        (first, first + count - 1)
                    })
                })
                .collect();

            let mut ranges: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            ranges.sort();
            assert_eq!(ranges[0].0, 0);
            assert_eq!(ranges[1].0, ranges[0].1 + 1);
            assert_eq!(write_cursor.load(Ordering::Relaxed), 2);
        });
    }
}
