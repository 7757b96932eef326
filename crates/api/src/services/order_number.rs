//! Human-readable order numbers.
//!
//! Numbers look like `ORD-1718000000123`: the Unix time in milliseconds at
//! which checkout ran. Within one process the generator is strictly
//! monotonic, so two checkouts in the same millisecond still get distinct
//! numbers. Across processes the `orders.order_number` unique constraint is
//! the final arbiter.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

const PREFIX: &str = "ORD-";

/// Process-wide order number source.
#[derive(Debug, Default)]
pub struct OrderNumberGenerator {
    last: AtomicU64,
}

impl OrderNumberGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Next order number based on the wall clock.
    pub fn next(&self) -> String {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        self.next_at(now)
    }

    /// Next order number for a clock reading of `now_ms`.
    ///
    /// If the clock has not moved past the last issued value (same
    /// millisecond, or a backwards step), the last value plus one is used.
    pub fn next_at(&self, now_ms: u64) -> String {
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(last.saturating_add(1));
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return format!("{PREFIX}{candidate}"),
                Err(actual) => last = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_uses_clock_when_it_advances() {
        let generator = OrderNumberGenerator::new();
        assert_eq!(generator.next_at(1_000), "ORD-1000");
        assert_eq!(generator.next_at(1_500), "ORD-1500");
    }

    #[test]
    fn test_same_millisecond_does_not_collide() {
        let generator = OrderNumberGenerator::new();
        assert_eq!(generator.next_at(1_000), "ORD-1000");
        assert_eq!(generator.next_at(1_000), "ORD-1001");
        assert_eq!(generator.next_at(999), "ORD-1002");
    }

    #[test]
    fn test_back_to_back_calls_are_distinct() {
        let generator = OrderNumberGenerator::new();
        let a = generator.next();
        let b = generator.next();
        assert_ne!(a, b);
        assert!(a.starts_with("ORD-"));
    }

    #[test]
    fn test_concurrent_callers_get_unique_numbers() {
        let generator = Arc::new(OrderNumberGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..250).map(|_| generator.next_at(42)).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for number in handle.join().unwrap_or_default() {
                assert!(seen.insert(number));
            }
        }
        assert_eq!(seen.len(), 2_000);
    }
}
