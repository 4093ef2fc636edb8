// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use pulse_core::telemetry::CounterSnapshot;
use std::sync::atomic::{AtomicI64, Ordering};

/// A signed running total.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicI64,
}

impl Counter {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter by 1 and returns the new total.
    pub fn inc(&self) -> i64 {
        self.inc_by(1)
    }

    /// Adds `delta` and returns the new total.
    pub fn inc_by(&self, delta: i64) -> i64 {
        self.count.fetch_add(delta, Ordering::Relaxed).wrapping_add(delta)
    }

    /// Decrements the counter by 1 and returns the new total.
    pub fn dec(&self) -> i64 {
        self.dec_by(1)
    }

    /// Subtracts `delta` and returns the new total.
    pub fn dec_by(&self, delta: i64) -> i64 {
        self.count.fetch_sub(delta, Ordering::Relaxed).wrapping_sub(delta)
    }

    /// Returns the current total.
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            count: self.count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_increment_and_decrement() {
        let counter = Counter::new();
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.inc(), 1);
        assert_eq!(counter.inc_by(5), 6);
        assert_eq!(counter.dec(), 5);
        assert_eq!(counter.dec_by(7), -2);
        assert_eq!(counter.snapshot().count, -2);
    }

    #[test]
    fn test_concurrent_increments() {
        let counter = Arc::new(Counter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.inc();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.count(), 8000);
    }
}
