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

use crate::metrics::ewma::{Ewma, TICK_INTERVAL};
use pulse_core::telemetry::snapshot::RATE_UNITS_EVENTS;
use pulse_core::telemetry::MeterSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counts events and tracks their mean and exponentially weighted rates.
///
/// The moving averages are folded lazily: every mark or read checks whether
/// one or more [`TICK_INTERVAL`]s have elapsed and catches up on the missed
/// ticks. No background thread is involved.
#[derive(Debug)]
pub struct Meter {
    count: AtomicU64,
    start: Instant,
    /// Nanoseconds since `start` at which the last tick was applied.
    last_tick: AtomicU64,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
}

impl Meter {
    /// Creates a meter with no events.
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            start: Instant::now(),
            last_tick: AtomicU64::new(0),
            m1: Ewma::one_minute(),
            m5: Ewma::five_minutes(),
            m15: Ewma::fifteen_minutes(),
        }
    }

    /// Marks a single event and returns the new count.
    pub fn mark(&self) -> u64 {
        self.mark_n(1)
    }

    /// Marks `n` events and returns the new count. The count wraps on
    /// overflow.
    pub fn mark_n(&self, n: u64) -> u64 {
        self.tick_if_necessary();
        let count = self.count.fetch_add(n, Ordering::Relaxed).wrapping_add(n);
        self.m1.update(n);
        self.m5.update(n);
        self.m15.update(n);
        count
    }

    /// Returns the number of events marked so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Returns events per second since creation.
    pub fn mean_rate(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        let elapsed = self.start.elapsed().as_secs_f64().max(f64::EPSILON);
        count as f64 / elapsed
    }

    /// Returns the one-minute rate, in events per second.
    pub fn one_minute_rate(&self) -> f64 {
        self.tick_if_necessary();
        self.m1.rate()
    }

    /// Returns the five-minute rate, in events per second.
    pub fn five_minute_rate(&self) -> f64 {
        self.tick_if_necessary();
        self.m5.rate()
    }

    /// Returns the fifteen-minute rate, in events per second.
    pub fn fifteen_minute_rate(&self) -> f64 {
        self.tick_if_necessary();
        self.m15.rate()
    }

    fn elapsed_nanos(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn tick_if_necessary(&self) {
        let interval = TICK_INTERVAL.as_nanos() as u64;
        let old_tick = self.last_tick.load(Ordering::Acquire);
        let now = self.elapsed_nanos();
        let age = now.saturating_sub(old_tick);
        if age < interval {
            return;
        }
        let new_tick = now - age % interval;
        // Only the thread that wins the exchange applies the missed ticks.
        if self
            .last_tick
            .compare_exchange(old_tick, new_tick, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            for _ in 0..age / interval {
                self.m1.tick();
                self.m5.tick();
                self.m15.tick();
            }
        }
    }

    pub(crate) fn snapshot(&self) -> MeterSnapshot {
        MeterSnapshot {
            count: self.count(),
            mean_rate: self.mean_rate(),
            m1_rate: self.one_minute_rate(),
            m5_rate: self.five_minute_rate(),
            m15_rate: self.fifteen_minute_rate(),
            rate_units: RATE_UNITS_EVENTS.to_string(),
        }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fresh_meter_is_empty() {
        let meter = Meter::new();
        assert_eq!(meter.count(), 0);
        assert_eq!(meter.mean_rate(), 0.0);
        assert_eq!(meter.one_minute_rate(), 0.0);
    }

    #[test]
    fn test_mark_increments_by_delta() {
        let meter = Meter::new();
        assert_eq!(meter.mark(), 1);
        assert_eq!(meter.mark_n(4), 5);
        assert_eq!(meter.count(), 5);
    }

    #[test]
    fn test_count_wraps_on_overflow() {
        let meter = Meter::new();
        assert_eq!(meter.mark_n(u64::MAX), u64::MAX);
        assert_eq!(meter.mark(), 0);
        assert_eq!(meter.count(), 0);
    }

    #[test]
    fn test_mean_rate_is_positive_after_marks() {
        let meter = Meter::new();
        meter.mark_n(10);
        thread::sleep(Duration::from_millis(10));
        let rate = meter.mean_rate();
        assert!(rate > 0.0);
        // 10 events in at least 10ms is at most 1000 events/second.
        assert!(rate <= 1000.0, "mean rate {rate} is too high");
    }

    #[test]
    fn test_snapshot_units() {
        let meter = Meter::new();
        meter.mark();
        let snapshot = meter.snapshot();
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.rate_units, "events/second");
        assert!(snapshot.mean_rate > 0.0);
    }
}
