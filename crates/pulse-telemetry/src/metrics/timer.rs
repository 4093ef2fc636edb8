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

use crate::metrics::meter::Meter;
use pulse_core::telemetry::snapshot::{DURATION_UNITS, RATE_UNITS_CALLS};
use pulse_core::telemetry::TimerSnapshot;
use std::sync::Mutex;
use std::time::Duration;

/// Running moments of the recorded durations, in milliseconds.
#[derive(Debug, Default, Clone, Copy)]
struct DurationStats {
    count: u64,
    sum: f64,
    sum_of_squares: f64,
    min: f64,
    max: f64,
}

impl DurationStats {
    fn record(&mut self, millis: f64) {
        if self.count == 0 {
            self.min = millis;
            self.max = millis;
        } else {
            self.min = self.min.min(millis);
            self.max = self.max.max(millis);
        }
        self.count += 1;
        self.sum += millis;
        self.sum_of_squares += millis * millis;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    fn stddev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let n = self.count as f64;
        let variance = (self.sum_of_squares - self.sum * self.sum / n) / (n - 1.0);
        variance.max(0.0).sqrt()
    }
}

/// Records the count and duration distribution of completed timings, plus
/// the rate at which they complete.
///
/// Each sample is recorded under the timer's own lock, so concurrent
/// completions never lose a sample and never contend with other metrics.
#[derive(Debug, Default)]
pub struct Timer {
    rate: Meter,
    stats: Mutex<DurationStats>,
}

impl Timer {
    /// Creates a timer with no samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed timing of `elapsed`.
    pub fn update(&self, elapsed: Duration) {
        let millis = elapsed.as_nanos() as f64 / 1_000_000.0;
        {
            let mut stats = match self.stats.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            stats.record(millis);
        }
        self.rate.mark();
    }

    /// Times `f` and records its duration.
    pub fn time<T>(&self, f: impl FnOnce() -> T) -> T {
        let stopwatch = pulse_core::Stopwatch::new();
        let result = f();
        self.update(stopwatch.elapsed());
        result
    }

    /// Returns the number of completed timings.
    pub fn count(&self) -> u64 {
        self.stats_copy().count
    }

    /// Returns completions per second since creation.
    pub fn mean_rate(&self) -> f64 {
        self.rate.mean_rate()
    }

    /// Returns the mean recorded duration, in milliseconds.
    pub fn mean_millis(&self) -> f64 {
        self.stats_copy().mean()
    }

    fn stats_copy(&self) -> DurationStats {
        match self.stats.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub(crate) fn snapshot(&self) -> TimerSnapshot {
        let stats = self.stats_copy();
        TimerSnapshot {
            count: stats.count,
            max: stats.max,
            mean: stats.mean(),
            min: stats.min,
            stddev: stats.stddev(),
            mean_rate: self.rate.mean_rate(),
            m1_rate: self.rate.one_minute_rate(),
            m5_rate: self.rate.five_minute_rate(),
            m15_rate: self.rate.fifteen_minute_rate(),
            duration_units: DURATION_UNITS.to_string(),
            rate_units: RATE_UNITS_CALLS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics() {
        let timer = Timer::new();
        timer.update(Duration::from_millis(10));
        timer.update(Duration::from_millis(20));
        timer.update(Duration::from_millis(30));

        let snapshot = timer.snapshot();
        assert_eq!(snapshot.count, 3);
        assert!((snapshot.min - 10.0).abs() < 1e-9);
        assert!((snapshot.max - 30.0).abs() < 1e-9);
        assert!((snapshot.mean - 20.0).abs() < 1e-9);
        assert!((snapshot.stddev - 10.0).abs() < 1e-9);
        assert!(snapshot.mean_rate > 0.0);
        assert_eq!(snapshot.duration_units, "milliseconds");
        assert_eq!(snapshot.rate_units, "calls/second");
    }

    #[test]
    fn test_empty_timer_snapshot() {
        let snapshot = Timer::new().snapshot();
        assert_eq!(snapshot.count, 0);
        assert_eq!(snapshot.mean, 0.0);
        assert_eq!(snapshot.stddev, 0.0);
        assert_eq!(snapshot.mean_rate, 0.0);
    }

    #[test]
    fn test_time_closure() {
        let timer = Timer::new();
        let value = timer.time(|| 42);
        assert_eq!(value, 42);
        assert_eq!(timer.count(), 1);
        assert!(timer.mean_millis() >= 0.0);
    }
}
