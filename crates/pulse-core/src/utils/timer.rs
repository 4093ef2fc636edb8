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

//! Monotonic stopwatch used to time scopes.

use std::time::{Duration, Instant};

/// A monotonic stopwatch, started on creation.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started_at: Instant,
}

impl Stopwatch {
    /// Creates a new Stopwatch and starts it.
    /// ## Returns
    /// A running stopwatch.
    #[inline]
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }

    /// Returns the instant the stopwatch was started.
    #[inline]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the stopwatch was started.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns the elapsed time in milliseconds, with sub-millisecond precision.
    /// ## Returns
    /// The elapsed time as an `f64` number of milliseconds.
    #[inline]
    pub fn elapsed_ms_f64(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the elapsed time in seconds as f64.
    #[inline]
    pub fn elapsed_secs_f64(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Restarts the stopwatch and returns the time elapsed before the restart.
    pub fn restart(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.started_at);
        self.started_at = now;
        elapsed
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const SMALL_DURATION_MS: u64 = 15;
    const SLEEP_DURATION_MS: u64 = 100;
    const SLEEP_MARGIN_MS: u64 = 500;

    #[test]
    fn stopwatch_elapsed_time_near_zero_initially() {
        let watch = Stopwatch::new();
        let elapsed = watch.elapsed();
        assert!(
            elapsed < Duration::from_millis(SMALL_DURATION_MS),
            "Initial elapsed duration ({elapsed:?}) should be very small"
        );
        assert!(watch.elapsed_ms_f64() < SMALL_DURATION_MS as f64);
    }

    /// Verifies that the elapsed time after a sleep lands between the sleep
    /// duration and the sleep duration plus a margin.
    #[test]
    fn stopwatch_elapsed_time_after_delay() {
        let watch = Stopwatch::new();
        let sleep_duration = Duration::from_millis(SLEEP_DURATION_MS);
        let max_expected = sleep_duration + Duration::from_millis(SLEEP_MARGIN_MS);

        thread::sleep(sleep_duration);

        let elapsed = watch.elapsed();
        assert!(
            elapsed >= sleep_duration,
            "Elapsed duration ({elapsed:?}) should be >= sleep duration ({sleep_duration:?})"
        );
        assert!(
            elapsed < max_expected,
            "Elapsed duration ({elapsed:?}) should be < sleep duration + margin ({max_expected:?})"
        );

        let elapsed_secs = watch.elapsed_secs_f64();
        assert!(elapsed_secs >= SLEEP_DURATION_MS as f64 / 1000.0);
    }

    #[test]
    fn stopwatch_restart_resets_origin() {
        let mut watch = Stopwatch::new();
        thread::sleep(Duration::from_millis(20));
        let before_restart = watch.restart();
        assert!(before_restart >= Duration::from_millis(20));
        assert!(watch.elapsed() < before_restart);
    }

    #[test]
    fn stopwatch_copy_shares_origin() {
        let watch1 = Stopwatch::new();
        let watch2 = watch1;
        assert_eq!(watch1.started_at(), watch2.started_at());
    }
}
