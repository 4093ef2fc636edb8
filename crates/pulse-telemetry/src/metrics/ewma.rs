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

//! Exponentially weighted moving average rates, in the style of UNIX load
//! averages.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// How often the averages are folded.
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct EwmaState {
    /// Events per second.
    rate: f64,
    initialized: bool,
}

/// An exponentially weighted moving average of an event rate.
///
/// Events are accumulated lock-free with [`update`](Ewma::update); the
/// average is folded once per [`TICK_INTERVAL`] by [`tick`](Ewma::tick).
#[derive(Debug)]
pub struct Ewma {
    alpha: f64,
    uncounted: AtomicU64,
    state: Mutex<EwmaState>,
}

impl Ewma {
    /// Creates an average over a window of `minutes`.
    pub fn over_minutes(minutes: f64) -> Self {
        let alpha = 1.0 - (-TICK_INTERVAL.as_secs_f64() / 60.0 / minutes).exp();
        Self {
            alpha,
            uncounted: AtomicU64::new(0),
            state: Mutex::new(EwmaState::default()),
        }
    }

    /// One-minute average.
    pub fn one_minute() -> Self {
        Self::over_minutes(1.0)
    }

    /// Five-minute average.
    pub fn five_minutes() -> Self {
        Self::over_minutes(5.0)
    }

    /// Fifteen-minute average.
    pub fn fifteen_minutes() -> Self {
        Self::over_minutes(15.0)
    }

    /// Records `n` new events.
    pub fn update(&self, n: u64) {
        self.uncounted.fetch_add(n, Ordering::Relaxed);
    }

    /// Folds the events recorded since the previous tick into the average.
    pub fn tick(&self) {
        let count = self.uncounted.swap(0, Ordering::Relaxed);
        let instant_rate = count as f64 / TICK_INTERVAL.as_secs_f64();
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.initialized {
            state.rate += self.alpha * (instant_rate - state.rate);
        } else {
            state.rate = instant_rate;
            state.initialized = true;
        }
    }

    /// Returns the current average, in events per second.
    pub fn rate(&self) -> f64 {
        match self.state.lock() {
            Ok(guard) => guard.rate,
            Err(poisoned) => poisoned.into_inner().rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_sets_instant_rate() {
        let ewma = Ewma::one_minute();
        assert_eq!(ewma.rate(), 0.0);

        ewma.update(3);
        ewma.tick();
        assert!((ewma.rate() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_one_minute_rate_decays() {
        let ewma = Ewma::one_minute();
        ewma.update(3);
        ewma.tick();

        // After one more minute of silence the rate has decayed by e^-1.
        for _ in 0..12 {
            ewma.tick();
        }
        let expected = 0.6 * (-1.0f64).exp();
        assert!(
            (ewma.rate() - expected).abs() < 1e-6,
            "rate {} should be close to {}",
            ewma.rate(),
            expected
        );
    }

    #[test]
    fn test_longer_windows_decay_slower() {
        let m1 = Ewma::one_minute();
        let m15 = Ewma::fifteen_minutes();
        for ewma in [&m1, &m15] {
            ewma.update(10);
            ewma.tick();
            ewma.tick();
        }
        assert!(m15.rate() > m1.rate());
    }
}
