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


//! Provides RAII-based timers for automatically recording scope durations.

use crate::metrics::Timer;
use pulse_core::Stopwatch;
use std::sync::Arc;
use std::time::Duration;

/// Times a scope and records the result into a [`Timer`].
///
/// The measurement is recorded exactly once: either by [`ScopedTimer::close`]
/// or, if the value is dropped without being closed, when it goes out of
/// scope (early returns and panics included).
#[derive(Debug)]
#[must_use = "dropping a ScopedTimer immediately records a near-zero duration"]
pub struct ScopedTimer {
    name: String,
    stopwatch: Stopwatch,
    timer: Arc<Timer>,
    recorded: bool,
}

impl ScopedTimer {
    /// Creates a timer for the given metric and starts it immediately.
    pub fn new(name: impl Into<String>, timer: Arc<Timer>) -> Self {
        Self {
            name: name.into(),
            stopwatch: Stopwatch::new(),
            timer,
            recorded: false,
        }
    }

    /// Returns the name of the timer this scope feeds.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the time elapsed since the scope was opened.
    pub fn elapsed(&self) -> Duration {
        self.stopwatch.elapsed()
    }

    /// Ends the scope, records its duration and returns it.
    pub fn close(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let elapsed = self.stopwatch.elapsed();
        self.timer.update(elapsed);
        self.recorded = true;
        elapsed
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if !self.recorded {
            let elapsed = self.record();
            log::trace!("Scope '{}' closed on drop after {:?}", self.name, elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn close_records_once() {
        let timer = Arc::new(Timer::new());
        let scope = ScopedTimer::new("op", Arc::clone(&timer));
        thread::sleep(Duration::from_millis(5));
        let elapsed = scope.close();

        assert!(elapsed >= Duration::from_millis(5));
        assert_eq!(timer.count(), 1);
        assert!(timer.mean_millis() >= 5.0);
    }

    #[test]
    fn drop_records_unclosed_scope() {
        let timer = Arc::new(Timer::new());
        {
            let _scope = ScopedTimer::new("op", Arc::clone(&timer));
        }
        assert_eq!(timer.count(), 1);
    }

    #[test]
    fn early_return_is_recorded() {
        fn work(timer: &Arc<Timer>, fail: bool) -> Result<(), ()> {
            let _scope = ScopedTimer::new("work", Arc::clone(timer));
            if fail {
                return Err(());
            }
            Ok(())
        }

        let timer = Arc::new(Timer::new());
        assert!(work(&timer, true).is_err());
        assert!(work(&timer, false).is_ok());
        assert_eq!(timer.count(), 2);
    }
}
