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


use crate::metrics::MetricsRegistry;
use pulse_core::{MetricsError, MetricsResult, Stopwatch};
use std::collections::HashMap;
use std::sync::Mutex;
use std::thread::{self, ThreadId};
use std::time::Duration;

/// Prefix of the counter that tracks how many stored scopes of a name are open.
pub const ACTIVE_CALLS_PREFIX: &str = "active_calls_";

/// Returns the name of the in-flight counter paired with scope `name`.
pub fn active_calls_name(name: &str) -> String {
    format!("{ACTIVE_CALLS_PREFIX}{name}")
}

#[derive(Debug)]
struct Frame {
    name: String,
    stopwatch: Stopwatch,
}

/// Tracks named start/end intervals per thread and feeds their durations
/// into the registry's timers.
///
/// Each thread owns a stack of open frames, keyed by [`ThreadId`]. Only the
/// table of stacks is locked, briefly; the timer and counter updates happen
/// after the lock is released.
#[derive(Debug)]
pub struct ScopeTracker {
    registry: MetricsRegistry,
    stacks: Mutex<HashMap<ThreadId, Vec<Frame>>>,
}

impl ScopeTracker {
    /// Creates a tracker recording into `registry`.
    pub fn new(registry: MetricsRegistry) -> Self {
        Self {
            registry,
            stacks: Mutex::new(HashMap::new()),
        }
    }

    /// Opens scope `name` on the calling thread and bumps its in-flight counter.
    pub fn start(&self, name: &str) -> MetricsResult<()> {
        // Resolve the containers first so a type clash leaves no dangling frame.
        self.registry.timer(name)?;
        let active = self.registry.counter(&active_calls_name(name))?;

        self.stacks
            .lock()
            .map_err(|_| MetricsError::Poisoned("Failed to acquire scope lock".to_string()))?
            .entry(thread::current().id())
            .or_default()
            .push(Frame {
                name: name.to_string(),
                stopwatch: Stopwatch::new(),
            });
        active.inc();
        Ok(())
    }

    /// Closes the most recent scope `name` opened by the calling thread,
    /// records its duration and returns it.
    ///
    /// Fails with [`MetricsError::ScopeMismatch`] if the calling thread has no
    /// open scope of that name.
    pub fn end(&self, name: &str) -> MetricsResult<Duration> {
        let frame = {
            let mut stacks = self
                .stacks
                .lock()
                .map_err(|_| MetricsError::Poisoned("Failed to acquire scope lock".to_string()))?;
            let id = thread::current().id();
            let stack = stacks.get_mut(&id).ok_or_else(|| MetricsError::ScopeMismatch {
                scope: name.to_string(),
            })?;
            let position = stack
                .iter()
                .rposition(|frame| frame.name == name)
                .ok_or_else(|| MetricsError::ScopeMismatch {
                    scope: name.to_string(),
                })?;
            let frame = stack.remove(position);
            if stack.is_empty() {
                stacks.remove(&id);
            }
            frame
        };

        let elapsed = frame.stopwatch.elapsed();
        self.registry.timer(name)?.update(elapsed);
        self.registry.counter(&active_calls_name(name))?.dec();
        Ok(elapsed)
    }

    /// Returns how many scopes the calling thread currently has open.
    pub fn open_scopes(&self) -> usize {
        let id = thread::current().id();
        match self.stacks.lock() {
            Ok(stacks) => stacks.get(&id).map_or(0, Vec::len),
            Err(poisoned) => poisoned.into_inner().get(&id).map_or(0, Vec::len),
        }
    }

    /// Returns the registry this tracker records into.
    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn start_end_records_one_sample() {
        let tracker = ScopeTracker::new(MetricsRegistry::new());
        tracker.start("method1").unwrap();
        assert_eq!(tracker.open_scopes(), 1);
        assert_eq!(
            tracker
                .registry()
                .counter(&active_calls_name("method1"))
                .unwrap()
                .count(),
            1
        );

        let elapsed = tracker.end("method1").unwrap();
        let timer = tracker.registry().timer("method1").unwrap();
        assert_eq!(timer.count(), 1);
        assert!(timer.mean_millis() >= 0.0);
        assert!(elapsed <= Duration::from_secs(1));
        assert_eq!(tracker.open_scopes(), 0);
        assert_eq!(
            tracker
                .registry()
                .counter("active_calls_method1")
                .unwrap()
                .count(),
            0
        );
    }

    #[test]
    fn end_without_start_is_a_mismatch() {
        let tracker = ScopeTracker::new(MetricsRegistry::new());
        assert_eq!(
            tracker.end("never"),
            Err(MetricsError::ScopeMismatch {
                scope: "never".to_string()
            })
        );

        tracker.start("a").unwrap();
        assert!(matches!(
            tracker.end("b"),
            Err(MetricsError::ScopeMismatch { .. })
        ));
        assert_eq!(tracker.open_scopes(), 1);
    }

    #[test]
    fn nested_scopes_close_most_recent_match() {
        let tracker = ScopeTracker::new(MetricsRegistry::new());
        tracker.start("outer").unwrap();
        tracker.start("inner").unwrap();
        tracker.start("outer").unwrap();

        tracker.end("outer").unwrap();
        tracker.end("inner").unwrap();
        assert_eq!(tracker.open_scopes(), 1);
        tracker.end("outer").unwrap();

        let registry = tracker.registry();
        assert_eq!(registry.timer("outer").unwrap().count(), 2);
        assert_eq!(registry.timer("inner").unwrap().count(), 1);
    }

    #[test]
    fn scopes_are_private_to_each_thread() {
        let tracker = Arc::new(ScopeTracker::new(MetricsRegistry::new()));
        tracker.start("shared").unwrap();

        let other = Arc::clone(&tracker);
        let result = thread::spawn(move || other.end("shared")).join().unwrap();
        assert!(matches!(result, Err(MetricsError::ScopeMismatch { .. })));

        tracker.end("shared").unwrap();
    }

    #[test]
    fn concurrent_pairs_each_contribute_a_sample() {
        let tracker = Arc::new(ScopeTracker::new(MetricsRegistry::new()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || {
                    for _ in 0..25 {
                        tracker.start("hot").unwrap();
                        tracker.end("hot").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let timer = tracker.registry().timer("hot").unwrap();
        assert_eq!(timer.count(), 100);
        assert!(timer.mean_rate() > 0.0);
    }

    #[test]
    fn type_clash_leaves_no_frame() {
        let registry = MetricsRegistry::new();
        registry.counter("clash").unwrap();
        let tracker = ScopeTracker::new(registry);

        assert!(matches!(
            tracker.start("clash"),
            Err(MetricsError::TypeMismatch { .. })
        ));
        assert_eq!(tracker.open_scopes(), 0);
    }
}
