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

//! Point-in-time views of the registry, handed to reporters.
//!
//! A snapshot is consistent per metric only: each container is read on its
//! own, so two metrics in the same snapshot may have been sampled a few
//! microseconds apart. Reporters must tolerate that skew.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The version tag written at the top of every snapshot document.
pub const SNAPSHOT_VERSION: &str = "3.0.0";

/// The unit rates are expressed in.
pub const RATE_UNITS_EVENTS: &str = "events/second";

/// The unit timer rates are expressed in.
pub const RATE_UNITS_CALLS: &str = "calls/second";

/// The unit timer durations are expressed in.
pub const DURATION_UNITS: &str = "milliseconds";

/// The value of a counter at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// The running total.
    pub count: i64,
}

/// The value of a gauge at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeSnapshot {
    /// Whatever the provider returned when polled.
    pub value: Value,
}

/// The state of a meter at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterSnapshot {
    /// Total number of marked events.
    pub count: u64,
    /// Events per second since the meter was created.
    pub mean_rate: f64,
    /// One-minute exponentially weighted rate.
    pub m1_rate: f64,
    /// Five-minute exponentially weighted rate.
    pub m5_rate: f64,
    /// Fifteen-minute exponentially weighted rate.
    pub m15_rate: f64,
    /// Unit of the rate fields.
    pub rate_units: String,
}

/// The state of a timer at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    /// Number of completed timings.
    pub count: u64,
    /// Longest recorded duration.
    pub max: f64,
    /// Mean recorded duration.
    pub mean: f64,
    /// Shortest recorded duration.
    pub min: f64,
    /// Standard deviation of the recorded durations.
    pub stddev: f64,
    /// Completions per second since the timer was created.
    pub mean_rate: f64,
    /// One-minute exponentially weighted rate.
    pub m1_rate: f64,
    /// Five-minute exponentially weighted rate.
    pub m5_rate: f64,
    /// Fifteen-minute exponentially weighted rate.
    pub m15_rate: f64,
    /// Unit of the duration fields.
    pub duration_units: String,
    /// Unit of the rate fields.
    pub rate_units: String,
}

/// A read-consistent-per-metric view of every metric in a registry.
///
/// Serializes to the report document shape:
///
/// ```json
/// {
///   "version": "3.0.0",
///   "counters": { "<name>": { "count": 5 } },
///   "timers":   { "<name>": { "count": 5, "meanRate": 1.2, ... } },
///   "meters":   { "<name>": { "count": 2, "meanRate": 0.4, ... } },
///   "gauges":   { "<name>": { "value": 20 } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Document format version.
    pub version: String,
    /// Counters by name.
    pub counters: BTreeMap<String, CounterSnapshot>,
    /// Timers by name.
    pub timers: BTreeMap<String, TimerSnapshot>,
    /// Meters by name.
    pub meters: BTreeMap<String, MeterSnapshot>,
    /// Gauges by name.
    pub gauges: BTreeMap<String, GaugeSnapshot>,
}

impl MetricsSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            counters: BTreeMap::new(),
            timers: BTreeMap::new(),
            meters: BTreeMap::new(),
            gauges: BTreeMap::new(),
        }
    }

    /// Returns the total number of metrics in the snapshot.
    pub fn len(&self) -> usize {
        self.counters.len() + self.timers.len() + self.meters.len() + self.gauges.len()
    }

    /// Returns `true` if the snapshot holds no metric at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the count of the named counter, if present.
    pub fn counter_count(&self, name: &str) -> Option<i64> {
        self.counters.get(name).map(|c| c.count)
    }

    /// Returns the value of the named gauge, if present.
    pub fn gauge_value(&self, name: &str) -> Option<&Value> {
        self.gauges.get(name).map(|g| &g.value)
    }

    /// Converts the snapshot to a JSON value tree.
    pub fn to_json_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Renders the snapshot as a pretty-printed JSON document.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
