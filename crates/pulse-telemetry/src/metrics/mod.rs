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

//! Metric containers and the registry that owns them.
//!
//! Every container is an independent, concurrency-safe primitive: counters
//! and meters are plain atomics, timers keep their own small lock. The
//! [`registry::MetricsRegistry`] maps names to shared handles of these
//! containers.

pub mod counter;
pub mod ewma;
pub mod gauge;
pub mod meter;
pub mod registry;
pub mod timer;

pub use counter::Counter;
pub use gauge::Gauge;
pub use meter::Meter;
pub use registry::{ListenerId, MetricsRegistry, RegistryListener};
pub use timer::Timer;

use pulse_core::MetricKind;
use std::sync::Arc;

/// A shared handle to a live metric container.
#[derive(Debug, Clone)]
pub enum Metric {
    /// A counter.
    Counter(Arc<Counter>),
    /// A gauge.
    Gauge(Arc<Gauge>),
    /// A meter.
    Meter(Arc<Meter>),
    /// A timer.
    Timer(Arc<Timer>),
}

impl Metric {
    /// Returns the [`MetricKind`] of this container.
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Meter(_) => MetricKind::Meter,
            Metric::Timer(_) => MetricKind::Timer,
        }
    }

    /// Returns `true` if both handles point at the same container.
    pub fn same_container(&self, other: &Metric) -> bool {
        match (self, other) {
            (Metric::Counter(a), Metric::Counter(b)) => Arc::ptr_eq(a, b),
            (Metric::Gauge(a), Metric::Gauge(b)) => Arc::ptr_eq(a, b),
            (Metric::Meter(a), Metric::Meter(b)) => Arc::ptr_eq(a, b),
            (Metric::Timer(a), Metric::Timer(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Reads the container into a JSON object, the same shape it takes in a
    /// snapshot document.
    pub fn to_json(&self) -> serde_json::Value {
        let value = match self {
            Metric::Counter(c) => serde_json::to_value(c.snapshot()),
            Metric::Gauge(g) => serde_json::to_value(g.snapshot()),
            Metric::Meter(m) => serde_json::to_value(m.snapshot()),
            Metric::Timer(t) => serde_json::to_value(t.snapshot()),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}
