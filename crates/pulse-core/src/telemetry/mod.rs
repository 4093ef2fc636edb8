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

//! Provides the foundational traits and data structures for metrics.
//!
//! This module defines the "common language" shared by the registry and the
//! reporters. `pulse-telemetry` owns the live metric containers and the
//! reporter implementations; everything that crosses the boundary between
//! them (snapshots, errors, capability traits) lives here.

pub mod gauge;
pub mod metrics;
pub mod reporter;
pub mod snapshot;

pub use self::gauge::GaugeProvider;
pub use self::metrics::{MetricKind, MetricsError, MetricsResult};
pub use self::reporter::{Reporter, ReporterKind};
pub use self::snapshot::{
    CounterSnapshot, GaugeSnapshot, MeterSnapshot, MetricsSnapshot, TimerSnapshot,
};
