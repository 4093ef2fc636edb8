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


//! # Pulse Telemetry
//!
//! The in-process metrics system: metric containers and their registry,
//! per-thread scope tracking, the reporters that export snapshots, and the
//! [`Metrics`] facade that ties them together under an init/close lifecycle.

#![warn(missing_docs)]

pub mod config;
pub mod metrics;
pub mod reporting;
pub mod scope;
pub mod service;
pub mod storage;

pub use config::{parse_time, MetricsConfig, TimeUnit};
pub use metrics::{Counter, Gauge, Meter, Metric, MetricsRegistry, RegistryListener, Timer};
pub use reporting::{
    JsonFileReporter, LogReporter, ManagementReporter, ManagementServer, ObjectName,
};
pub use scope::{ScopeTracker, ScopedTimer};
pub use service::{Metrics, MetricsInstance};
pub use storage::{InMemoryBackend, MetricsBackend};

pub use pulse_core::{MetricKind, MetricsError, MetricsResult, MetricsSnapshot, ReporterKind};
