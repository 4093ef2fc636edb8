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

//! Metric kinds and the error taxonomy of the metrics system.

use std::fmt::{Debug, Display};

/// The fundamental kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    /// A signed running total moved by arbitrary deltas.
    Counter,
    /// A value read on demand from an externally owned provider.
    Gauge,
    /// An event count with exponentially weighted rates.
    Meter,
    /// A count and duration distribution of completed scopes.
    Timer,
}

impl MetricKind {
    /// Every kind, in the order they appear in a snapshot document.
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Counter,
        MetricKind::Timer,
        MetricKind::Meter,
        MetricKind::Gauge,
    ];

    /// Returns the plural, lowercase section name used in snapshot documents
    /// and management object names (e.g. `"counters"`).
    pub fn section(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counters",
            MetricKind::Gauge => "gauges",
            MetricKind::Meter => "meters",
            MetricKind::Timer => "timers",
        }
    }

    /// Returns the uppercase label used on log lines (e.g. `"COUNTER"`).
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Counter => "COUNTER",
            MetricKind::Gauge => "GAUGE",
            MetricKind::Meter => "METER",
            MetricKind::Timer => "TIMER",
        }
    }
}

impl Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.section())
    }
}

/// A specialized `Result` type for metric-related operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error that can occur within the metrics system.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// The metrics facade was used before `init` or after `close`.
    NotInitialized,
    /// A stored scope was ended on a thread that has no open frame for it.
    ScopeMismatch {
        /// The name of the scope that was ended.
        scope: String,
    },
    /// A gauge is already bound to this name and the caller asked for
    /// strict registration.
    DuplicateGauge(String),
    /// A name is already bound to a metric of another kind.
    TypeMismatch {
        /// The contested metric name.
        name: String,
        /// The kind the caller asked for.
        expected: MetricKind,
        /// The kind already registered under that name.
        found: MetricKind,
    },
    /// The requested metric was not found in the registry.
    MetricNotFound(String),
    /// A reporter could not write a snapshot to its sink.
    SinkWriteFailure {
        /// The reporter that owns the sink.
        reporter: String,
        /// A description of the underlying failure.
        message: String,
    },
    /// A reporter could not be started (e.g. its worker thread failed to spawn).
    ReporterStart {
        /// The reporter that failed to start.
        reporter: String,
        /// A description of the underlying failure.
        message: String,
    },
    /// A management object name is already registered.
    InstanceAlreadyExists(String),
    /// A management object does not expose the requested attribute.
    AttributeNotFound {
        /// The object that was queried.
        object: String,
        /// The missing attribute.
        attribute: String,
    },
    /// The configuration contains a value that cannot be used.
    InvalidConfiguration(String),
    /// A lock guarding shared state was poisoned by a panicking thread.
    Poisoned(String),
}

impl Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::NotInitialized => write!(f, "Metrics system is not initialized"),
            MetricsError::ScopeMismatch { scope } => {
                write!(f, "Scope mismatch: no open scope named '{scope}' on this thread")
            }
            MetricsError::DuplicateGauge(name) => {
                write!(f, "A gauge named '{name}' is already registered")
            }
            MetricsError::TypeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "Type mismatch for '{name}': expected {expected:?}, found {found:?}"
            ),
            MetricsError::MetricNotFound(name) => write!(f, "Metric not found: {name}"),
            MetricsError::SinkWriteFailure { reporter, message } => {
                write!(f, "Reporter '{reporter}' failed to write: {message}")
            }
            MetricsError::ReporterStart { reporter, message } => {
                write!(f, "Reporter '{reporter}' failed to start: {message}")
            }
            MetricsError::InstanceAlreadyExists(name) => {
                write!(f, "Management object already registered: {name}")
            }
            MetricsError::AttributeNotFound { object, attribute } => {
                write!(f, "Attribute '{attribute}' not found on {object}")
            }
            MetricsError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {msg}"),
            MetricsError::Poisoned(msg) => write!(f, "Lock poisoned: {msg}"),
        }
    }
}

impl std::error::Error for MetricsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_kind_sections() {
        assert_eq!(MetricKind::Counter.section(), "counters");
        assert_eq!(MetricKind::Gauge.section(), "gauges");
        assert_eq!(MetricKind::Meter.section(), "meters");
        assert_eq!(MetricKind::Timer.section(), "timers");
        assert_eq!(MetricKind::Timer.label(), "TIMER");
        assert_eq!(MetricKind::Meter.to_string(), "meters");
    }

    #[test]
    fn test_error_display() {
        let err = MetricsError::ScopeMismatch {
            scope: "method1".to_string(),
        };
        assert!(err.to_string().contains("method1"));

        let err = MetricsError::TypeMismatch {
            name: "requests".to_string(),
            expected: MetricKind::Counter,
            found: MetricKind::Meter,
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch for 'requests': expected Counter, found Meter"
        );

        assert_eq!(
            MetricsError::NotInitialized.to_string(),
            "Metrics system is not initialized"
        );
    }
}
