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

//! The capability interface implemented by every reporting sink.

use crate::telemetry::metrics::{MetricsError, MetricsResult};
use crate::telemetry::snapshot::MetricsSnapshot;
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// The kinds of reporter that can be named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReporterKind {
    /// Periodically overwrites a JSON document on disk.
    JsonFile,
    /// Exposes every metric as an attribute on a management server.
    Jmx,
    /// Periodically logs one line per metric.
    Slf4j,
}

impl ReporterKind {
    /// Returns the canonical configuration name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReporterKind::JsonFile => "JSON_FILE",
            ReporterKind::Jmx => "JMX",
            ReporterKind::Slf4j => "SLF4J",
        }
    }
}

impl Display for ReporterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReporterKind {
    type Err = MetricsError;

    /// Parses a reporter name. Matching ignores case and treats `-` and `_`
    /// alike, so `json-file`, `JSON_FILE` and `Json_File` are equivalent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "JSON_FILE" | "JSON" => Ok(ReporterKind::JsonFile),
            "JMX" => Ok(ReporterKind::Jmx),
            "SLF4J" | "LOG" => Ok(ReporterKind::Slf4j),
            _ => Err(MetricsError::InvalidConfiguration(format!(
                "unknown reporter kind '{}'",
                s.trim()
            ))),
        }
    }
}

/// A sink adapter that exports registry snapshots.
///
/// Reporters are built by the metrics facade from configuration, started
/// immediately and stopped when the facade is closed. Periodic reporters own
/// a background worker that takes a snapshot on every tick; pull-based
/// reporters only react to external queries.
///
/// Implementations must isolate their own failures: a sink error is logged
/// and the next tick proceeds normally. Nothing a reporter does may surface
/// on application threads.
pub trait Reporter: Send + Debug {
    /// Returns the kind of this reporter.
    fn kind(&self) -> ReporterKind;

    /// Starts the reporter. Starting a running reporter is a no-op.
    fn start(&mut self) -> MetricsResult<()>;

    /// Renders one snapshot to the sink, synchronously.
    fn report(&self, snapshot: &MetricsSnapshot) -> MetricsResult<()>;

    /// Stops the reporter, waiting for any in-flight tick and releasing the
    /// sink. Stopping a stopped reporter is a no-op.
    fn stop(&mut self);

    /// Returns `true` between a successful `start` and the next `stop`.
    fn is_running(&self) -> bool;
}
