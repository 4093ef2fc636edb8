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


//! Reporters that export registry snapshots.
//!
//! - [`JsonFileReporter`] periodically rewrites a JSON document on disk.
//! - [`LogReporter`] periodically logs one line per metric.
//! - [`ManagementReporter`] publishes every metric on a [`ManagementServer`].

pub mod json_file;
pub mod logging;
pub mod management;
pub mod scheduled;
pub mod scheduler;

pub use json_file::{JsonFileReporter, JsonFileSink};
pub use logging::{LogReporter, LogSink, LOG_TARGET};
pub use management::{
    ManagedBean, ManagementReporter, ManagementServer, MetricBean, ObjectName, DEFAULT_DOMAIN,
};
pub use scheduled::{ScheduledReporter, SnapshotSink};
pub use scheduler::ReportScheduler;

use crate::config::MetricsConfig;
use crate::metrics::MetricsRegistry;
use pulse_core::{MetricsResult, Reporter, ReporterKind};
use std::sync::Arc;

/// Builds the reporters named in `config`, in order, stopped.
pub fn build_reporters(
    config: &MetricsConfig,
    registry: &MetricsRegistry,
    server: &Arc<ManagementServer>,
) -> MetricsResult<Vec<Box<dyn Reporter>>> {
    let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
    for kind in config.reporter_kinds()? {
        let reporter: Box<dyn Reporter> = match kind {
            ReporterKind::JsonFile => Box::new(JsonFileReporter::new(
                registry.clone(),
                config.json_file_location.clone(),
                config.json_interval()?,
            )),
            ReporterKind::Jmx => Box::new(ManagementReporter::new(
                registry.clone(),
                Arc::clone(server),
            )),
            ReporterKind::Slf4j => Box::new(LogReporter::new(
                registry.clone(),
                config.log_level()?,
                config.log_interval()?,
            )),
        };
        reporters.push(reporter);
    }
    Ok(reporters)
}
