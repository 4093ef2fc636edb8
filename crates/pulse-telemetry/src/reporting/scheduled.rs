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


//! Periodic reporters: a [`SnapshotSink`] driven by a [`ReportScheduler`].

use crate::metrics::MetricsRegistry;
use crate::reporting::scheduler::{run_guarded, ReportScheduler};
use pulse_core::{MetricsResult, MetricsSnapshot, Reporter, ReporterKind};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// A destination that renders snapshots.
pub trait SnapshotSink: Send + Sync + Debug + 'static {
    /// Renders one snapshot. A failure affects this call only.
    fn write(&self, snapshot: &MetricsSnapshot) -> MetricsResult<()>;
}

/// A reporter that snapshots its registry on every tick and hands the result
/// to its sink.
///
/// Sink failures and panics are logged and the next tick proceeds normally. Stopping
/// the reporter joins the tick thread and then runs one final tick, so the
/// sink always holds the last state of the registry.
#[derive(Debug)]
pub struct ScheduledReporter<S: SnapshotSink> {
    kind: ReporterKind,
    registry: MetricsRegistry,
    sink: Arc<S>,
    scheduler: ReportScheduler,
}

impl<S: SnapshotSink> ScheduledReporter<S> {
    /// Creates a stopped reporter rendering `registry` into `sink` every `interval`.
    pub fn with_sink(
        kind: ReporterKind,
        registry: MetricsRegistry,
        sink: S,
        interval: Duration,
    ) -> Self {
        Self {
            kind,
            registry,
            sink: Arc::new(sink),
            scheduler: ReportScheduler::new(kind.as_str(), interval),
        }
    }

    /// Returns the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the tick interval.
    pub fn interval(&self) -> Duration {
        self.scheduler.interval()
    }
}

fn run_tick<S: SnapshotSink>(kind: ReporterKind, registry: &MetricsRegistry, sink: &S) {
    let snapshot = registry.snapshot();
    if let Err(e) = sink.write(&snapshot) {
        log::warn!("[{kind}] Failed to report metrics: {e}");
    }
}

impl<S: SnapshotSink> Reporter for ScheduledReporter<S> {
    fn kind(&self) -> ReporterKind {
        self.kind
    }

    fn start(&mut self) -> MetricsResult<()> {
        let kind = self.kind;
        let registry = self.registry.clone();
        let sink = Arc::clone(&self.sink);
        self.scheduler
            .start(move || run_tick(kind, &registry, sink.as_ref()))?;
        log::info!(
            "{} reporter started with a {:?} interval.",
            self.kind,
            self.scheduler.interval()
        );
        Ok(())
    }

    fn report(&self, snapshot: &MetricsSnapshot) -> MetricsResult<()> {
        self.sink.write(snapshot)
    }

    fn stop(&mut self) {
        if !self.scheduler.is_running() {
            return;
        }
        self.scheduler.stop();
        run_guarded(self.kind.as_str(), || {
            run_tick(self.kind, &self.registry, self.sink.as_ref())
        });
        log::info!("{} reporter stopped.", self.kind);
    }

    fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }
}
