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


//! Reporter that logs one line per metric through the `log` facade.

use crate::metrics::MetricsRegistry;
use crate::reporting::scheduled::{ScheduledReporter, SnapshotSink};
use pulse_core::{MetricKind, MetricsResult, MetricsSnapshot, ReporterKind};
use std::time::Duration;

/// Log target used for metric lines.
pub const LOG_TARGET: &str = "pulse::metrics";

/// Logs a snapshot as one line per metric at a fixed level.
#[derive(Debug, Clone)]
pub struct LogSink {
    level: log::Level,
    target: &'static str,
}

impl LogSink {
    /// Creates a sink logging at `level` under [`LOG_TARGET`].
    pub fn new(level: log::Level) -> Self {
        Self {
            level,
            target: LOG_TARGET,
        }
    }

    /// Returns the level lines are logged at.
    pub fn level(&self) -> log::Level {
        self.level
    }

    /// Renders `snapshot` into the lines this sink would log.
    pub fn render(snapshot: &MetricsSnapshot) -> Vec<String> {
        let mut lines = Vec::with_capacity(snapshot.len());
        for (name, gauge) in &snapshot.gauges {
            lines.push(format!(
                "type={}, name={name}, value={}",
                MetricKind::Gauge.label(),
                gauge.value
            ));
        }
        for (name, counter) in &snapshot.counters {
            lines.push(format!(
                "type={}, name={name}, count={}",
                MetricKind::Counter.label(),
                counter.count
            ));
        }
        for (name, meter) in &snapshot.meters {
            lines.push(format!(
                "type={}, name={name}, count={}, mean_rate={:.6}, m1={:.6}, m5={:.6}, m15={:.6}, rate_unit={}",
                MetricKind::Meter.label(),
                meter.count,
                meter.mean_rate,
                meter.m1_rate,
                meter.m5_rate,
                meter.m15_rate,
                meter.rate_units
            ));
        }
        for (name, timer) in &snapshot.timers {
            lines.push(format!(
                "type={}, name={name}, count={}, min={:.3}, max={:.3}, mean={:.3}, stddev={:.3}, mean_rate={:.6}, m1={:.6}, m5={:.6}, m15={:.6}, rate_unit={}, duration_unit={}",
                MetricKind::Timer.label(),
                timer.count,
                timer.min,
                timer.max,
                timer.mean,
                timer.stddev,
                timer.mean_rate,
                timer.m1_rate,
                timer.m5_rate,
                timer.m15_rate,
                timer.rate_units,
                timer.duration_units
            ));
        }
        lines
    }
}

impl SnapshotSink for LogSink {
    fn write(&self, snapshot: &MetricsSnapshot) -> MetricsResult<()> {
        if !log::log_enabled!(target: self.target, self.level) {
            return Ok(());
        }
        for line in Self::render(snapshot) {
            log::log!(target: self.target, self.level, "{line}");
        }
        Ok(())
    }
}

/// Periodically logs the registry's snapshot.
pub type LogReporter = ScheduledReporter<LogSink>;

impl LogReporter {
    /// Creates a stopped reporter logging `registry` at `level` every `interval`.
    pub fn new(registry: MetricsRegistry, level: log::Level, interval: Duration) -> Self {
        Self::with_sink(ReporterKind::Slf4j, registry, LogSink::new(level), interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_one_line_per_metric() {
        let registry = MetricsRegistry::new();
        registry.counter("my-counter").unwrap().inc_by(5);
        registry.meter("my-meter").unwrap().mark_n(2);
        registry
            .timer("my-timer")
            .unwrap()
            .update(Duration::from_millis(4));
        registry.register_gauge("my-gauge", || 0.5).unwrap();

        let lines = LogSink::render(&registry.snapshot());
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "type=GAUGE, name=my-gauge, value=0.5");
        assert_eq!(lines[1], "type=COUNTER, name=my-counter, count=5");
        assert!(lines[2].starts_with("type=METER, name=my-meter, count=2, mean_rate="));
        assert!(lines[2].ends_with("rate_unit=events/second"));
        assert!(lines[3].starts_with("type=TIMER, name=my-timer, count=1, min=4.000, max=4.000"));
        assert!(lines[3].ends_with("rate_unit=calls/second, duration_unit=milliseconds"));
    }

    #[test]
    fn empty_snapshot_renders_nothing() {
        assert!(LogSink::render(&MetricsSnapshot::new()).is_empty());
    }

    #[test]
    fn reporter_carries_level() {
        let reporter = LogReporter::new(
            MetricsRegistry::new(),
            log::Level::Debug,
            Duration::from_secs(1),
        );
        assert_eq!(reporter.sink().level(), log::Level::Debug);
        assert_eq!(reporter.interval(), Duration::from_secs(1));
    }
}
