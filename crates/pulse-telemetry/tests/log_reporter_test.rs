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


use log::{Level, LevelFilter, Log, Metadata, Record};
use pulse_telemetry::reporting::LOG_TARGET;
use pulse_telemetry::{Metrics, MetricsConfig};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Captured {
    level: Level,
    target: String,
    message: String,
}

/// Keeps every record in memory. Installed once per test binary.
struct CaptureLogger {
    records: Mutex<Vec<Captured>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records.lock().unwrap().push(Captured {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {}
}

fn logger() -> &'static CaptureLogger {
    static LOGGER: OnceLock<&'static CaptureLogger> = OnceLock::new();
    LOGGER.get_or_init(|| {
        let logger: &'static CaptureLogger = Box::leak(Box::new(CaptureLogger {
            records: Mutex::new(Vec::new()),
        }));
        log::set_logger(logger).expect("no other logger in this test binary");
        log::set_max_level(LevelFilter::Trace);
        logger
    })
}

/// Metric lines mentioning `name`.
fn lines_for(name: &str) -> Vec<Captured> {
    let needle = format!("name={name},");
    logger()
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r.target == LOG_TARGET && r.message.contains(&needle))
        .cloned()
        .collect()
}

fn log_config() -> MetricsConfig {
    MetricsConfig::default()
        .with_reporters("SLF4J")
        .with_log_frequency("100ms")
}

#[test]
fn test_counter_lines_at_default_level() {
    // --- 1. ARRANGE ---
    logger();
    let metrics = Metrics::new();
    metrics.init(log_config()).unwrap();

    // --- 2. ACT ---
    for _ in 0..5 {
        metrics.increment_counter("log_count_info").unwrap();
    }
    thread::sleep(Duration::from_millis(500));

    // --- 3. ASSERT ---
    let lines = lines_for("log_count_info");
    assert!(!lines.is_empty(), "the reporter should have ticked");
    assert!(lines.iter().all(|l| l.level == Level::Info));
    assert!(lines
        .iter()
        .any(|l| l.message == "type=COUNTER, name=log_count_info, count=5"));
    metrics.close();
}

#[test]
fn test_level_override_changes_level_only() {
    logger();
    let metrics = Metrics::new();
    metrics.init(log_config().with_log_level("DEBUG")).unwrap();

    for _ in 0..5 {
        metrics.increment_counter("log_count_debug").unwrap();
    }
    thread::sleep(Duration::from_millis(500));

    let lines = lines_for("log_count_debug");
    assert!(!lines.is_empty(), "the reporter should have ticked");
    assert!(lines.iter().all(|l| l.level == Level::Debug));
    assert!(lines
        .iter()
        .any(|l| l.message == "type=COUNTER, name=log_count_debug, count=5"));
    metrics.close();
}

#[test]
fn test_one_second_frequency_with_unit() {
    logger();
    let metrics = Metrics::new();
    metrics
        .init(
            MetricsConfig::default()
                .with_reporters("SLF4J")
                .with_log_frequency("1")
                .with_log_frequency_unit("s"),
        )
        .unwrap();

    metrics.mark_meter("log_meter").unwrap();
    metrics.start_stored_scope("log_timer").unwrap();
    metrics.end_stored_scope("log_timer").unwrap();
    thread::sleep(Duration::from_millis(1500));

    let meter_lines = lines_for("log_meter");
    assert!(meter_lines
        .iter()
        .any(|l| l.message.starts_with("type=METER, name=log_meter, count=1,")));
    let timer_lines = lines_for("log_timer");
    assert!(timer_lines
        .iter()
        .any(|l| l.message.starts_with("type=TIMER, name=log_timer, count=1,")));
    metrics.close();
}
