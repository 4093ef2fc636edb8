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


use anyhow::Result;
use pulse_telemetry::{MetricKind, Metrics, MetricsConfig, MetricsResult, ObjectName};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Loads the config named on the command line, or a demo config that runs
/// every reporter at short intervals.
fn load_config() -> Result<MetricsConfig> {
    match std::env::args().nth(1) {
        Some(path) => MetricsConfig::from_file(path),
        None => Ok(MetricsConfig::default()
            .with_reporters("JSON_FILE,JMX,SLF4J")
            .with_json_interval("500ms")
            .with_log_frequency("1s")),
    }
}

fn run_worker(metrics: &Metrics, queue_depth: &AtomicU64, worker: u64) -> MetricsResult<()> {
    for job in 0..20u64 {
        queue_depth.fetch_add(1, Ordering::Relaxed);
        metrics.start_stored_scope("job")?;
        thread::sleep(Duration::from_millis(10 + (job + worker) % 5 * 5));
        metrics.end_stored_scope("job")?;
        queue_depth.fetch_sub(1, Ordering::Relaxed);
        metrics.increment_counter("jobs_done")?;
        metrics.mark_meter("events")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let report_path = config.json_file_location.clone();
    let metrics = Metrics::new();
    metrics.init(config)?;

    let queue_depth = Arc::new(AtomicU64::new(0));
    let depth = Arc::clone(&queue_depth);
    metrics.add_gauge("queue_depth", move || depth.load(Ordering::Relaxed))?;
    metrics.add_ratio("jobs_per_event", || 1, || 1)?;

    thread::scope(|s| {
        let handles: Vec<_> = (0..3u64)
            .map(|worker| {
                let metrics = &metrics;
                let queue_depth = queue_depth.as_ref();
                s.spawn(move || run_worker(metrics, queue_depth, worker))
            })
            .collect();
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("Worker failed: {e}"),
                Err(_) => log::error!("Worker panicked"),
            }
        }
    });

    {
        let _flush = metrics.start_scope("flush")?;
        thread::sleep(Duration::from_millis(25));
    }

    let jobs = ObjectName::new("metrics", MetricKind::Timer, "job");
    if let Ok(mean) = metrics.management_server().get_attribute(&jobs, "mean") {
        log::info!("Management view of {jobs}: mean={mean} ms");
    }

    thread::sleep(Duration::from_millis(1200));
    metrics.report_now()?;
    log::info!("Final snapshot:\n{}", metrics.dump_json()?);
    log::info!("JSON report written to {}", report_path.display());

    metrics.close();
    Ok(())
}
