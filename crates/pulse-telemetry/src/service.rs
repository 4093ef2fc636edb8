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


//! The metrics facade: one explicitly owned context with an
//! init/close lifecycle.

use crate::config::MetricsConfig;
use crate::metrics::{Gauge, MetricsRegistry};
use crate::reporting::{build_reporters, ManagementServer};
use crate::scope::{ScopeTracker, ScopedTimer};
use pulse_core::{GaugeProvider, MetricsError, MetricsResult, MetricsSnapshot, Reporter, ReporterKind};
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::Duration;

/// The state behind an active [`Metrics`] facade.
#[derive(Debug)]
pub struct MetricsInstance {
    config: MetricsConfig,
    registry: MetricsRegistry,
    scopes: ScopeTracker,
    reporters: Mutex<Vec<Box<dyn Reporter>>>,
}

impl MetricsInstance {
    /// Returns the configuration this instance was built from.
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Returns the registry.
    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    /// Returns the scope tracker.
    pub fn scopes(&self) -> &ScopeTracker {
        &self.scopes
    }

    /// Returns the kinds of the reporters that started.
    pub fn reporter_kinds(&self) -> Vec<ReporterKind> {
        self.with_reporters(|reporters| reporters.iter().map(|r| r.kind()).collect())
    }

    fn with_reporters<T>(&self, f: impl FnOnce(&mut Vec<Box<dyn Reporter>>) -> T) -> T {
        match self.reporters.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn shutdown(&self) {
        self.with_reporters(|reporters| {
            for reporter in reporters.iter_mut() {
                reporter.stop();
            }
            reporters.clear();
        });
        if let Err(e) = self.registry.clear() {
            log::warn!("Failed to clear the metrics registry: {e}");
        }
    }
}

/// Entry point of the metrics system.
///
/// A `Metrics` starts uninitialized. [`init`](Metrics::init) builds a fresh
/// registry and starts the configured reporters; [`close`](Metrics::close)
/// stops them and discards the registry. Every metric operation fails with
/// [`MetricsError::NotInitialized`] unless the facade is active.
///
/// ```no_run
/// use pulse_telemetry::{Metrics, MetricsConfig};
///
/// let metrics = Metrics::new();
/// metrics.init(MetricsConfig::default().with_reporters("JMX")).unwrap();
/// metrics.increment_counter("requests").unwrap();
/// metrics.start_stored_scope("handle").unwrap();
/// metrics.end_stored_scope("handle").unwrap();
/// metrics.close();
/// ```
#[derive(Debug, Default)]
pub struct Metrics {
    state: RwLock<Option<Arc<MetricsInstance>>>,
    lifecycle: Mutex<()>,
    management: Arc<ManagementServer>,
}

impl Metrics {
    /// Creates an uninitialized facade with its own management server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an uninitialized facade publishing on `server`.
    pub fn with_management_server(server: Arc<ManagementServer>) -> Self {
        Self {
            state: RwLock::new(None),
            lifecycle: Mutex::new(()),
            management: server,
        }
    }

    /// Returns the process-wide facade, created uninitialized on first use.
    pub fn global() -> &'static Metrics {
        static GLOBAL: OnceLock<Metrics> = OnceLock::new();
        GLOBAL.get_or_init(Metrics::new)
    }

    /// Tears down any active instance, then builds and publishes a new one
    /// from `config`.
    ///
    /// A reporter that fails to start is logged and left out; the facade is
    /// still activated. An invalid configuration leaves the facade closed.
    pub fn init(&self, config: MetricsConfig) -> MetricsResult<()> {
        let _lifecycle = self.lock_lifecycle();
        self.close_locked();

        config.validate()?;
        let registry = MetricsRegistry::new();
        let mut reporters = build_reporters(&config, &registry, &self.management)?;
        reporters.retain_mut(|reporter| match reporter.start() {
            Ok(()) => true,
            Err(e) => {
                log::error!("Unable to start {} reporter: {}", reporter.kind(), e);
                false
            }
        });

        let instance = Arc::new(MetricsInstance {
            config,
            scopes: ScopeTracker::new(registry.clone()),
            registry,
            reporters: Mutex::new(reporters),
        });
        log::info!(
            "Metrics system initialized with reporters {:?}",
            instance.reporter_kinds()
        );
        *self.write_state() = Some(instance);
        Ok(())
    }

    /// Stops every reporter and discards the registry. Safe to call at any
    /// time, any number of times.
    pub fn close(&self) {
        let _lifecycle = self.lock_lifecycle();
        self.close_locked();
    }

    fn close_locked(&self) {
        let previous = self.write_state().take();
        if let Some(instance) = previous {
            instance.shutdown();
            log::info!("Metrics system closed.");
        }
    }

    /// Returns the active instance.
    pub fn get_instance(&self) -> MetricsResult<Arc<MetricsInstance>> {
        let state = match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        (*state).clone().ok_or(MetricsError::NotInitialized)
    }

    /// Returns `true` between `init` and `close`.
    pub fn is_active(&self) -> bool {
        self.get_instance().is_ok()
    }

    /// Returns the management server the JMX reporter publishes on.
    pub fn management_server(&self) -> &Arc<ManagementServer> {
        &self.management
    }

    /// Increments a counter by one and returns its new value.
    pub fn increment_counter(&self, name: &str) -> MetricsResult<i64> {
        self.increment_counter_by(name, 1)
    }

    /// Increments a counter by `delta` and returns its new value.
    pub fn increment_counter_by(&self, name: &str, delta: i64) -> MetricsResult<i64> {
        Ok(self.get_instance()?.registry.counter(name)?.inc_by(delta))
    }

    /// Decrements a counter by one and returns its new value.
    pub fn decrement_counter(&self, name: &str) -> MetricsResult<i64> {
        self.decrement_counter_by(name, 1)
    }

    /// Decrements a counter by `delta` and returns its new value.
    pub fn decrement_counter_by(&self, name: &str, delta: i64) -> MetricsResult<i64> {
        Ok(self.get_instance()?.registry.counter(name)?.dec_by(delta))
    }

    /// Marks one event on a meter and returns its new count.
    pub fn mark_meter(&self, name: &str) -> MetricsResult<u64> {
        self.mark_meter_by(name, 1)
    }

    /// Marks `n` events on a meter and returns its new count.
    pub fn mark_meter_by(&self, name: &str, n: u64) -> MetricsResult<u64> {
        Ok(self.get_instance()?.registry.meter(name)?.mark_n(n))
    }

    /// Binds a gauge polling `provider`. An existing gauge of the same name
    /// is replaced, with a warning.
    pub fn add_gauge(&self, name: &str, provider: impl GaugeProvider) -> MetricsResult<()> {
        self.get_instance()?.registry.register_gauge(name, provider)?;
        Ok(())
    }

    /// Binds a gauge reading `numerator / denominator` at poll time. A zero
    /// or non-numeric denominator reads as `null`.
    pub fn add_ratio(
        &self,
        name: &str,
        numerator: impl GaugeProvider,
        denominator: impl GaugeProvider,
    ) -> MetricsResult<()> {
        let gauge = Gauge::ratio(Arc::new(numerator), Arc::new(denominator));
        self.get_instance()?.registry.bind_gauge(name, gauge, false)?;
        Ok(())
    }

    /// Opens a stored scope on the calling thread.
    pub fn start_stored_scope(&self, name: &str) -> MetricsResult<()> {
        self.get_instance()?.scopes.start(name)
    }

    /// Closes the calling thread's most recent stored scope `name` and
    /// returns its duration.
    pub fn end_stored_scope(&self, name: &str) -> MetricsResult<Duration> {
        self.get_instance()?.scopes.end(name)
    }

    /// Opens a scope whose duration is recorded when the returned value is
    /// closed or dropped.
    pub fn start_scope(&self, name: &str) -> MetricsResult<ScopedTimer> {
        let timer = self.get_instance()?.registry.timer(name)?;
        Ok(ScopedTimer::new(name, timer))
    }

    /// Returns a snapshot of every metric.
    pub fn dump_snapshot(&self) -> MetricsResult<MetricsSnapshot> {
        Ok(self.get_instance()?.registry.snapshot())
    }

    /// Returns the snapshot document as pretty-printed JSON.
    pub fn dump_json(&self) -> anyhow::Result<String> {
        Ok(self.dump_snapshot()?.to_json_pretty()?)
    }

    /// Hands one snapshot to every reporter, on the calling thread.
    ///
    /// Reporter failures are logged, not returned.
    pub fn report_now(&self) -> MetricsResult<()> {
        let instance = self.get_instance()?;
        let snapshot = instance.registry.snapshot();
        instance.with_reporters(|reporters| {
            for reporter in reporters.iter() {
                if let Err(e) = reporter.report(&snapshot) {
                    log::warn!("[{}] Failed to report metrics: {}", reporter.kind(), e);
                }
            }
        });
        Ok(())
    }

    fn lock_lifecycle(&self) -> std::sync::MutexGuard<'_, ()> {
        match self.lifecycle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, Option<Arc<MetricsInstance>>> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for Metrics {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jmx_only() -> MetricsConfig {
        MetricsConfig::default().with_reporters("JMX")
    }

    #[test]
    fn operations_fail_before_init() {
        let metrics = Metrics::new();
        assert!(!metrics.is_active());
        assert_eq!(
            metrics.increment_counter("c"),
            Err(MetricsError::NotInitialized)
        );
        assert_eq!(metrics.mark_meter("m"), Err(MetricsError::NotInitialized));
        assert_eq!(
            metrics.start_stored_scope("s"),
            Err(MetricsError::NotInitialized)
        );
        assert!(metrics.start_scope("s").is_err());
        assert!(metrics.dump_snapshot().is_err());
        metrics.close();
    }

    #[test]
    fn global_facade_is_shared() {
        let metrics = Metrics::global();
        assert!(std::ptr::eq(metrics, Metrics::global()));

        metrics.init(jmx_only()).unwrap();
        assert_eq!(Metrics::global().increment_counter("global-hits"), Ok(1));
        assert_eq!(metrics.increment_counter("global-hits"), Ok(2));
        metrics.close();
        assert!(!Metrics::global().is_active());
    }

    #[test]
    fn counter_and_meter_operations_return_new_values() {
        let metrics = Metrics::new();
        metrics.init(jmx_only()).unwrap();

        assert_eq!(metrics.increment_counter("count1").unwrap(), 1);
        assert_eq!(metrics.increment_counter_by("count1", 4).unwrap(), 5);
        assert_eq!(metrics.decrement_counter("count1").unwrap(), 4);
        assert_eq!(metrics.decrement_counter_by("count1", 10).unwrap(), -6);

        assert_eq!(metrics.dump_snapshot().unwrap().meters.get("meter"), None);
        assert_eq!(metrics.mark_meter("meter").unwrap(), 1);
        assert_eq!(metrics.mark_meter_by("meter", 2).unwrap(), 3);
        metrics.close();
    }

    #[test]
    fn reinit_discards_previous_metrics() {
        let metrics = Metrics::new();
        metrics.init(jmx_only()).unwrap();
        metrics.increment_counter("count1").unwrap();
        let old = metrics.get_instance().unwrap();

        metrics.init(jmx_only()).unwrap();
        assert!(metrics.dump_snapshot().unwrap().is_empty());
        assert_eq!(old.registry().metric_count(), 0);
        assert!(old.reporter_kinds().is_empty());
        metrics.close();
    }

    #[test]
    fn invalid_config_leaves_facade_closed() {
        let metrics = Metrics::new();
        metrics.init(jmx_only()).unwrap();
        let err = metrics.init(MetricsConfig::default().with_reporters("CSV"));
        assert!(matches!(err, Err(MetricsError::InvalidConfiguration(_))));
        assert!(!metrics.is_active());
    }

    #[test]
    fn ratio_gauge_reads_at_poll_time() {
        let metrics = Metrics::new();
        metrics.init(jmx_only()).unwrap();
        metrics.add_ratio("hit_ratio", || 3, || 4).unwrap();
        metrics.add_ratio("broken_ratio", || 3, || 0).unwrap();

        let snapshot = metrics.dump_snapshot().unwrap();
        assert_eq!(snapshot.gauge_value("hit_ratio"), Some(&json!(0.75)));
        assert_eq!(snapshot.gauge_value("broken_ratio"), Some(&json!(null)));
        metrics.close();
    }

    #[test]
    fn scoped_timer_records_into_registry() {
        let metrics = Metrics::new();
        metrics.init(jmx_only()).unwrap();
        let scope = metrics.start_scope("work").unwrap();
        scope.close();
        {
            let _scope = metrics.start_scope("work").unwrap();
        }
        assert_eq!(metrics.dump_snapshot().unwrap().timers["work"].count, 2);
        metrics.close();
    }

    #[test]
    fn dump_json_has_every_section() {
        let metrics = Metrics::new();
        metrics.init(jmx_only()).unwrap();
        metrics.increment_counter("count1").unwrap();
        let document: serde_json::Value =
            serde_json::from_str(&metrics.dump_json().unwrap()).unwrap();
        for section in ["counters", "timers", "meters", "gauges"] {
            assert!(document[section].is_object(), "missing {section}");
        }
        assert_eq!(document["counters"]["count1"]["count"], 1);
        metrics.close();
    }
}
