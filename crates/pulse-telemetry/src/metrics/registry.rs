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

//! Registry for managing metrics.

use crate::metrics::{Counter, Gauge, Meter, Metric, Timer};
use crate::storage::{InMemoryBackend, MetricsBackend};
use pulse_core::{GaugeProvider, MetricKind, MetricsError, MetricsResult, MetricsSnapshot};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Identifies a listener registered with [`MetricsRegistry::add_listener`].
pub type ListenerId = u64;

/// Observer of metric additions and removals.
///
/// Notifications are delivered in the order the registry applied the
/// changes, one at a time. Callbacks run while the registry holds its
/// notification lock, so they must not add or remove metrics themselves.
pub trait RegistryListener: Send + Sync + 'static {
    /// Called after a container has been bound to `name`.
    fn on_metric_added(&self, name: &str, metric: &Metric);

    /// Called after the container bound to `name` has been removed.
    fn on_metric_removed(&self, name: &str, metric: &Metric);
}

struct RegistryInner {
    backend: Arc<dyn MetricsBackend>,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn RegistryListener>)>>,
    next_listener_id: AtomicU64,
    // Serializes backend mutations with their notifications.
    notify: Mutex<()>,
}

/// Central registry of named metrics.
///
/// This registry provides a high-level, typed API over a
/// [`MetricsBackend`]: containers are created on first use, repeated lookups
/// return the same container, and a name can only ever be bound to one kind
/// of metric. Cloning the registry is cheap and every clone shares the same
/// storage, so reporters can hold their own handle.
#[derive(Clone)]
pub struct MetricsRegistry {
    inner: Arc<RegistryInner>,
}

impl MetricsRegistry {
    /// Create a new metrics registry with the default in-memory backend
    pub fn new() -> Self {
        Self::with_backend(Arc::new(InMemoryBackend::new()))
    }

    /// Create a new metrics registry with a custom backend
    pub fn with_backend(backend: Arc<dyn MetricsBackend>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                backend,
                listeners: RwLock::new(Vec::new()),
                next_listener_id: AtomicU64::new(1),
                notify: Mutex::new(()),
            }),
        }
    }

    /// Returns the counter named `name`, creating it on first use.
    pub fn counter(&self, name: &str) -> MetricsResult<Arc<Counter>> {
        let create = || Metric::Counter(Arc::new(Counter::new()));
        match self.get_or_create(name, &create)? {
            Metric::Counter(counter) => Ok(counter),
            other => Err(type_mismatch(name, MetricKind::Counter, other.kind())),
        }
    }

    /// Returns the meter named `name`, creating it on first use.
    pub fn meter(&self, name: &str) -> MetricsResult<Arc<Meter>> {
        let create = || Metric::Meter(Arc::new(Meter::new()));
        match self.get_or_create(name, &create)? {
            Metric::Meter(meter) => Ok(meter),
            other => Err(type_mismatch(name, MetricKind::Meter, other.kind())),
        }
    }

    /// Returns the timer named `name`, creating it on first use.
    pub fn timer(&self, name: &str) -> MetricsResult<Arc<Timer>> {
        let create = || Metric::Timer(Arc::new(Timer::new()));
        match self.get_or_create(name, &create)? {
            Metric::Timer(timer) => Ok(timer),
            other => Err(type_mismatch(name, MetricKind::Timer, other.kind())),
        }
    }

    /// Binds a gauge to `name`, replacing any gauge already bound to it.
    ///
    /// Returns the gauge that was replaced, if any. Binding over a metric of
    /// another kind fails with [`MetricsError::TypeMismatch`].
    pub fn register_gauge(
        &self,
        name: &str,
        provider: impl GaugeProvider,
    ) -> MetricsResult<Option<Arc<Gauge>>> {
        self.bind_gauge(name, Gauge::new(Arc::new(provider)), false)
    }

    /// Binds a gauge to `name`, failing with [`MetricsError::DuplicateGauge`]
    /// if a gauge is already bound to it.
    pub fn try_register_gauge(
        &self,
        name: &str,
        provider: impl GaugeProvider,
    ) -> MetricsResult<Arc<Gauge>> {
        let gauge = Arc::new(Gauge::new(Arc::new(provider)));
        self.bind(name, Metric::Gauge(Arc::clone(&gauge)), true)?;
        Ok(gauge)
    }

    /// Binds an already built gauge to `name`. With `strict`, an existing
    /// gauge is an error; otherwise it is replaced and returned.
    pub fn bind_gauge(
        &self,
        name: &str,
        gauge: Gauge,
        strict: bool,
    ) -> MetricsResult<Option<Arc<Gauge>>> {
        let previous = self.bind(name, Metric::Gauge(Arc::new(gauge)), strict)?;
        Ok(previous.and_then(|metric| match metric {
            Metric::Gauge(gauge) => Some(gauge),
            _ => None,
        }))
    }

    fn bind(&self, name: &str, metric: Metric, strict: bool) -> MetricsResult<Option<Metric>> {
        let check = |existing: Option<&Metric>| -> MetricsResult<()> {
            match existing {
                None => Ok(()),
                Some(Metric::Gauge(_)) if strict => {
                    Err(MetricsError::DuplicateGauge(name.to_string()))
                }
                Some(Metric::Gauge(_)) => Ok(()),
                Some(other) => Err(type_mismatch(name, MetricKind::Gauge, other.kind())),
            }
        };
        let _order = self.lock_notify();
        let previous = self.inner.backend.bind(name, metric.clone(), &check)?;
        if let Some(old) = &previous {
            log::warn!(
                "A gauge named '{name}' already exists. The old gauge will be overwritten, but this is not recommended"
            );
            self.notify_removed(name, old);
        }
        self.notify_added(name, &metric);
        Ok(previous)
    }

    fn get_or_create(&self, name: &str, create: &dyn Fn() -> Metric) -> MetricsResult<Metric> {
        if let Some(metric) = self.inner.backend.get(name) {
            return Ok(metric);
        }
        let _order = self.lock_notify();
        let lookup = self.inner.backend.get_or_create(name, create)?;
        if lookup.created {
            log::trace!("Created {} '{}'", lookup.metric.kind(), name);
            self.notify_added(name, &lookup.metric);
        }
        Ok(lookup.metric)
    }

    /// Get a metric by name
    pub fn get(&self, name: &str) -> Option<Metric> {
        self.inner.backend.get(name)
    }

    /// Check if a metric exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes the metric bound to `name`. Returns `true` if one was bound.
    pub fn remove(&self, name: &str) -> MetricsResult<bool> {
        let _order = self.lock_notify();
        match self.inner.backend.remove(name)? {
            Some(metric) => {
                self.notify_removed(name, &metric);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Get all counters, by name
    pub fn counters(&self) -> BTreeMap<String, Arc<Counter>> {
        self.collect(|metric| match metric {
            Metric::Counter(c) => Some(c),
            _ => None,
        })
    }

    /// Get all meters, by name
    pub fn meters(&self) -> BTreeMap<String, Arc<Meter>> {
        self.collect(|metric| match metric {
            Metric::Meter(m) => Some(m),
            _ => None,
        })
    }

    /// Get all timers, by name
    pub fn timers(&self) -> BTreeMap<String, Arc<Timer>> {
        self.collect(|metric| match metric {
            Metric::Timer(t) => Some(t),
            _ => None,
        })
    }

    /// Get all gauges, by name
    pub fn gauges(&self) -> BTreeMap<String, Arc<Gauge>> {
        self.collect(|metric| match metric {
            Metric::Gauge(g) => Some(g),
            _ => None,
        })
    }

    fn collect<T>(&self, select: impl Fn(Metric) -> Option<T>) -> BTreeMap<String, T> {
        self.inner
            .backend
            .entries()
            .into_iter()
            .filter_map(|(name, metric)| select(metric).map(|m| (name, m)))
            .collect()
    }

    /// Reads every metric into a snapshot. Each container is read on its own,
    /// so the snapshot is consistent per metric only.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::new();
        for (name, metric) in self.inner.backend.entries() {
            match metric {
                Metric::Counter(c) => {
                    snapshot.counters.insert(name, c.snapshot());
                }
                Metric::Gauge(g) => {
                    snapshot.gauges.insert(name, g.snapshot());
                }
                Metric::Meter(m) => {
                    snapshot.meters.insert(name, m.snapshot());
                }
                Metric::Timer(t) => {
                    snapshot.timers.insert(name, t.snapshot());
                }
            }
        }
        snapshot
    }

    /// Get the total number of metrics
    pub fn metric_count(&self) -> usize {
        self.inner.backend.len()
    }

    /// Returns the sorted names of every metric.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .backend
            .entries()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        names
    }

    /// Removes every metric, notifying listeners. Returns how many were removed.
    pub fn clear(&self) -> MetricsResult<usize> {
        let _order = self.lock_notify();
        let drained = self.inner.backend.drain()?;
        for (name, metric) in &drained {
            self.notify_removed(name, metric);
        }
        Ok(drained.len())
    }

    /// Subscribes `listener` to additions and removals. The listener is
    /// immediately told about every metric already registered.
    pub fn add_listener(&self, listener: Arc<dyn RegistryListener>) -> ListenerId {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let _order = self.lock_notify();
        match self.inner.listeners.write() {
            Ok(mut listeners) => listeners.push((id, Arc::clone(&listener))),
            Err(poisoned) => poisoned.into_inner().push((id, Arc::clone(&listener))),
        }
        for (name, metric) in self.inner.backend.entries() {
            listener.on_metric_added(&name, &metric);
        }
        id
    }

    /// Unsubscribes a listener. Returns `true` if it was subscribed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = match self.inner.listeners.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    fn listeners(&self) -> Vec<Arc<dyn RegistryListener>> {
        match self.inner.listeners.read() {
            Ok(guard) => guard.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect(),
        }
    }

    fn lock_notify(&self) -> MutexGuard<'_, ()> {
        match self.inner.notify.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn notify_added(&self, name: &str, metric: &Metric) {
        for listener in self.listeners() {
            listener.on_metric_added(name, metric);
        }
    }

    fn notify_removed(&self, name: &str, metric: &Metric) {
        for listener in self.listeners() {
            listener.on_metric_removed(name, metric);
        }
    }

    /// Get direct access to the backend (for advanced operations)
    pub fn backend(&self) -> &Arc<dyn MetricsBackend> {
        &self.inner.backend
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("backend", &self.inner.backend)
            .field("listeners", &self.listeners().len())
            .finish()
    }
}

fn type_mismatch(name: &str, expected: MetricKind, found: MetricKind) -> MetricsError {
    MetricsError::TypeMismatch {
        name: name.to_string(),
        expected,
        found,
    }
}
