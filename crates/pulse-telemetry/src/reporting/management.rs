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


//! In-process management server and the reporter that publishes every
//! metric on it as a queryable object.

use crate::metrics::{ListenerId, Metric, MetricsRegistry, RegistryListener};
use pulse_core::{MetricKind, MetricsError, MetricsResult, MetricsSnapshot, Reporter, ReporterKind};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use std::str::FromStr;
use std::sync::{Arc, RwLock};

/// Domain under which the management reporter registers metrics.
pub const DEFAULT_DOMAIN: &str = "metrics";

/// Identifies a managed object: `<domain>:type=<kind>,name=<metric>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectName {
    /// Namespace of the object.
    pub domain: String,
    /// Kind of the metric behind the object.
    pub kind: MetricKind,
    /// Metric name.
    pub name: String,
}

impl ObjectName {
    /// Creates an object name.
    pub fn new(domain: impl Into<String>, kind: MetricKind, name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            kind,
            name: name.into(),
        }
    }
}

impl Display for ObjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:type={},name={}", self.domain, self.kind.section(), self.name)
    }
}

impl FromStr for ObjectName {
    type Err = MetricsError;

    /// Parses `<domain>:type=<kind>,name=<metric>`. The metric name is the
    /// rest of the string and may itself contain `,` or `=`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MetricsError::InvalidConfiguration(format!("malformed object name '{s}'"));
        let (domain, properties) = s.split_once(':').ok_or_else(invalid)?;
        let properties = properties.strip_prefix("type=").ok_or_else(invalid)?;
        let (section, name) = properties.split_once(",name=").ok_or_else(invalid)?;
        let kind = MetricKind::ALL
            .into_iter()
            .find(|kind| kind.section() == section)
            .ok_or_else(invalid)?;
        if domain.is_empty() || name.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(domain, kind, name))
    }
}

/// An object whose attributes can be read through a [`ManagementServer`].
pub trait ManagedBean: Send + Sync + Debug + 'static {
    /// Reads every attribute.
    fn attributes(&self) -> BTreeMap<String, Value>;

    /// Reads one attribute.
    fn attribute(&self, name: &str) -> Option<Value> {
        self.attributes().remove(name)
    }
}

/// Exposes a live metric container. Attributes are the fields of the
/// metric's snapshot entry, read at query time.
#[derive(Debug, Clone)]
pub struct MetricBean {
    metric: Metric,
}

impl MetricBean {
    /// Wraps `metric`.
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }
}

impl ManagedBean for MetricBean {
    fn attributes(&self) -> BTreeMap<String, Value> {
        match self.metric.to_json() {
            Value::Object(fields) => fields.into_iter().collect(),
            _ => BTreeMap::new(),
        }
    }
}

/// A registry of managed objects keyed by [`ObjectName`].
#[derive(Debug, Default)]
pub struct ManagementServer {
    beans: RwLock<BTreeMap<ObjectName, Arc<dyn ManagedBean>>>,
}

impl ManagementServer {
    /// Creates an empty server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bean` under `name`.
    pub fn register(&self, name: ObjectName, bean: Arc<dyn ManagedBean>) -> MetricsResult<()> {
        let mut beans = self
            .beans
            .write()
            .map_err(|_| MetricsError::Poisoned("management server lock poisoned".to_string()))?;
        if beans.contains_key(&name) {
            return Err(MetricsError::InstanceAlreadyExists(name.to_string()));
        }
        beans.insert(name, bean);
        Ok(())
    }

    /// Unregisters `name`. Returns `true` if it was registered.
    pub fn unregister(&self, name: &ObjectName) -> bool {
        match self.beans.write() {
            Ok(mut beans) => beans.remove(name).is_some(),
            Err(poisoned) => poisoned.into_inner().remove(name).is_some(),
        }
    }

    /// Unregisters every object of `domain`. Returns how many were removed.
    pub fn unregister_domain(&self, domain: &str) -> usize {
        let mut beans = match self.beans.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = beans.len();
        beans.retain(|name, _| name.domain != domain);
        before - beans.len()
    }

    /// Returns `true` if `name` is registered.
    pub fn is_registered(&self, name: &ObjectName) -> bool {
        self.beans
            .read()
            .map(|beans| beans.contains_key(name))
            .unwrap_or(false)
    }

    /// Lists the registered names of `domain`, sorted.
    pub fn query_names(&self, domain: &str) -> Vec<ObjectName> {
        self.beans
            .read()
            .map(|beans| {
                beans
                    .keys()
                    .filter(|name| name.domain == domain)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reads one attribute of a registered object.
    pub fn get_attribute(&self, name: &ObjectName, attribute: &str) -> MetricsResult<Value> {
        self.bean(name)?
            .attribute(attribute)
            .ok_or_else(|| MetricsError::AttributeNotFound {
                object: name.to_string(),
                attribute: attribute.to_string(),
            })
    }

    /// Reads every attribute of a registered object.
    pub fn attributes(&self, name: &ObjectName) -> MetricsResult<BTreeMap<String, Value>> {
        Ok(self.bean(name)?.attributes())
    }

    fn bean(&self, name: &ObjectName) -> MetricsResult<Arc<dyn ManagedBean>> {
        let beans = self
            .beans
            .read()
            .map_err(|_| MetricsError::Poisoned("management server lock poisoned".to_string()))?;
        beans
            .get(name)
            .cloned()
            .ok_or_else(|| MetricsError::MetricNotFound(name.to_string()))
    }
}

/// Keeps the server in step with the registry.
#[derive(Debug)]
struct BeanRegistrar {
    server: Arc<ManagementServer>,
    domain: String,
}

impl RegistryListener for BeanRegistrar {
    fn on_metric_added(&self, name: &str, metric: &Metric) {
        let object = ObjectName::new(&self.domain, metric.kind(), name);
        match self
            .server
            .register(object, Arc::new(MetricBean::new(metric.clone())))
        {
            Ok(()) => {}
            // Replayed additions race with live ones.
            Err(MetricsError::InstanceAlreadyExists(object)) => {
                log::trace!("Management object {object} already registered")
            }
            Err(e) => log::warn!("Unable to register {} '{}': {}", metric.kind(), name, e),
        }
    }

    fn on_metric_removed(&self, name: &str, metric: &Metric) {
        self.server
            .unregister(&ObjectName::new(&self.domain, metric.kind(), name));
    }
}

/// Publishes every registry metric on a [`ManagementServer`].
///
/// Objects are registered when the reporter starts (and as new metrics are
/// created) and unregistered when it stops. Reads are served from the live
/// containers, so there is nothing to refresh periodically.
#[derive(Debug)]
pub struct ManagementReporter {
    registry: MetricsRegistry,
    server: Arc<ManagementServer>,
    domain: String,
    listener: Option<ListenerId>,
}

impl ManagementReporter {
    /// Creates a stopped reporter publishing under [`DEFAULT_DOMAIN`].
    pub fn new(registry: MetricsRegistry, server: Arc<ManagementServer>) -> Self {
        Self::with_domain(registry, server, DEFAULT_DOMAIN)
    }

    /// Creates a stopped reporter publishing under `domain`.
    pub fn with_domain(
        registry: MetricsRegistry,
        server: Arc<ManagementServer>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            server,
            domain: domain.into(),
            listener: None,
        }
    }

    /// Returns the domain objects are registered under.
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl Reporter for ManagementReporter {
    fn kind(&self) -> ReporterKind {
        ReporterKind::Jmx
    }

    fn start(&mut self) -> MetricsResult<()> {
        if self.listener.is_some() {
            return Ok(());
        }
        let registrar = Arc::new(BeanRegistrar {
            server: Arc::clone(&self.server),
            domain: self.domain.clone(),
        });
        self.listener = Some(self.registry.add_listener(registrar));
        log::info!("JMX reporter started under domain '{}'.", self.domain);
        Ok(())
    }

    fn report(&self, _snapshot: &MetricsSnapshot) -> MetricsResult<()> {
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(id) = self.listener.take() {
            self.registry.remove_listener(id);
            let removed = self.server.unregister_domain(&self.domain);
            log::info!("JMX reporter stopped, {removed} objects unregistered.");
        }
    }

    fn is_running(&self) -> bool {
        self.listener.is_some()
    }
}
