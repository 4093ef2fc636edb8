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

use crate::metrics::Metric;
use crate::storage::backend::{Lookup, MetricsBackend};
use pulse_core::{MetricsError, MetricsResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory metrics backend using `RwLock<HashMap>`.
///
/// - Lookups of existing names only take the read lock.
/// - Creation re-checks under the write lock, so racing creators converge on
///   a single container.
/// - The lock guards the name table only; container updates never touch it.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    storage: RwLock<HashMap<String, Metric>>,
}

impl InMemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new in-memory backend with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }
}

impl MetricsBackend for InMemoryBackend {
    fn get_or_create(&self, name: &str, create: &dyn Fn() -> Metric) -> MetricsResult<Lookup> {
        {
            let storage = self
                .storage
                .read()
                .map_err(|_| MetricsError::Poisoned("Failed to acquire read lock".to_string()))?;
            if let Some(metric) = storage.get(name) {
                return Ok(Lookup {
                    metric: metric.clone(),
                    created: false,
                });
            }
        }

        let mut storage = self
            .storage
            .write()
            .map_err(|_| MetricsError::Poisoned("Failed to acquire write lock".to_string()))?;
        if let Some(metric) = storage.get(name) {
            // Another thread won the race between our two locks.
            return Ok(Lookup {
                metric: metric.clone(),
                created: false,
            });
        }
        let metric = create();
        storage.insert(name.to_string(), metric.clone());
        Ok(Lookup {
            metric,
            created: true,
        })
    }

    fn bind(
        &self,
        name: &str,
        metric: Metric,
        check: &dyn Fn(Option<&Metric>) -> MetricsResult<()>,
    ) -> MetricsResult<Option<Metric>> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| MetricsError::Poisoned("Failed to acquire write lock".to_string()))?;
        check(storage.get(name))?;
        Ok(storage.insert(name.to_string(), metric))
    }

    fn get(&self, name: &str) -> Option<Metric> {
        self.storage
            .read()
            .ok()
            .and_then(|storage| storage.get(name).cloned())
    }

    fn remove(&self, name: &str) -> MetricsResult<Option<Metric>> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| MetricsError::Poisoned("Failed to acquire write lock".to_string()))?;
        Ok(storage.remove(name))
    }

    fn entries(&self) -> Vec<(String, Metric)> {
        if let Ok(storage) = self.storage.read() {
            storage
                .iter()
                .map(|(name, metric)| (name.clone(), metric.clone()))
                .collect()
        } else {
            Vec::new()
        }
    }

    fn drain(&self) -> MetricsResult<Vec<(String, Metric)>> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| MetricsError::Poisoned("Failed to acquire write lock".to_string()))?;
        Ok(storage.drain().collect())
    }

    fn len(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }
}
