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
use pulse_core::MetricsResult;
use std::fmt::Debug;

/// Outcome of a get-or-create lookup.
#[derive(Debug, Clone)]
pub struct Lookup {
    /// The container bound to the name.
    pub metric: Metric,
    /// `true` if this call created the container.
    pub created: bool,
}

/// Trait defining the interface for metric storage backends.
///
/// A backend maps names to live containers. It must guarantee that at most
/// one container ever exists per name, even when several threads race to
/// create it.
pub trait MetricsBackend: Send + Sync + Debug + 'static {
    /// Returns the container bound to `name`, creating it with `create` if the
    /// name is free. The check and the insertion are a single atomic step.
    fn get_or_create(&self, name: &str, create: &dyn Fn() -> Metric) -> MetricsResult<Lookup>;

    /// Binds `metric` to `name`. `check` sees the current binding (if any)
    /// under the same critical section as the insertion and may veto it.
    /// Returns the previous binding.
    fn bind(
        &self,
        name: &str,
        metric: Metric,
        check: &dyn Fn(Option<&Metric>) -> MetricsResult<()>,
    ) -> MetricsResult<Option<Metric>>;

    /// Retrieves the container bound to `name`.
    fn get(&self, name: &str) -> Option<Metric>;

    /// Unbinds `name`, returning the removed container.
    fn remove(&self, name: &str) -> MetricsResult<Option<Metric>>;

    /// Returns every binding (potentially expensive operation).
    fn entries(&self) -> Vec<(String, Metric)>;

    /// Removes every binding, returning what was removed.
    fn drain(&self) -> MetricsResult<Vec<(String, Metric)>>;

    /// Returns the number of bindings.
    fn len(&self) -> usize;

    /// Returns `true` if no metric is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
