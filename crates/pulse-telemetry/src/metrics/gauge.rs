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

use pulse_core::telemetry::GaugeSnapshot;
use pulse_core::GaugeProvider;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// A metric whose value is read on demand from an external provider.
///
/// The gauge only holds a reference to the provider; it never caches a value.
#[derive(Clone)]
pub struct Gauge {
    provider: Arc<dyn GaugeProvider>,
}

impl Gauge {
    /// Wraps a provider.
    pub fn new(provider: Arc<dyn GaugeProvider>) -> Self {
        Self { provider }
    }

    /// Creates a gauge reporting `numerator / denominator`, both read at poll
    /// time. A zero, missing or non-numeric operand yields `null`.
    pub fn ratio(numerator: Arc<dyn GaugeProvider>, denominator: Arc<dyn GaugeProvider>) -> Self {
        let provider = move || -> Value {
            let n = numerator.current_value().as_f64();
            let d = denominator.current_value().as_f64();
            match (n, d) {
                (Some(n), Some(d)) if d != 0.0 => serde_json::Number::from_f64(n / d)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            }
        };
        Self::new(Arc::new(provider))
    }

    /// Polls the provider.
    pub fn value(&self) -> Value {
        self.provider.current_value()
    }

    pub(crate) fn snapshot(&self) -> GaugeSnapshot {
        GaugeSnapshot {
            value: self.value(),
        }
    }
}

impl Debug for Gauge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gauge").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[test]
    fn test_value_is_read_at_poll_time() {
        let source = Arc::new(AtomicI64::new(20));
        let reader = Arc::clone(&source);
        let gauge = Gauge::new(Arc::new(move || reader.load(Ordering::SeqCst)));

        assert_eq!(gauge.value(), json!(20));
        source.store(40, Ordering::SeqCst);
        assert_eq!(gauge.snapshot().value, json!(40));
    }

    #[test]
    fn test_ratio() {
        let hits = Arc::new(AtomicI64::new(3));
        let total = Arc::new(AtomicI64::new(4));
        let (h, t) = (Arc::clone(&hits), Arc::clone(&total));
        let gauge = Gauge::ratio(
            Arc::new(move || h.load(Ordering::SeqCst)),
            Arc::new(move || t.load(Ordering::SeqCst)),
        );

        assert_eq!(gauge.value(), json!(0.75));
        total.store(0, Ordering::SeqCst);
        assert_eq!(gauge.value(), Value::Null);
    }

    #[test]
    fn test_ratio_with_non_numeric_operand() {
        let gauge = Gauge::ratio(Arc::new(|| "n/a"), Arc::new(|| 2));
        assert_eq!(gauge.value(), Value::Null);
    }
}
