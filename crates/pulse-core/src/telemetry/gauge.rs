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

//! The capability interface behind gauges.

use serde_json::Value;

/// A source of the current value of a gauge.
///
/// The registry never owns the measured value. It keeps a reference to a
/// provider and polls it every time a snapshot is taken, so readers always
/// observe the value at read time.
///
/// Any closure returning something convertible into a JSON value is a
/// provider:
///
/// ```rust
/// use pulse_core::GaugeProvider;
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use std::sync::Arc;
///
/// let queue_depth = Arc::new(AtomicI64::new(3));
/// let depth = Arc::clone(&queue_depth);
/// let provider = move || depth.load(Ordering::Relaxed);
///
/// assert_eq!(provider.current_value(), serde_json::json!(3));
/// queue_depth.store(7, Ordering::Relaxed);
/// assert_eq!(provider.current_value(), serde_json::json!(7));
/// ```
pub trait GaugeProvider: Send + Sync + 'static {
    /// Reads the current value.
    fn current_value(&self) -> Value;
}

impl<F, V> GaugeProvider for F
where
    F: Fn() -> V + Send + Sync + 'static,
    V: Into<Value>,
{
    fn current_value(&self) -> Value {
        self().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_closure_provider_is_polled_each_time() {
        let flag = Arc::new(AtomicBool::new(false));
        let reader = Arc::clone(&flag);
        let provider: Box<dyn GaugeProvider> = Box::new(move || reader.load(Ordering::SeqCst));

        assert_eq!(provider.current_value(), Value::Bool(false));
        flag.store(true, Ordering::SeqCst);
        assert_eq!(provider.current_value(), Value::Bool(true));
    }

    #[test]
    fn test_string_provider() {
        let provider = || "warming-up".to_string();
        assert_eq!(provider.current_value(), Value::from("warming-up"));
    }
}
