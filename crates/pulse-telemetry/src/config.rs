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


//! Configuration of the metrics facade and its reporters.

use anyhow::Context;
use pulse_core::{MetricsError, MetricsResult, ReporterKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Complete metrics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Comma-delimited reporter kinds, e.g. `"JSON_FILE,JMX"`.
    pub reporters: String,
    /// Where the JSON file reporter writes its document.
    pub json_file_location: PathBuf,
    /// JSON file reporting interval (bare numbers are milliseconds).
    pub json_file_interval: String,
    /// Log reporter interval (bare numbers use `log_frequency_unit`).
    pub log_frequency: String,
    /// Level of the log reporter's lines.
    pub log_level: String,
    /// Unit of a bare number in `log_frequency` (seconds if unset).
    pub log_frequency_unit: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            reporters: "JSON_FILE,JMX".to_string(),
            json_file_location: std::env::temp_dir().join("report.json"),
            json_file_interval: "5s".to_string(),
            log_frequency: "5m".to_string(),
            log_level: "INFO".to_string(),
            log_frequency_unit: None,
        }
    }
}

impl MetricsConfig {
    /// Load metrics configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load metrics configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read metrics config {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("failed to parse metrics config {}", path.display()))
    }

    /// Save metrics configuration to JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write metrics config {}", path.display()))?;
        Ok(())
    }

    /// Sets the reporter list.
    pub fn with_reporters(mut self, reporters: impl Into<String>) -> Self {
        self.reporters = reporters.into();
        self
    }

    /// Sets the JSON report path.
    pub fn with_json_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_file_location = path.into();
        self
    }

    /// Sets the JSON reporting interval.
    pub fn with_json_interval(mut self, interval: impl Into<String>) -> Self {
        self.json_file_interval = interval.into();
        self
    }

    /// Sets the log reporting interval.
    pub fn with_log_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.log_frequency = frequency.into();
        self
    }

    /// Sets the log reporter level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Sets the unit of a bare number in the log frequency.
    pub fn with_log_frequency_unit(mut self, unit: impl Into<String>) -> Self {
        self.log_frequency_unit = Some(unit.into());
        self
    }

    /// Parses the reporter list, in order, without duplicates. Empty entries
    /// are ignored.
    pub fn reporter_kinds(&self) -> MetricsResult<Vec<ReporterKind>> {
        let mut kinds = Vec::new();
        for entry in self.reporters.split(',').map(str::trim) {
            if entry.is_empty() {
                continue;
            }
            let kind = ReporterKind::from_str(entry)?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    /// Returns the JSON reporting interval.
    pub fn json_interval(&self) -> MetricsResult<Duration> {
        parse_time(&self.json_file_interval, TimeUnit::Milliseconds)
    }

    /// Returns the log reporting interval.
    pub fn log_interval(&self) -> MetricsResult<Duration> {
        let unit = match &self.log_frequency_unit {
            Some(unit) => TimeUnit::from_str(unit)?,
            None => TimeUnit::Seconds,
        };
        parse_time(&self.log_frequency, unit)
    }

    /// Returns the log reporter level.
    pub fn log_level(&self) -> MetricsResult<log::Level> {
        log::Level::from_str(self.log_level.trim()).map_err(|_| {
            MetricsError::InvalidConfiguration(format!("unknown log level '{}'", self.log_level))
        })
    }

    /// Checks every field the selected reporters will read.
    pub fn validate(&self) -> MetricsResult<()> {
        for kind in self.reporter_kinds()? {
            match kind {
                ReporterKind::JsonFile => {
                    self.json_interval()?;
                }
                ReporterKind::Slf4j => {
                    self.log_interval()?;
                    self.log_level()?;
                }
                ReporterKind::Jmx => {}
            }
        }
        Ok(())
    }
}

/// Units accepted in time strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    /// `ns`
    Nanoseconds,
    /// `us`
    Microseconds,
    /// `ms`
    Milliseconds,
    /// `s`, `sec`, `seconds`
    Seconds,
    /// `m`, `min`, `minutes`
    Minutes,
    /// `h`, `hours`
    Hours,
    /// `d`, `days`
    Days,
}

impl TimeUnit {
    fn duration(self, amount: u64) -> Option<Duration> {
        let secs = |factor: u64| amount.checked_mul(factor).map(Duration::from_secs);
        match self {
            TimeUnit::Nanoseconds => Some(Duration::from_nanos(amount)),
            TimeUnit::Microseconds => Some(Duration::from_micros(amount)),
            TimeUnit::Milliseconds => Some(Duration::from_millis(amount)),
            TimeUnit::Seconds => secs(1),
            TimeUnit::Minutes => secs(60),
            TimeUnit::Hours => secs(3_600),
            TimeUnit::Days => secs(86_400),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ns" | "nanos" | "nanoseconds" => Ok(TimeUnit::Nanoseconds),
            "us" | "micros" | "microseconds" => Ok(TimeUnit::Microseconds),
            "ms" | "millis" | "milliseconds" => Ok(TimeUnit::Milliseconds),
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(TimeUnit::Seconds),
            "m" | "min" | "mins" | "minute" | "minutes" => Ok(TimeUnit::Minutes),
            "h" | "hour" | "hours" => Ok(TimeUnit::Hours),
            "d" | "day" | "days" => Ok(TimeUnit::Days),
            other => Err(MetricsError::InvalidConfiguration(format!(
                "unknown time unit '{other}'"
            ))),
        }
    }
}

/// Parses a positive time string such as `"100ms"`, `"5 s"` or `"300"`.
///
/// A bare number is read in `default_unit`.
pub fn parse_time(value: &str, default_unit: TimeUnit) -> MetricsResult<Duration> {
    let invalid = |reason: &str| {
        MetricsError::InvalidConfiguration(format!("invalid time value '{value}': {reason}"))
    };
    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(invalid("missing amount"));
    }
    let amount: u64 = digits.parse().map_err(|_| invalid("amount out of range"))?;
    let unit = match unit.trim() {
        "" => default_unit,
        unit => TimeUnit::from_str(unit)?,
    };
    let duration = unit
        .duration(amount)
        .ok_or_else(|| invalid("amount out of range"))?;
    if duration.is_zero() {
        return Err(invalid("must be greater than zero"));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MetricsConfig::default();
        assert_eq!(
            config.reporter_kinds().unwrap(),
            vec![ReporterKind::JsonFile, ReporterKind::Jmx]
        );
        assert_eq!(config.json_interval().unwrap(), Duration::from_secs(5));
        assert_eq!(config.log_interval().unwrap(), Duration::from_secs(300));
        assert_eq!(config.log_level().unwrap(), log::Level::Info);
        assert!(config.json_file_location.ends_with("report.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let json = r#"
        {
            "reporters": "json-file, slf4j, JSON_FILE",
            "json_file_interval": "100ms",
            "log_level": "debug"
        }"#;

        let config = MetricsConfig::from_json(json).unwrap();
        assert_eq!(
            config.reporter_kinds().unwrap(),
            vec![ReporterKind::JsonFile, ReporterKind::Slf4j]
        );
        assert_eq!(config.json_interval().unwrap(), Duration::from_millis(100));
        assert_eq!(config.log_level().unwrap(), log::Level::Debug);
        assert_eq!(config.log_frequency, "5m");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let config = MetricsConfig::default()
            .with_reporters("SLF4J")
            .with_log_frequency("1")
            .with_log_frequency_unit("s");

        config.to_file(&path).unwrap();
        let loaded = MetricsConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.log_interval().unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = MetricsConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("failed to read metrics config"));
    }

    #[test]
    fn test_parse_time_units() {
        let ms = TimeUnit::Milliseconds;
        assert_eq!(parse_time("250", ms).unwrap(), Duration::from_millis(250));
        assert_eq!(parse_time("7ns", ms).unwrap(), Duration::from_nanos(7));
        assert_eq!(parse_time("3us", ms).unwrap(), Duration::from_micros(3));
        assert_eq!(parse_time("2 sec", ms).unwrap(), Duration::from_secs(2));
        assert_eq!(parse_time("5m", ms).unwrap(), Duration::from_secs(300));
        assert_eq!(parse_time("1h", ms).unwrap(), Duration::from_secs(3_600));
        assert_eq!(parse_time("2days", ms).unwrap(), Duration::from_secs(172_800));
        assert_eq!(
            parse_time("30", TimeUnit::Minutes).unwrap(),
            Duration::from_secs(1_800)
        );
    }

    #[test]
    fn test_parse_time_rejects_bad_values() {
        for value in ["", "0", "0s", "abc", "-5s", "5 fortnights", "1.5s"] {
            assert!(
                matches!(
                    parse_time(value, TimeUnit::Seconds),
                    Err(MetricsError::InvalidConfiguration(_))
                ),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_only_checks_selected_reporters() {
        let config = MetricsConfig::default()
            .with_reporters("JMX")
            .with_log_level("loud");
        assert!(config.validate().is_ok());

        let config = config.with_reporters("JMX,SLF4J");
        assert!(matches!(
            config.validate(),
            Err(MetricsError::InvalidConfiguration(_))
        ));
        assert!(MetricsConfig::default()
            .with_reporters("JMX,CSV")
            .validate()
            .is_err());
    }
}
