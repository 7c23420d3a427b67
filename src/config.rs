use std::path::PathBuf;

use crate::history::SchedulerConfig;
use crate::logging::LogSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub logging: LogSettings,
    pub scheduler: SchedulerConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable or invalid values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = SchedulerConfig::default();

        let base_intervals = lookup("LEARNING_BASE_INTERVALS")
            .and_then(|value| parse_intervals(&value))
            .unwrap_or_else(|| defaults.base_intervals.clone());

        let max_interval_days = lookup("LEARNING_MAX_INTERVAL_DAYS")
            .and_then(|value| value.trim().parse::<i64>().ok())
            .unwrap_or(defaults.max_interval_days);

        let fast_response_ms = lookup("LEARNING_FAST_RESPONSE_MS")
            .and_then(|value| value.trim().parse::<i64>().ok())
            .unwrap_or(defaults.fast_response_ms);

        let file_logs = lookup("ENABLE_FILE_LOGS").is_some_and(|v| v == "true" || v == "1");
        let logging = LogSettings {
            filter: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            file_dir: file_logs.then(|| {
                PathBuf::from(lookup("LOG_DIR").unwrap_or_else(|| "./logs".to_string()))
            }),
        };

        let scheduler = SchedulerConfig {
            base_intervals,
            max_interval_days,
            fast_response_ms,
            ..defaults
        };
        let scheduler = match scheduler.validate() {
            Ok(()) => scheduler,
            Err(err) => {
                tracing::warn!(error = %err, "scheduler overrides rejected, using defaults");
                SchedulerConfig::default()
            }
        };

        Self { logging, scheduler }
    }
}

fn parse_intervals(value: &str) -> Option<Vec<i64>> {
    let days = value
        .split(',')
        .map(|part| part.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    if days.is_empty() {
        None
    } else {
        Some(days)
    }
}
