//! Retention Scheduler
//!
//! SM-2 style easiness update with a bootstrap table for legacy records that
//! never stored an interval:
//!
//! EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3
//!
//! A record whose `interval_days` is zero falls back to the table, indexed by
//! the current run of correct answers.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::types::{AttemptRecord, DEFAULT_EASINESS_FACTOR, MIN_EASINESS_FACTOR};
use crate::error::{EngineError, EngineResult};

const DEFAULT_BASE_INTERVALS: [i64; 6] = [0, 3, 7, 18, 40, 90];
const DEFAULT_MAX_INTERVAL_DAYS: i64 = 5 * 365;
const DEFAULT_FAST_RESPONSE_MS: i64 = 3000;

pub const MIN_QUALITY: i32 = 1;
pub const MAX_QUALITY: i32 = 5;
/// Below this the attempt counts as a failed recall.
pub const PASSING_QUALITY: i32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Days until the next review for a streak of `n` correct answers; the
    /// last entry repeats for longer streaks.
    pub base_intervals: Vec<i64>,
    pub initial_easiness: f64,
    pub min_easiness: f64,
    pub max_interval_days: i64,
    /// Correct answers faster than this are graded quality 5.
    pub fast_response_ms: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_intervals: DEFAULT_BASE_INTERVALS.to_vec(),
            initial_easiness: DEFAULT_EASINESS_FACTOR,
            min_easiness: MIN_EASINESS_FACTOR,
            max_interval_days: DEFAULT_MAX_INTERVAL_DAYS,
            fast_response_ms: DEFAULT_FAST_RESPONSE_MS,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.base_intervals.is_empty() {
            return Err(EngineError::InvalidIntervalTable("table is empty".to_string()));
        }
        if self.base_intervals.iter().any(|days| *days < 0) {
            return Err(EngineError::InvalidIntervalTable(
                "intervals must not be negative".to_string(),
            ));
        }
        if self.base_intervals.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(EngineError::InvalidIntervalTable(format!(
                "intervals must be non-decreasing: {:?}",
                self.base_intervals
            )));
        }
        if self.max_interval_days <= 0 {
            return Err(EngineError::InvalidIntervalTable(format!(
                "max interval must be positive, got {}",
                self.max_interval_days
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub interval_days: i64,
    pub easiness_factor: f64,
}

pub fn validate_quality(quality: i32) -> EngineResult<i32> {
    if (MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        Ok(quality)
    } else {
        Err(EngineError::InvalidQuality(quality))
    }
}

/// 1 for a wrong answer, 5 for a correct answer under `fast_response_ms`,
/// 4 otherwise.
pub fn quality_from_response(correct: bool, response_time_ms: i64, fast_response_ms: i64) -> i32 {
    if !correct {
        return MIN_QUALITY;
    }
    if response_time_ms > 0 && response_time_ms < fast_response_ms {
        MAX_QUALITY
    } else {
        4
    }
}

/// Consecutive correct records counted from the newest one.
pub fn correct_streak(log: &[AttemptRecord]) -> usize {
    log.iter()
        .take_while(|record| record.status.is_mastered())
        .count()
}

#[derive(Debug, Clone)]
pub struct RetentionScheduler {
    config: SchedulerConfig,
}

impl Default for RetentionScheduler {
    fn default() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }
}

impl RetentionScheduler {
    pub fn new(config: SchedulerConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn base_interval(&self, streak: usize) -> i64 {
        let table = &self.config.base_intervals;
        match table.get(streak) {
            Some(days) => *days,
            None => table.last().copied().unwrap_or(0),
        }
    }

    pub fn quality_for(&self, correct: bool, response_time_ms: i64) -> i32 {
        quality_from_response(correct, response_time_ms, self.config.fast_response_ms)
    }

    /// Next interval and easiness for an attempt appended on top of `log`.
    pub fn schedule(&self, log: &[AttemptRecord], quality: i32) -> EngineResult<Schedule> {
        let quality = validate_quality(quality)?;

        let Some(previous) = log.first() else {
            return Ok(Schedule {
                interval_days: self.base_interval(0),
                easiness_factor: self.config.initial_easiness,
            });
        };

        let miss = f64::from(MAX_QUALITY - quality);
        let easiness = (previous.easiness_factor + (0.1 - miss * (0.08 + miss * 0.02)))
            .max(self.config.min_easiness);

        let interval = if quality < PASSING_QUALITY {
            self.base_interval(0)
        } else if previous.interval_days > 0 {
            let grown = (previous.interval_days as f64 * easiness).round() as i64;
            grown.min(self.config.max_interval_days)
        } else {
            self.base_interval(correct_streak(log))
        };

        Ok(Schedule {
            interval_days: interval,
            easiness_factor: easiness,
        })
    }

    /// Interval in effect for the newest record, bootstrapping legacy
    /// records from the streak. Persisted intervals are capped at
    /// `max_interval_days`.
    pub fn effective_interval(&self, log: &[AttemptRecord]) -> i64 {
        let days = match log.first() {
            Some(latest) if latest.interval_days > 0 => latest.interval_days,
            Some(_) => self.base_interval(correct_streak(log)),
            None => 0,
        };
        days.clamp(0, self.config.max_interval_days)
    }

    /// `None` when the log is due regardless of the date: never attempted,
    /// or the newest attempt was not a correct recall.
    pub fn due_date(&self, log: &[AttemptRecord]) -> Option<NaiveDate> {
        let latest = log.first()?;
        if !latest.status.is_mastered() {
            return None;
        }
        let interval = Days::new(self.effective_interval(log).unsigned_abs());
        // Past the end of the calendar means never due.
        Some(
            latest
                .graded_at
                .checked_add_days(interval)
                .unwrap_or(NaiveDate::MAX),
        )
    }

    pub fn is_due(&self, log: &[AttemptRecord], today: NaiveDate) -> bool {
        match self.due_date(log) {
            Some(due) => today >= due,
            None => true,
        }
    }
}

/// Day-precision "today" in UTC.
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
