//! History Record Updater
//!
//! Applies one graded attempt to one concept. Repeating the newest status is
//! suppressed unless the quiz kind asks for every attempt to be recorded.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::scheduler::{validate_quality, RetentionScheduler};
use super::types::{AttemptRecord, ConceptHistory, Direction, LearnedStatus, QuizKind};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub correct: bool,
    pub quality: i32,
    pub is_known_word: bool,
    /// Fixed-deck drills record every attempt, even a repeated status.
    pub always_record: bool,
    pub quiz_kind: QuizKind,
    pub response_time_ms: i64,
    pub graded_on: NaiveDate,
}

impl Attempt {
    pub fn new(correct: bool, quality: i32, quiz_kind: QuizKind, graded_on: NaiveDate) -> Self {
        Self {
            correct,
            quality,
            is_known_word: false,
            always_record: false,
            quiz_kind,
            response_time_ms: 0,
            graded_on,
        }
    }

    pub fn known_word(mut self, is_known_word: bool) -> Self {
        self.is_known_word = is_known_word;
        self
    }

    pub fn always_record(mut self, always_record: bool) -> Self {
        self.always_record = always_record;
        self
    }

    pub fn response_time(mut self, response_time_ms: i64) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    pub fn status(&self) -> LearnedStatus {
        LearnedStatus::derive(self.correct, self.is_known_word)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub history: ConceptHistory,
    /// The record inserted at the head of the log, if any.
    pub appended: Option<AttemptRecord>,
    pub status: LearnedStatus,
}

impl UpdateOutcome {
    pub fn is_appended(&self) -> bool {
        self.appended.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryUpdater {
    scheduler: RetentionScheduler,
}

impl HistoryUpdater {
    pub fn new(scheduler: RetentionScheduler) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &RetentionScheduler {
        &self.scheduler
    }

    /// Returns the updated history; the input is left untouched.
    pub fn apply(
        &self,
        history: &ConceptHistory,
        direction: Direction,
        attempt: &Attempt,
    ) -> EngineResult<UpdateOutcome> {
        validate_quality(attempt.quality)?;
        let status = attempt.status();
        let log = history.log(direction);

        if !attempt.always_record && log.first().is_some_and(|latest| latest.status == status) {
            tracing::debug!(
                expression = %history.expression,
                status = %status,
                ?direction,
                "status unchanged, attempt not recorded"
            );
            return Ok(UpdateOutcome {
                history: history.clone(),
                appended: None,
                status,
            });
        }

        let schedule = self.scheduler.schedule(log, attempt.quality)?;
        let record = AttemptRecord {
            status,
            graded_at: attempt.graded_on,
            quality: attempt.quality,
            response_time_ms: attempt.response_time_ms,
            quiz_kind: attempt.quiz_kind,
            interval_days: schedule.interval_days,
            easiness_factor: schedule.easiness_factor,
        };

        let mut updated = history.clone();
        updated.log_mut(direction).insert(0, record.clone());

        tracing::debug!(
            expression = %updated.expression,
            status = %status,
            interval_days = record.interval_days,
            easiness = record.easiness_factor,
            ?direction,
            "attempt recorded"
        );

        Ok(UpdateOutcome {
            history: updated,
            appended: Some(record),
            status,
        })
    }

    /// First attempt for a concept with no history yet.
    pub fn create(
        &self,
        expression: &str,
        direction: Direction,
        attempt: &Attempt,
    ) -> EngineResult<UpdateOutcome> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(EngineError::EmptyExpression);
        }
        self.apply(&ConceptHistory::new(expression), direction, attempt)
    }
}

/// Whether the newest attempt in `direction` was a correct recall. An empty
/// log is "never attempted" and never counts.
pub fn has_correct_answer(history: &ConceptHistory, direction: Direction) -> bool {
    history
        .latest(direction)
        .is_some_and(|latest| latest.status.is_mastered())
}
