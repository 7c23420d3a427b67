//! Occurrence Reconciler
//!
//! The same expression may appear in several scenes. Each appearance is its
//! own exposure: one answer is judged against the contexts of every pending
//! appearance, but only the appearance that earned the verdict is committed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::identity;
use super::scheduler::{validate_quality, MAX_QUALITY};
use super::store::HistoryBook;
use super::types::{Direction, GradedAnswer, Occurrence, QuizKind};
use super::updater::{Attempt, HistoryUpdater, UpdateOutcome};
use crate::error::{EngineError, EngineResult};

/// One example context offered to the judge, tagged with the pending
/// occurrence it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgingContext {
    pub occurrence_index: usize,
    pub text: String,
    pub usage_form: String,
}

/// Caller-side settings for committing an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOptions {
    pub direction: Direction,
    pub quiz_kind: QuizKind,
    pub is_known_word: bool,
    pub always_record: bool,
    pub response_time_ms: i64,
    pub graded_on: NaiveDate,
}

impl CommitOptions {
    pub fn new(direction: Direction, quiz_kind: QuizKind, graded_on: NaiveDate) -> Self {
        Self {
            direction,
            quiz_kind,
            is_known_word: false,
            // Fixed-deck drills are exhaustive and keep every attempt.
            always_record: quiz_kind == QuizKind::Flashcard,
            response_time_ms: 0,
            graded_on,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    pub occurrence_index: usize,
    pub correct: bool,
    pub update: UpdateOutcome,
}

/// True when the learner's typed word names this occurrence: either surface
/// form, or the inflected usage of one of its contexts.
pub fn answers_to(occurrence: &Occurrence, typed: &str) -> bool {
    identity::matches(&occurrence.forms, typed)
        || occurrence
            .contexts
            .iter()
            .any(|context| identity::matches_usage(&context.usage_form, typed))
}

#[derive(Debug, Clone, Default)]
pub struct OccurrenceReconciler {
    updater: HistoryUpdater,
}

impl OccurrenceReconciler {
    pub fn new(updater: HistoryUpdater) -> Self {
        Self { updater }
    }

    pub fn updater(&self) -> &HistoryUpdater {
        &self.updater
    }

    /// Mastered means the resolved record's newest attempt was correct and
    /// its review date has not arrived.
    pub fn is_mastered(
        &self,
        book: &HistoryBook,
        occurrence: &Occurrence,
        direction: Direction,
        today: NaiveDate,
    ) -> bool {
        match book.resolve(occurrence, direction) {
            Some(history) => !self
                .updater
                .scheduler()
                .is_due(history.log(direction), today),
            None => false,
        }
    }

    /// Occurrences of `typed` that have no history yet or are due.
    pub fn needs_learning<'o>(
        &self,
        book: &HistoryBook,
        occurrences: &'o [Occurrence],
        typed: &str,
        direction: Direction,
        today: NaiveDate,
    ) -> Vec<&'o Occurrence> {
        occurrences
            .iter()
            .filter(|occurrence| answers_to(occurrence, typed))
            .filter(|occurrence| !self.is_mastered(book, occurrence, direction, today))
            .collect()
    }

    /// Per-occurrence mastery flags, in input order.
    pub fn mastery(
        &self,
        book: &HistoryBook,
        occurrences: &[Occurrence],
        direction: Direction,
        today: NaiveDate,
    ) -> Vec<bool> {
        occurrences
            .iter()
            .map(|occurrence| self.is_mastered(book, occurrence, direction, today))
            .collect()
    }

    pub fn commit<O: AsRef<Occurrence>>(
        &self,
        book: &mut HistoryBook,
        pending: &[O],
        chosen_index: usize,
        answer: &GradedAnswer,
        options: &CommitOptions,
    ) -> EngineResult<CommitOutcome> {
        let occurrence = pending
            .get(chosen_index)
            .ok_or(EngineError::IndexOutOfRange {
                index: chosen_index,
                len: pending.len(),
            })?
            .as_ref();

        let accepted = answer.context_verdicts.iter().find(|verdict| {
            verdict.correct
                && occurrence
                    .contexts
                    .iter()
                    .any(|context| context.text == verdict.context)
        });
        let (correct, quality) = match accepted {
            Some(verdict) => (true, verdict.quality),
            None => (answer.correct, answer.quality),
        };
        let quality = validate_quality(quality)?;
        // Fast correct recalls are graded as effortless.
        let quality = if self.updater.scheduler().quality_for(correct, options.response_time_ms)
            == MAX_QUALITY
        {
            MAX_QUALITY
        } else {
            quality
        };

        let attempt = Attempt {
            correct,
            quality,
            is_known_word: options.is_known_word,
            always_record: options.always_record,
            quiz_kind: options.quiz_kind,
            response_time_ms: options.response_time_ms,
            graded_on: options.graded_on,
        };
        let update = book.record_attempt(&self.updater, occurrence, options.direction, &attempt)?;

        tracing::info!(
            notebook = %occurrence.notebook_id,
            scene = occurrence.scene.as_deref().unwrap_or("-"),
            expression = %update.history.expression,
            correct,
            quality,
            appended = update.is_appended(),
            "answer committed"
        );

        Ok(CommitOutcome {
            occurrence_index: chosen_index,
            correct,
            update,
        })
    }

    /// Picks the verdict owner and commits it in one step.
    pub fn reconcile<O: AsRef<Occurrence>>(
        &self,
        book: &mut HistoryBook,
        pending: &[O],
        answer: &GradedAnswer,
        options: &CommitOptions,
    ) -> EngineResult<CommitOutcome> {
        let index = choose(pending, answer);
        self.commit(book, pending, index, answer, options)
    }
}

/// Union of the example contexts of all pending occurrences. A context text
/// shared by several occurrences is offered once, owned by the first.
pub fn judging_contexts<O: AsRef<Occurrence>>(pending: &[O]) -> Vec<JudgingContext> {
    let mut contexts: Vec<JudgingContext> = Vec::new();
    for (index, occurrence) in pending.iter().enumerate() {
        for context in &occurrence.as_ref().contexts {
            if contexts.iter().any(|seen| seen.text == context.text) {
                continue;
            }
            contexts.push(JudgingContext {
                occurrence_index: index,
                text: context.text.clone(),
                usage_form: context.usage_form.clone(),
            });
        }
    }
    contexts
}

/// Index of the occurrence to commit: the first one owning a context the
/// judge accepted; otherwise the first pending occurrence, whether the
/// answer was correct without context or wrong.
pub fn choose<O: AsRef<Occurrence>>(pending: &[O], answer: &GradedAnswer) -> usize {
    answer
        .context_verdicts
        .iter()
        .filter(|verdict| verdict.correct)
        .find_map(|verdict| {
            pending.iter().position(|occurrence| {
                occurrence
                    .as_ref()
                    .contexts
                    .iter()
                    .any(|context| context.text == verdict.context)
            })
        })
        .unwrap_or(0)
}

impl AsRef<Occurrence> for Occurrence {
    fn as_ref(&self) -> &Occurrence {
        self
    }
}
