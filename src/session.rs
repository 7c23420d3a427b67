//! Session-scoped state for one quiz run
//!
//! A `LearningSession` owns the history book and the occurrences scanned for
//! this session; nothing lives in globals. `SharedSession` is the server
//! shape: the mutex guards the book, never the judge round-trip.

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::history::{
    choose, judging_contexts, CommitOptions, CommitOutcome, Direction, GradedAnswer, HistoryBook,
    JudgingContext, Occurrence, OccurrenceReconciler,
};

pub type JudgeError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("judge failed: {0}")]
    Judge(#[source] JudgeError),
}

/// What the judge receives for one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeRequest {
    pub expression: String,
    pub answer: String,
    pub direction: Direction,
    pub contexts: Vec<JudgingContext>,
}

/// Grades free-form answers. Retries and timeouts belong to implementors.
pub trait AnswerJudge {
    fn judge(&self, request: &JudgeRequest) -> Result<GradedAnswer, JudgeError>;
}

impl<F> AnswerJudge for F
where
    F: Fn(&JudgeRequest) -> Result<GradedAnswer, JudgeError>,
{
    fn judge(&self, request: &JudgeRequest) -> Result<GradedAnswer, JudgeError> {
        self(request)
    }
}

/// Snapshot of the pending occurrences taken before the judge call.
#[derive(Debug, Clone)]
pub struct PreparedAnswer {
    pub pending: Vec<Occurrence>,
    pub request: JudgeRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// Every occurrence of the typed word is mastered and not yet due.
    NothingPending,
    Committed(CommitOutcome),
}

pub struct LearningSession {
    id: Uuid,
    book: HistoryBook,
    occurrences: Vec<Occurrence>,
    engine: OccurrenceReconciler,
}

impl LearningSession {
    pub fn new(book: HistoryBook, occurrences: Vec<Occurrence>, engine: OccurrenceReconciler) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, occurrences = occurrences.len(), "learning session opened");
        Self {
            id,
            book,
            occurrences,
            engine,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn book(&self) -> &HistoryBook {
        &self.book
    }

    pub fn into_book(self) -> HistoryBook {
        self.book
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn pending(&self, typed: &str, direction: Direction, today: NaiveDate) -> Vec<&Occurrence> {
        self.engine
            .needs_learning(&self.book, &self.occurrences, typed, direction, today)
    }

    pub fn mastery(&self, direction: Direction, today: NaiveDate) -> Vec<bool> {
        self.engine
            .mastery(&self.book, &self.occurrences, direction, today)
    }

    /// `None` when nothing needs learning for `typed`.
    pub fn prepare(
        &self,
        typed: &str,
        answer: &str,
        direction: Direction,
        today: NaiveDate,
    ) -> Option<PreparedAnswer> {
        let pending: Vec<Occurrence> = self
            .pending(typed, direction, today)
            .into_iter()
            .cloned()
            .collect();
        if pending.is_empty() {
            return None;
        }
        let request = JudgeRequest {
            expression: typed.trim().to_string(),
            answer: answer.to_string(),
            direction,
            contexts: judging_contexts(&pending),
        };
        Some(PreparedAnswer { pending, request })
    }

    pub fn commit(
        &mut self,
        prepared: &PreparedAnswer,
        graded: &GradedAnswer,
        options: &CommitOptions,
    ) -> Result<CommitOutcome, SessionError> {
        let outcome = self
            .engine
            .reconcile(&mut self.book, &prepared.pending, graded, options)?;
        Ok(outcome)
    }

    /// Interactive loop shape: prepare, judge, commit, all on this thread.
    pub fn answer(
        &mut self,
        judge: &dyn AnswerJudge,
        typed: &str,
        answer: &str,
        options: &CommitOptions,
    ) -> Result<AnswerOutcome, SessionError> {
        let Some(prepared) = self.prepare(typed, answer, options.direction, options.graded_on) else {
            return Ok(AnswerOutcome::NothingPending);
        };
        let graded = judge.judge(&prepared.request).map_err(|err| {
            tracing::warn!(session = %self.id, expression = %typed, error = %err, "judge call failed");
            SessionError::Judge(err)
        })?;
        self.commit(&prepared, &graded, options)
            .map(AnswerOutcome::Committed)
    }
}

#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<LearningSession>>,
}

impl SharedSession {
    pub fn new(session: LearningSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&LearningSession) -> R) -> R {
        let guard = self.inner.lock();
        f(&guard)
    }

    /// Same as [`LearningSession::answer`], but the lock is released while
    /// the judge runs so other requests on this session are not serialized
    /// behind it. An occurrence that another request mastered in the
    /// meantime is not committed twice.
    pub fn answer(
        &self,
        judge: &dyn AnswerJudge,
        typed: &str,
        answer: &str,
        options: &CommitOptions,
    ) -> Result<AnswerOutcome, SessionError> {
        let prepared = {
            let session = self.inner.lock();
            session.prepare(typed, answer, options.direction, options.graded_on)
        };
        let Some(prepared) = prepared else {
            return Ok(AnswerOutcome::NothingPending);
        };

        let graded = judge.judge(&prepared.request).map_err(SessionError::Judge)?;

        let mut session = self.inner.lock();
        let chosen = prepared.pending.get(choose(&prepared.pending, &graded));
        let settled = chosen.is_some_and(|occurrence| {
            session
                .engine
                .is_mastered(&session.book, occurrence, options.direction, options.graded_on)
        });
        if settled {
            tracing::debug!(
                session = %session.id,
                expression = %prepared.request.expression,
                "occurrence mastered while judging, answer dropped"
            );
            return Ok(AnswerOutcome::NothingPending);
        }
        session
            .commit(&prepared, &graded, options)
            .map(AnswerOutcome::Committed)
    }

    pub fn into_inner(self) -> Option<LearningSession> {
        Arc::try_unwrap(self.inner).ok().map(Mutex::into_inner)
    }
}
