//! Learning-history engine
//!
//! Layers, each calling down into the previous one:
//! - Identity Resolver - which spellings name the same concept
//! - Retention Scheduler - due dates, intervals and easiness
//! - History Record Updater - appends or suppresses one graded attempt
//! - Occurrence Reconciler - commits one answer across duplicate occurrences

pub mod identity;
pub mod reconciler;
pub mod scheduler;
pub mod stats;
pub mod store;
pub mod types;
pub mod updater;

pub use reconciler::{
    answers_to, choose, judging_contexts, CommitOptions, CommitOutcome, JudgingContext,
    OccurrenceReconciler,
};
pub use scheduler::{correct_streak, quality_from_response, RetentionScheduler, Schedule, SchedulerConfig};
pub use stats::{summarize, NotebookStats};
pub use store::{HistoryBook, NotebookHistory, SceneHistory};
pub use types::*;
pub use updater::{has_correct_answer, Attempt, HistoryUpdater, UpdateOutcome};

use crate::error::EngineResult;

/// Builds the full engine stack from a scheduler configuration.
pub fn engine(config: SchedulerConfig) -> EngineResult<OccurrenceReconciler> {
    let scheduler = RetentionScheduler::new(config)?;
    Ok(OccurrenceReconciler::new(HistoryUpdater::new(scheduler)))
}
