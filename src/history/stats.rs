use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::scheduler::RetentionScheduler;
use super::store::HistoryBook;
use super::types::{Direction, LearnedStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookStats {
    /// Records in the notebook, attempted or not
    pub total: usize,
    pub attempted: usize,
    /// Newest attempt correct and not yet due
    pub mastered: usize,
    pub misunderstood: usize,
    /// Attempted records whose review date has arrived
    pub due: usize,
}

pub fn summarize(
    book: &HistoryBook,
    scheduler: &RetentionScheduler,
    direction: Direction,
    today: NaiveDate,
) -> BTreeMap<String, NotebookStats> {
    book.notebooks()
        .map(|(notebook_id, notebook)| {
            let mut stats = NotebookStats::default();
            for history in notebook.concepts() {
                stats.total += 1;
                let log = history.log(direction);
                let Some(latest) = log.first() else {
                    continue;
                };
                stats.attempted += 1;
                if latest.status == LearnedStatus::Misunderstood {
                    stats.misunderstood += 1;
                }
                if scheduler.is_due(log, today) {
                    stats.due += 1;
                } else {
                    stats.mastered += 1;
                }
            }
            (notebook_id.to_string(), stats)
        })
        .collect()
}
