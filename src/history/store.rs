//! In-memory learning-history collection
//!
//! Flashcard notebooks keep a flat list of concepts; story notebooks nest them
//! by scene. The book is a plain value: callers load it, hand it to the
//! engine and persist whatever comes back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::identity;
use super::types::{ConceptHistory, Direction, Occurrence};
use super::updater::{Attempt, HistoryUpdater, UpdateOutcome};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneHistory {
    pub scene: String,
    #[serde(default)]
    pub expressions: Vec<ConceptHistory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NotebookHistory {
    Story {
        #[serde(default)]
        scenes: Vec<SceneHistory>,
    },
    Flashcard {
        #[serde(default)]
        expressions: Vec<ConceptHistory>,
    },
}

impl NotebookHistory {
    pub fn story() -> Self {
        NotebookHistory::Story { scenes: Vec::new() }
    }

    pub fn flashcard() -> Self {
        NotebookHistory::Flashcard {
            expressions: Vec::new(),
        }
    }

    pub fn concepts(&self) -> Box<dyn Iterator<Item = &ConceptHistory> + '_> {
        match self {
            NotebookHistory::Story { scenes } => {
                Box::new(scenes.iter().flat_map(|scene| scene.expressions.iter()))
            }
            NotebookHistory::Flashcard { expressions } => Box::new(expressions.iter()),
        }
    }

    /// Flashcard notebooks ignore the scene.
    pub fn expressions(&self, scene: Option<&str>) -> &[ConceptHistory] {
        match (self, scene) {
            (NotebookHistory::Flashcard { expressions }, _) => expressions,
            (NotebookHistory::Story { scenes }, Some(scene)) => scenes
                .iter()
                .find(|entry| entry.scene == scene)
                .map(|entry| entry.expressions.as_slice())
                .unwrap_or(&[]),
            (NotebookHistory::Story { .. }, None) => &[],
        }
    }

    fn expressions_mut(
        &mut self,
        notebook_id: &str,
        scene: Option<&str>,
    ) -> EngineResult<&mut Vec<ConceptHistory>> {
        match (self, scene) {
            (NotebookHistory::Flashcard { expressions }, _) => Ok(expressions),
            (NotebookHistory::Story { scenes }, Some(scene)) => {
                let index = match scenes.iter().position(|entry| entry.scene == scene) {
                    Some(index) => index,
                    None => {
                        scenes.push(SceneHistory {
                            scene: scene.to_string(),
                            expressions: Vec::new(),
                        });
                        scenes.len() - 1
                    }
                };
                Ok(&mut scenes[index].expressions)
            }
            (NotebookHistory::Story { .. }, None) => {
                Err(EngineError::MissingScene(notebook_id.to_string()))
            }
        }
    }
}

/// Where a write for an occurrence lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteTarget {
    Existing(usize),
    New,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryBook {
    notebooks: BTreeMap<String, NotebookHistory>,
}

impl HistoryBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_notebook(&mut self, notebook_id: impl Into<String>, notebook: NotebookHistory) {
        self.notebooks.insert(notebook_id.into(), notebook);
    }

    pub fn notebook(&self, notebook_id: &str) -> Option<&NotebookHistory> {
        self.notebooks.get(notebook_id)
    }

    pub fn notebooks(&self) -> impl Iterator<Item = (&str, &NotebookHistory)> {
        self.notebooks.iter().map(|(id, notebook)| (id.as_str(), notebook))
    }

    pub fn is_empty(&self) -> bool {
        self.notebooks.is_empty()
    }

    fn location(&self, occurrence: &Occurrence) -> &[ConceptHistory] {
        self.notebook(&occurrence.notebook_id)
            .map(|notebook| notebook.expressions(occurrence.scene.as_deref()))
            .unwrap_or(&[])
    }

    /// Records at the occurrence's location whose key names the same concept.
    pub fn candidates<'a, 'o>(
        &'a self,
        occurrence: &'o Occurrence,
    ) -> impl Iterator<Item = &'a ConceptHistory> + 'o
    where
        'a: 'o,
    {
        self.location(occurrence)
            .iter()
            .filter(move |history| identity::key_matches(&history.expression, &occurrence.forms))
    }

    /// The record that speaks for this occurrence in `direction`.
    ///
    /// Empty logs never shadow an attempted sibling: among attempted records
    /// the one graded most recently wins, the canonical key breaking ties.
    pub fn resolve<'a>(
        &'a self,
        occurrence: &Occurrence,
        direction: Direction,
    ) -> Option<&'a ConceptHistory> {
        let mut best: Option<&'a ConceptHistory> = None;
        for history in self.candidates(occurrence) {
            let Some(latest) = history.latest(direction) else {
                continue;
            };
            best = match best {
                None => Some(history),
                Some(current) => {
                    let current_date = current.latest(direction).map(|r| r.graded_at);
                    if Some(latest.graded_at) > current_date
                        || (Some(latest.graded_at) == current_date
                            && identity::is_canonical_key(&history.expression, &occurrence.forms))
                    {
                        Some(history)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best
    }

    pub fn has_correct_answer(&self, occurrence: &Occurrence, direction: Direction) -> bool {
        self.resolve(occurrence, direction)
            .is_some_and(|history| super::updater::has_correct_answer(history, direction))
    }

    fn write_target(&self, occurrence: &Occurrence, direction: Direction) -> WriteTarget {
        let expressions = self.location(occurrence);
        let position_of = |target: &ConceptHistory| {
            expressions
                .iter()
                .position(|history| std::ptr::eq(history, target))
        };

        if let Some(index) = self.resolve(occurrence, direction).and_then(position_of) {
            return WriteTarget::Existing(index);
        }
        if let Some(index) = expressions
            .iter()
            .position(|history| identity::is_canonical_key(&history.expression, &occurrence.forms))
        {
            return WriteTarget::Existing(index);
        }
        match expressions
            .iter()
            .position(|history| identity::key_matches(&history.expression, &occurrence.forms))
        {
            Some(index) => WriteTarget::Existing(index),
            None => WriteTarget::New,
        }
    }

    /// Applies one graded attempt for `occurrence`. Nothing is written when
    /// the attempt is rejected.
    pub fn record_attempt(
        &mut self,
        updater: &HistoryUpdater,
        occurrence: &Occurrence,
        direction: Direction,
        attempt: &Attempt,
    ) -> EngineResult<UpdateOutcome> {
        let key = identity::record_key(&occurrence.forms).to_string();
        if key.is_empty() {
            return Err(EngineError::EmptyExpression);
        }

        let target = self.write_target(occurrence, direction);
        let mut outcome = match target {
            WriteTarget::Existing(index) => {
                let current = self
                    .location(occurrence)
                    .get(index)
                    .ok_or_else(|| EngineError::UnknownNotebook(occurrence.notebook_id.clone()))?;
                updater.apply(current, direction, attempt)?
            }
            WriteTarget::New => updater.create(&key, direction, attempt)?,
        };

        let notebook_id = occurrence.notebook_id.clone();
        let notebook = self.notebooks.entry(notebook_id.clone()).or_insert_with(|| {
            if occurrence.scene.is_some() {
                NotebookHistory::story()
            } else {
                NotebookHistory::flashcard()
            }
        });
        let expressions = notebook.expressions_mut(&notebook_id, occurrence.scene.as_deref())?;

        match target {
            WriteTarget::Existing(index) => {
                let canonical_taken = expressions
                    .iter()
                    .enumerate()
                    .any(|(i, history)| i != index && identity::same_key(&history.expression, &key));
                // A suppressed attempt leaves the record exactly as it was.
                if outcome.is_appended()
                    && !canonical_taken
                    && !identity::same_key(&outcome.history.expression, &key)
                {
                    tracing::debug!(
                        from = %outcome.history.expression,
                        to = %key,
                        notebook = %notebook_id,
                        "collapsing record onto canonical key"
                    );
                    outcome.history.expression = key;
                }
                expressions[index] = outcome.history.clone();
            }
            WriteTarget::New => expressions.push(outcome.history.clone()),
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::history::types::{AttemptRecord, LearnedStatus, QuizKind, SurfaceForms};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn mastered_record(d: u32) -> AttemptRecord {
        AttemptRecord {
            status: LearnedStatus::Understood,
            graded_at: day(d),
            quality: 4,
            response_time_ms: 0,
            quiz_kind: QuizKind::Notebook,
            interval_days: 7,
            easiness_factor: 2.5,
        }
    }

    fn lookout_occurrence() -> Occurrence {
        Occurrence::new(
            "harbor",
            Some("scene-1"),
            SurfaceForms::new("lookouts").with_canonical("lookout"),
        )
    }

    fn book_with(expressions: Vec<ConceptHistory>) -> HistoryBook {
        let mut book = HistoryBook::new();
        book.insert_notebook(
            "harbor",
            NotebookHistory::Story {
                scenes: vec![SceneHistory {
                    scene: "scene-1".to_string(),
                    expressions,
                }],
            },
        );
        book
    }

    #[test]
    fn empty_canonical_entry_does_not_shadow_sibling() {
        let mut sibling = ConceptHistory::new("lookouts");
        sibling.forward.push(mastered_record(1));
        let book = book_with(vec![ConceptHistory::new("lookout"), sibling]);

        let occurrence = lookout_occurrence();
        let resolved = book.resolve(&occurrence, Direction::Forward).unwrap();
        assert_eq!(resolved.expression, "lookouts");
        assert!(book.has_correct_answer(&occurrence, Direction::Forward));
    }

    #[test]
    fn most_recent_attempt_wins() {
        let mut older = ConceptHistory::new("lookout");
        older.forward.push(mastered_record(1));
        let mut newer = ConceptHistory::new("Lookouts");
        newer.forward.push(mastered_record(3));
        let book = book_with(vec![older, newer]);

        let resolved = book.resolve(&lookout_occurrence(), Direction::Forward).unwrap();
        assert_eq!(resolved.expression, "Lookouts");
    }

    #[test]
    fn new_record_uses_canonical_key() {
        let mut book = HistoryBook::new();
        let updater = HistoryUpdater::default();
        let attempt = Attempt::new(true, 4, QuizKind::Freeform, day(2));
        book.record_attempt(&updater, &lookout_occurrence(), Direction::Forward, &attempt)
            .unwrap();

        let notebook = book.notebook("harbor").unwrap();
        let expressions = notebook.expressions(Some("scene-1"));
        assert_eq!(expressions.len(), 1);
        assert_eq!(expressions[0].expression, "lookout");
    }

    #[test]
    fn legacy_key_collapses_onto_canonical() {
        let mut legacy = ConceptHistory::new("lookouts");
        legacy.forward.push(mastered_record(1));
        let mut book = book_with(vec![legacy]);
        let updater = HistoryUpdater::default();
        let attempt = Attempt::new(false, 1, QuizKind::Freeform, day(9));

        book.record_attempt(&updater, &lookout_occurrence(), Direction::Forward, &attempt)
            .unwrap();

        let expressions = book.notebook("harbor").unwrap().expressions(Some("scene-1"));
        assert_eq!(expressions.len(), 1);
        assert_eq!(expressions[0].expression, "lookout");
        assert_eq!(expressions[0].forward.len(), 2);
    }

    #[test]
    fn suppressed_attempt_keeps_legacy_key() {
        let mut legacy = ConceptHistory::new("lookouts");
        legacy.forward.push(mastered_record(1));
        let mut book = book_with(vec![legacy.clone()]);
        let updater = HistoryUpdater::default();
        let attempt = Attempt::new(true, 4, QuizKind::Freeform, day(9)).known_word(true);

        let outcome = book
            .record_attempt(&updater, &lookout_occurrence(), Direction::Forward, &attempt)
            .unwrap();

        assert!(!outcome.is_appended());
        let expressions = book.notebook("harbor").unwrap().expressions(Some("scene-1"));
        assert_eq!(expressions, &[legacy][..]);
    }

    #[test]
    fn story_notebook_requires_scene() {
        let mut book = book_with(Vec::new());
        let updater = HistoryUpdater::default();
        let occurrence = Occurrence::new("harbor", None, SurfaceForms::new("lookout"));
        let attempt = Attempt::new(true, 4, QuizKind::Freeform, day(2));
        let err = book
            .record_attempt(&updater, &occurrence, Direction::Forward, &attempt)
            .unwrap_err();
        assert_eq!(err, EngineError::MissingScene("harbor".to_string()));
    }

    #[test]
    fn flashcard_notebook_is_created_flat() {
        let mut book = HistoryBook::new();
        let updater = HistoryUpdater::default();
        let occurrence = Occurrence::new("deck", None, SurfaceForms::new("serendipity"));
        let attempt = Attempt::new(true, 5, QuizKind::Flashcard, day(2));
        book.record_attempt(&updater, &occurrence, Direction::Reverse, &attempt)
            .unwrap();
        assert!(matches!(
            book.notebook("deck"),
            Some(NotebookHistory::Flashcard { expressions }) if expressions.len() == 1
        ));
    }

    #[test]
    fn rejected_attempt_writes_nothing() {
        let mut book = HistoryBook::new();
        let updater = HistoryUpdater::default();
        let attempt = Attempt::new(true, 0, QuizKind::Freeform, day(2));
        assert!(book
            .record_attempt(&updater, &lookout_occurrence(), Direction::Forward, &attempt)
            .is_err());
        assert!(book.is_empty());
    }
}
