//! Learning-history data model
//!
//! Attempt logs are stored newest-first and are append-only: a new attempt is
//! inserted at index 0 and existing records are never rewritten.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EASINESS_FACTOR: f64 = 2.5;
pub const MIN_EASINESS_FACTOR: f64 = 1.3;

// ========== Enums ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearnedStatus {
    #[default]
    #[serde(rename = "")]
    Unset,
    Misunderstood,
    Understood,
    Usable,
    Intuitive,
}

impl LearnedStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            LearnedStatus::Unset => "",
            LearnedStatus::Misunderstood => "misunderstood",
            LearnedStatus::Understood => "understood",
            LearnedStatus::Usable => "usable",
            LearnedStatus::Intuitive => "intuitive",
        }
    }

    /// Understood, usable and intuitive all count as a correct recall.
    pub const fn is_mastered(self) -> bool {
        match self {
            LearnedStatus::Understood | LearnedStatus::Usable | LearnedStatus::Intuitive => true,
            LearnedStatus::Unset | LearnedStatus::Misunderstood => false,
        }
    }

    pub fn derive(correct: bool, is_known_word: bool) -> Self {
        match (correct, is_known_word) {
            (true, true) => LearnedStatus::Understood,
            (true, false) => LearnedStatus::Usable,
            (false, _) => LearnedStatus::Misunderstood,
        }
    }
}

impl fmt::Display for LearnedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value {value:?} for {kind}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for LearnedStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(LearnedStatus::Unset),
            "misunderstood" => Ok(LearnedStatus::Misunderstood),
            "understood" => Ok(LearnedStatus::Understood),
            "usable" => Ok(LearnedStatus::Usable),
            "intuitive" => Ok(LearnedStatus::Intuitive),
            other => Err(ParseEnumError {
                kind: "learned status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizKind {
    Notebook,
    Freeform,
    Flashcard,
}

impl QuizKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            QuizKind::Notebook => "notebook",
            QuizKind::Freeform => "freeform",
            QuizKind::Flashcard => "flashcard",
        }
    }
}

impl FromStr for QuizKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notebook" => Ok(QuizKind::Notebook),
            "freeform" => Ok(QuizKind::Freeform),
            "flashcard" => Ok(QuizKind::Flashcard),
            other => Err(ParseEnumError {
                kind: "quiz kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Forward recalls the meaning from the expression, reverse recalls the
/// expression from its meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Reverse,
}

// ========== Records ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    #[serde(default)]
    pub status: LearnedStatus,
    pub graded_at: NaiveDate,
    #[serde(default)]
    pub quality: i32,
    #[serde(default)]
    pub response_time_ms: i64,
    pub quiz_kind: QuizKind,
    /// Zero for legacy records written before intervals were persisted.
    #[serde(default)]
    pub interval_days: i64,
    #[serde(default = "default_easiness_factor")]
    pub easiness_factor: f64,
}

fn default_easiness_factor() -> f64 {
    DEFAULT_EASINESS_FACTOR
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptHistory {
    pub expression: String,
    #[serde(default)]
    pub forward: Vec<AttemptRecord>,
    #[serde(default)]
    pub reverse: Vec<AttemptRecord>,
}

impl ConceptHistory {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            forward: Vec::new(),
            reverse: Vec::new(),
        }
    }

    pub fn log(&self, direction: Direction) -> &[AttemptRecord] {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Reverse => &self.reverse,
        }
    }

    pub fn log_mut(&mut self, direction: Direction) -> &mut Vec<AttemptRecord> {
        match direction {
            Direction::Forward => &mut self.forward,
            Direction::Reverse => &mut self.reverse,
        }
    }

    pub fn latest(&self, direction: Direction) -> Option<&AttemptRecord> {
        self.log(direction).first()
    }

    /// An empty log means "never attempted", which is distinct from a
    /// misunderstood attempt.
    pub fn is_attempted(&self, direction: Direction) -> bool {
        !self.log(direction).is_empty()
    }
}

// ========== Occurrences ==========

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceForms {
    pub occurrence_form: String,
    #[serde(default)]
    pub canonical_form: String,
}

impl SurfaceForms {
    pub fn new(occurrence_form: impl Into<String>) -> Self {
        Self {
            occurrence_form: occurrence_form.into(),
            canonical_form: String::new(),
        }
    }

    pub fn with_canonical(mut self, canonical_form: impl Into<String>) -> Self {
        self.canonical_form = canonical_form.into();
        self
    }

    pub fn canonical(&self) -> Option<&str> {
        let trimmed = self.canonical_form.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleContext {
    pub text: String,
    #[serde(default)]
    pub usage_form: String,
}

/// One concept at one physical location. Built from source material every
/// session and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub notebook_id: String,
    /// Story scene; `None` for flashcard notebooks.
    #[serde(default)]
    pub scene: Option<String>,
    pub forms: SurfaceForms,
    #[serde(default)]
    pub contexts: Vec<ExampleContext>,
}

impl Occurrence {
    pub fn new(notebook_id: impl Into<String>, scene: Option<&str>, forms: SurfaceForms) -> Self {
        Self {
            notebook_id: notebook_id.into(),
            scene: scene.map(str::to_string),
            forms,
            contexts: Vec::new(),
        }
    }

    pub fn with_context(mut self, text: impl Into<String>, usage_form: impl Into<String>) -> Self {
        self.contexts.push(ExampleContext {
            text: text.into(),
            usage_form: usage_form.into(),
        });
        self
    }
}

// ========== Judge verdicts ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextVerdict {
    pub context: String,
    pub correct: bool,
    #[serde(default)]
    pub reason: String,
    pub quality: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedAnswer {
    pub correct: bool,
    pub quality: i32,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub context_verdicts: Vec<ContextVerdict>,
}
