pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod session;
pub mod snapshot;

pub use error::{EngineError, EngineResult};
pub use history::{
    Attempt, ConceptHistory, Direction, GradedAnswer, HistoryBook, LearnedStatus, Occurrence,
    OccurrenceReconciler, QuizKind, SurfaceForms,
};
pub use session::{AnswerJudge, LearningSession, SharedSession};
