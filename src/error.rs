use thiserror::Error;

/// Contract violations raised by the learning-history engine.
///
/// These indicate malformed input from the caller rather than expected
/// runtime conditions; an attempt that fails with one of these leaves the
/// history untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("quality score {0} is outside 1..=5")]
    InvalidQuality(i32),
    #[error("commit index {index} out of range for {len} occurrences")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("expression must not be empty")]
    EmptyExpression,
    #[error("notebook not found: {0}")]
    UnknownNotebook(String),
    #[error("story notebook {0} needs a scene for this occurrence")]
    MissingScene(String),
    #[error("invalid interval table: {0}")]
    InvalidIntervalTable(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
