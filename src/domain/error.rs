//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent rule-engine violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("location is blank")]
    EmptyLocation,

    #[error("location not registered: {0}")]
    UnknownLocation(String),

    #[error("recorded path no longer matches the rules for '{location}' at step {depth}: {reason}")]
    StaleTreePath {
        location: String,
        depth: usize,
        reason: String,
    },

    #[error("{0} is required")]
    IncompleteAuthoring(&'static str),

    #[error("question already asked on this path: {0}")]
    QuestionOnPath(String),

    #[error("answer cancelled for question: {0}")]
    AnswerCancelled(String),

    #[error("no answer available for question: {0}")]
    MissingAnswer(String),

    #[error("truth table over {count} questions exceeds the limit of {limit}")]
    TooManyQuestions { count: usize, limit: usize },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
