//! Error types for exercise-core.

use thiserror::Error;

/// Result type alias using RecordError.
pub type Result<T> = std::result::Result<T, RecordError>;

/// Errors that can occur while decoding an exercise record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid JSON in record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record {id}: unknown exercise type {tag:?}")]
    UnknownType { id: String, tag: String },

    #[error("record {id}: missing field {field}")]
    MissingField { id: String, field: &'static str },

    #[error("record {id}: grade {grade} outside 9-12")]
    InvalidGrade { id: String, grade: i64 },

    #[error("record {id}: duplicate question id {question_id}")]
    DuplicateQuestionId { id: String, question_id: String },

    #[error("record {id}: template has {slots} blanks but {answers} answers")]
    BlankCountMismatch {
        id: String,
        slots: usize,
        answers: usize,
    },

    #[error("record {id}: {reason}")]
    InvalidPayload { id: String, reason: String },
}

/// Errors raised while reading a taxonomy description.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("invalid taxonomy JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("taxonomy description must be an object keyed by grade")]
    NotAnObject,

    #[error("invalid grade key {0:?}")]
    InvalidGrade(String),

    #[error("grade {grade}: topic {topic:?} has an unsupported shape")]
    InvalidTopic { grade: u8, topic: String },
}

/// Errors raised when an answer surface does not fit the question it is checked against.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("expected {expected} input, got {actual}")]
    InputMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("expected {expected} answer slots, got {actual}")]
    SlotCountMismatch { expected: usize, actual: usize },
}
