use crate::libshiken::shitsumon::{QuestionId, QuestionType, UnitId};
use thiserror::Error;

/// Raised when an OR-group cannot be formed from the current selection.
/// The bank is left untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("please select at least two questions to group (got {0})")]
    TooFew(usize),
    #[error("question {id} is not a plain {question_type} question in unit {unit}")]
    NotInList {
        id: QuestionId,
        unit: UnitId,
        question_type: QuestionType,
    },
    #[error("question {0} is already part of an OR-group")]
    AlreadyGrouped(QuestionId),
}

/// Soft failure: the pool for a type cannot fill every set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "not enough unique {question_type} questions: {available} available, {requested} requested \
     ({sets} sets x {per_set}); some sets will be incomplete"
)]
pub struct InsufficientPoolWarning {
    pub question_type: QuestionType,
    pub available: usize,
    pub requested: usize,
    pub sets: usize,
    pub per_set: usize,
}

#[derive(Debug, Error)]
pub enum BankFileError {
    #[error("cannot read bank file")]
    Io(#[from] std::io::Error),
    #[error("malformed bank JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid OR-group in unit {unit}: {source}")]
    Group {
        unit: UnitId,
        #[source]
        source: SelectionError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file")]
    Io(#[from] std::io::Error),
    #[error("malformed config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("number of sets must be at least 1")]
    NoSets,
}
