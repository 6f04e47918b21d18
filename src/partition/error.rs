use thiserror::Error;

/// Errors raised while validating or executing a split
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitError {
    #[error("{parameter} must be strictly between 0 and 1, got {value}")]
    InvalidProportion { parameter: &'static str, value: f64 },

    #[error("stratify column '{column}' not found in dataset")]
    UnknownColumn { column: String },

    #[error(
        "cannot stratify on '{column}': label {label:?} has {count} row(s), at least 2 are required"
    )]
    TooFewMembers {
        column: String,
        label: String,
        count: usize,
    },

    #[error("dataset has no rows")]
    EmptyDataset,
}

/// Broad failure class of a [`SplitError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad proportions or an unknown stratify column
    Configuration,
    /// A label group too small to be split
    Stratification,
    EmptyDataset,
}

impl SplitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SplitError::InvalidProportion { .. } | SplitError::UnknownColumn { .. } => {
                ErrorKind::Configuration
            }
            SplitError::TooFewMembers { .. } => ErrorKind::Stratification,
            SplitError::EmptyDataset => ErrorKind::EmptyDataset,
        }
    }
}

pub type SplitResult<T> = Result<T, SplitError>;
