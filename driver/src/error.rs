//! Error types for command-line processing.

use declopt_core::{CheckError, DeclarationError, EvaluationError};
use thiserror::Error;

/// Tokenizer-level problems with the argument stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("option {option} is ambiguous (possibilities: {})", .candidates.join(" "))]
    AmbiguousOption {
        option: String,
        candidates: Vec<String>,
    },

    #[error("option {0} requires an argument")]
    MissingArgument(String),

    #[error("option {option} doesn't allow an argument ('{value}')")]
    UnexpectedArgument { option: String, value: String },

    #[error("argument is not valid UTF-8: {0}")]
    InvalidEncoding(String),

    #[error("{0}")]
    Tokenizer(String),
}

impl From<lexopt::Error> for UsageError {
    fn from(err: lexopt::Error) -> Self {
        match err {
            lexopt::Error::MissingValue { option } => {
                Self::MissingArgument(option.unwrap_or_else(|| "?".to_string()))
            }
            lexopt::Error::UnexpectedOption(option) => Self::UnknownOption(option),
            lexopt::Error::UnexpectedValue { option, value } => Self::UnexpectedArgument {
                option,
                value: value.to_string_lossy().into_owned(),
            },
            lexopt::Error::NonUnicodeValue(value) => {
                Self::InvalidEncoding(value.to_string_lossy().into_owned())
            }
            other => Self::Tokenizer(other.to_string()),
        }
    }
}

/// Everything that can stop a parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The declarations themselves are broken.
    #[error("option declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Check(#[from] CheckError),

    /// Raised by the application through `opt_error`.
    #[error("{0}")]
    Application(String),
}

impl DriverError {
    /// Declaration errors are programming mistakes; the rest are user
    /// errors reported together with help.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Declaration(_))
    }
}

/// Convenience alias for results with [`DriverError`].
pub type Result<T> = std::result::Result<T, DriverError>;
