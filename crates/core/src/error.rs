use thiserror::Error;

use crate::model::{AttemptRecordError, OptionError, ParseIdError, QuizError, ResultError};

/// Any validation failure raised while building domain values.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Option(#[from] OptionError),
    #[error(transparent)]
    Attempt(#[from] AttemptRecordError),
    #[error(transparent)]
    Result(#[from] ResultError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
}
