use std::io;

use api::ApiError;
use services::{AttemptError, ErrorKind, Redirect};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by the binary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{}", .0.user_message())]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid {what}: {raw:?}")]
    InvalidArgument { what: &'static str, raw: String },
    #[error("{0}")]
    Unsupported(&'static str),
}

impl AppError {
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::InvalidArgument { .. } => 2,
            Self::Api(ApiError::Unauthorized) => 3,
            Self::Attempt(err) if err.kind() == ErrorKind::Auth => 3,
            _ => 1,
        }
    }

    /// Follow-up hint for errors that end the current command.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        let redirect = match self {
            Self::Api(ApiError::Unauthorized) => Some(Redirect::Login),
            Self::Attempt(err) => err.redirect(),
            _ => None,
        };
        redirect.map(|target| match target {
            Redirect::Login => "Run `studyforge login` to sign in again.",
            Redirect::Listing => "Run `studyforge quizzes` to pick another quiz.",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_exit_with_three() {
        let err = AppError::from(AttemptError::Auth);
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.hint(), Some("Run `studyforge login` to sign in again."));
        assert_eq!(err.to_string(), "Your session has expired. Please log in again.");
    }

    #[test]
    fn bad_arguments_exit_with_two() {
        let err = AppError::InvalidArgument {
            what: "quiz id",
            raw: "xyz".into(),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.hint(), None);
    }

    #[test]
    fn missing_quiz_points_to_listing() {
        let err = AppError::from(AttemptError::NotFound("quiz".into()));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.hint(), Some("Run `studyforge quizzes` to pick another quiz."));
    }
}
