//! Shared error types for the services crate.

use thiserror::Error;

use api::{ApiError, Credentials};

use crate::attempts::Phase;

/// A guarded transition was attempted out of order.
///
/// These never reach the backend; they gate the controls that would have
/// triggered them.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("select an option before submitting")]
    NoSelection,
    #[error("this question has already been answered")]
    AlreadyAnswered,
    #[error("a request is already in flight")]
    InFlight,
    #[error("answer the current question before moving on")]
    NotAnswered,
    #[error("response does not match the pending request")]
    StaleResponse,
    #[error("not allowed while {0}")]
    WrongPhase(Phase),
}

/// Coarse classification used to choose how an error is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Auth,
    NotFound,
    Validation,
    Network,
    Server,
    Protocol,
}

/// Where the caller should send the user after a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
    Listing,
}

/// Errors emitted by the attempt engine and the read-only quiz services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("session expired or missing credentials")]
    Auth,
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("network error: {0}")]
    Network(String),
    #[error("server error (status {status})")]
    Server { status: u16 },
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("quiz has no questions")]
    EmptyQuiz,
    #[error("invalid record from backend: {0}")]
    InvalidRecord(String),
}

impl From<ApiError> for AttemptError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => Self::Auth,
            ApiError::NotFound(what) => Self::NotFound(what),
            ApiError::Rejected { detail, .. } => Self::Rejected(detail),
            ApiError::Server { status } => Self::Server { status },
            ApiError::Transport(message) => Self::Network(message),
            ApiError::Decode(message) => Self::InvalidRecord(message),
            other => Self::InvalidRecord(other.to_string()),
        }
    }
}

impl AttemptError {
    /// Convert a backend failure, clearing credentials on 401.
    pub(crate) fn from_api(err: ApiError, credentials: &dyn Credentials) -> Self {
        let err = Self::from(err);
        if err == Self::Auth {
            credentials.on_unauthorized();
        }
        tracing::warn!(kind = ?err.kind(), error = %err, "backend call failed");
        err
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth => ErrorKind::Auth,
            Self::NotFound(_) | Self::EmptyQuiz => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Network(_) => ErrorKind::Network,
            Self::Server { .. } => ErrorKind::Server,
            Self::Rejected(_) | Self::InvalidRecord(_) => ErrorKind::Protocol,
        }
    }

    /// Transient failures that leave the state machine retryable in place.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Server)
    }

    /// Redirect target when this error ends the current view.
    #[must_use]
    pub fn redirect(&self) -> Option<Redirect> {
        match self.kind() {
            ErrorKind::Auth => Some(Redirect::Login),
            ErrorKind::NotFound => Some(Redirect::Listing),
            _ => None,
        }
    }

    /// Short message suitable for a notification line.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth => "Your session has expired. Please log in again.".into(),
            Self::NotFound(what) => format!("The requested {what} no longer exists."),
            Self::Validation(err) => err.to_string(),
            Self::Network(_) => "Connection problem. Check your network and try again.".into(),
            Self::Server { .. } => "The server had a problem. Please try again shortly.".into(),
            Self::Rejected(detail) => detail.clone(),
            Self::EmptyQuiz => "This quiz has no questions yet.".into(),
            Self::InvalidRecord(_) => "Received unexpected data from the server.".into(),
        }
    }
}
