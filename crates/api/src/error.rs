use thiserror::Error;

/// Errors surfaced by backend adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiError {
    #[error("not authenticated")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("server error ({status})")]
    Server { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Map a non-success HTTP status to an error variant.
    ///
    /// 403 is folded into `NotFound`: the backend answers with it when a
    /// quiz or attempt belongs to someone else, which the client treats
    /// the same as a missing resource.
    #[must_use]
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let detail = detail.unwrap_or_default();
        match status {
            401 => Self::Unauthorized,
            403 | 404 => Self::NotFound(detail),
            500..=599 => Self::Server { status },
            _ => Self::Rejected { status, detail },
        }
    }

    /// True for failures where retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), None)
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Domain validation failed on data the backend produced.
impl From<forge_core::Error> for ApiError {
    fn from(err: forge_core::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
