use forge_core::model::QuizId;

use super::session::{AttemptSession, Phase};
use super::workflow::AttemptLoopService;
use crate::error::{AttemptError, Redirect, ValidationError};

/// An attempt view from before the attempt exists until it ends.
///
/// `NotStarted` and entry failures have no session to hold them, so they
/// live here.
#[derive(Debug, Default)]
pub enum AttemptFlow {
    #[default]
    NotStarted,
    Active(AttemptSession),
    Failed {
        error: AttemptError,
        redirect: Redirect,
    },
}

impl AttemptFlow {
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::NotStarted => Phase::NotStarted,
            Self::Active(session) => session.phase(),
            Self::Failed { .. } => Phase::Failed,
        }
    }

    /// Start the attempt; any failure moves the flow to `Failed`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::WrongPhase` unless the flow is not started,
    /// or the start error itself.
    pub async fn start(
        &mut self,
        service: &AttemptLoopService,
        quiz_id: QuizId,
    ) -> Result<&mut AttemptSession, AttemptError> {
        if !matches!(self, Self::NotStarted) {
            return Err(ValidationError::WrongPhase(self.phase()).into());
        }

        match service.start_attempt(quiz_id).await {
            Ok(session) => {
                *self = Self::Active(session);
                match self {
                    Self::Active(session) => Ok(session),
                    _ => Err(ValidationError::WrongPhase(Phase::NotStarted).into()),
                }
            }
            Err(error) => {
                let redirect = error.redirect().unwrap_or(Redirect::Listing);
                tracing::debug!(quiz = %quiz_id, error = %error, ?redirect, "attempt failed to start");
                *self = Self::Failed {
                    error: error.clone(),
                    redirect,
                };
                Err(error)
            }
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&AttemptSession> {
        match self {
            Self::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut AttemptSession> {
        match self {
            Self::Active(session) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&AttemptError> {
        match self {
            Self::NotStarted => None,
            Self::Active(session) => session.failure(),
            Self::Failed { error, .. } => Some(error),
        }
    }

    /// Where to send the user, once the flow has failed.
    #[must_use]
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            Self::NotStarted => None,
            Self::Active(session) => session.redirect(),
            Self::Failed { redirect, .. } => Some(*redirect),
        }
    }
}

impl From<AttemptSession> for AttemptFlow {
    fn from(session: AttemptSession) -> Self {
        Self::Active(session)
    }
}
