use std::sync::Arc;

use api::{ApiError, Credentials, QuizBackend};
use forge_core::model::{AnswerFeedback, AttemptId, QuizId, ResultBreakdown};

use super::session::{Advance, AttemptSession, Phase};
use crate::error::{AttemptError, ValidationError};

/// Result of advancing past an answered question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Now answering the question at this index.
    Next(usize),
    /// The attempt was finalized with this score.
    Completed(f64),
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Submitted {
    /// The backend graded the answer.
    Scored(AnswerFeedback),
    /// An earlier submission whose response was lost had already been
    /// recorded; its grading shows up in the results.
    Recorded,
}

impl Submitted {
    #[must_use]
    pub fn feedback(&self) -> Option<&AnswerFeedback> {
        match self {
            Self::Scored(feedback) => Some(feedback),
            Self::Recorded => None,
        }
    }

    #[must_use]
    pub fn into_feedback(self) -> Option<AnswerFeedback> {
        match self {
            Self::Scored(feedback) => Some(feedback),
            Self::Recorded => None,
        }
    }
}

/// Drives an `AttemptSession` against the backend.
///
/// Each method applies the outcome of its backend calls to the session
/// before returning. Only a rejected retry of a request whose response was
/// lost issues a second call.
#[derive(Clone)]
pub struct AttemptLoopService {
    quizzes: Arc<dyn QuizBackend>,
    credentials: Arc<dyn Credentials>,
}

impl AttemptLoopService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizBackend>, credentials: Arc<dyn Credentials>) -> Self {
        Self {
            quizzes,
            credentials,
        }
    }

    fn surface(&self, err: ApiError) -> AttemptError {
        AttemptError::from_api(err, self.credentials.as_ref())
    }

    /// Fetch the quiz, create a server-side attempt and enter answering.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NotFound` if the quiz no longer exists,
    /// `AttemptError::Auth` without a valid credential and
    /// `AttemptError::Network` on transport failure. No session exists
    /// after an error.
    pub async fn start_attempt(&self, quiz_id: QuizId) -> Result<AttemptSession, AttemptError> {
        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await
            .map_err(|err| self.surface(err))?;
        if quiz.question_count() == 0 {
            return Err(AttemptError::EmptyQuiz);
        }

        let attempt = self
            .quizzes
            .create_attempt(quiz_id)
            .await
            .map_err(|err| self.surface(err))?;
        tracing::debug!(quiz = %quiz_id, attempt = %attempt.id(), "attempt started");
        AttemptSession::new(quiz, attempt)
    }

    /// Submit the selected option for the current question.
    ///
    /// On failure the question stays answerable with its selection, so the
    /// call can simply be repeated. If the repeat is rejected because the
    /// first request did reach the backend, the question is locked as
    /// `Submitted::Recorded`.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Validation` if the session is not ready to
    /// submit, or the backend error otherwise.
    pub async fn submit_answer(
        &self,
        session: &mut AttemptSession,
    ) -> Result<Submitted, AttemptError> {
        let pending = session.begin_submission()?;
        match self
            .quizzes
            .submit_answer(pending.attempt_id, pending.submission)
            .await
        {
            Ok(feedback) => {
                tracing::debug!(
                    attempt = %pending.attempt_id,
                    index = pending.submission.question_index,
                    correct = feedback.is_correct,
                    "answer recorded"
                );
                match session.apply_feedback(pending, feedback) {
                    Ok(feedback) => Ok(Submitted::Scored(feedback.clone())),
                    Err(err) => {
                        session.abort_submission();
                        Err(err.into())
                    }
                }
            }
            Err(ApiError::Rejected { detail, .. }) if session.awaiting_ack() => {
                tracing::debug!(
                    attempt = %pending.attempt_id,
                    index = pending.submission.question_index,
                    %detail,
                    "retry rejected, earlier answer stands"
                );
                session.acknowledge_recorded(pending)?;
                Ok(Submitted::Recorded)
            }
            Err(err) => {
                session.abort_submission();
                Err(self.surface(err))
            }
        }
    }

    /// Move to the next question, completing the attempt after the last one.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Validation` while the current question is
    /// unanswered. If completion fails the session stays in `Completing`
    /// and `complete` can be retried.
    pub async fn advance(&self, session: &mut AttemptSession) -> Result<Step, AttemptError> {
        match session.advance()? {
            Advance::Next(index) => Ok(Step::Next(index)),
            Advance::ReadyToComplete => self.complete(session).await.map(Step::Completed),
        }
    }

    /// Finalize the attempt and return the backend's score.
    ///
    /// A rejection is checked against the results endpoint: if the backend
    /// already finalized the attempt, the breakdown is adopted and the
    /// session moves to `ResultsReady`.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Validation` unless the session is completing,
    /// or the backend error otherwise.
    pub async fn complete(&self, session: &mut AttemptSession) -> Result<f64, AttemptError> {
        let attempt_id = session.begin_completion()?;
        let err = match self.quizzes.complete_attempt(attempt_id).await {
            Ok(attempt) => return session.apply_completion(attempt),
            Err(err @ ApiError::Rejected { .. }) => err,
            Err(err) => {
                session.abort_completion();
                return Err(self.surface(err));
            }
        };

        match self.quizzes.get_results(attempt_id).await {
            Ok(results) => session.recover_completion(results),
            Err(lookup) => {
                tracing::debug!(attempt = %attempt_id, error = %lookup, "attempt not finalized");
                session.abort_completion();
                Err(self.surface(err))
            }
        }
    }

    /// Load the breakdown of a completed session.
    ///
    /// Returns the stored breakdown without a request once results are
    /// ready. A failed fetch is fatal to the session.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Validation` before completion, or the backend
    /// error after moving the session to `Failed`.
    pub async fn load_results<'s>(
        &self,
        session: &'s mut AttemptSession,
    ) -> Result<&'s ResultBreakdown, AttemptError> {
        if session.phase() == Phase::ResultsReady {
            return session
                .results()
                .ok_or(AttemptError::Validation(ValidationError::WrongPhase(
                    Phase::ResultsReady,
                )));
        }
        let attempt_id = session.begin_results()?;
        let results = match self.quizzes.get_results(attempt_id).await {
            Ok(results) => results,
            Err(err) => {
                let err = self.surface(err);
                session.fail(err.clone());
                return Err(err);
            }
        };
        session.apply_results(results)
    }

    /// Fetch the breakdown of a past attempt without a live session.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Rejected` if the attempt is not completed.
    pub async fn fetch_results(
        &self,
        attempt_id: AttemptId,
    ) -> Result<ResultBreakdown, AttemptError> {
        self.quizzes
            .get_results(attempt_id)
            .await
            .map_err(|err| self.surface(err))
    }
}
