use std::fmt;

use forge_core::model::{
    AnswerFeedback, AnswerSubmission, Attempt, AttemptId, OptionLabel, Question, Quiz,
    ResultBreakdown,
};
use forge_core::scoring::running_score;

use super::progress::AttemptProgress;
use crate::error::{AttemptError, Redirect, ValidationError};

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Where a single attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    NotStarted,
    Answering,
    Answered,
    Completing,
    Completed,
    ResultsReady,
    Failed,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Answering => "answering",
            Self::Answered => "answered",
            Self::Completing => "completing",
            Self::Completed => "completed",
            Self::ResultsReady => "showing results",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ResultsReady | Self::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── TRANSITION OUTPUTS ────────────────────────────────────────────────────────
//

/// An answer that has been handed to the backend and not yet resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAnswer {
    pub attempt_id: AttemptId,
    pub submission: AnswerSubmission,
}

/// Outcome of `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved on to the question at this index.
    Next(usize),
    /// The last question was answered; completion is now pending.
    ReadyToComplete,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Client-side state of one quiz attempt.
///
/// Performs no I/O. Every network call is bracketed by a `begin_*` method
/// that marks the request in flight and an `apply_*`/`abort_*` pair that
/// resolves it, so a second request can never be issued before the first
/// one settles.
pub struct AttemptSession {
    quiz: Quiz,
    attempt: Attempt,
    questions: Vec<Question>,
    current: usize,
    selected: Option<OptionLabel>,
    feedback: Option<AnswerFeedback>,
    history: Vec<AnswerFeedback>,
    recorded_unseen: usize,
    unacknowledged: bool,
    phase: Phase,
    in_flight: bool,
    results: Option<ResultBreakdown>,
    failure: Option<AttemptError>,
}

impl AttemptSession {
    /// Enter the answering state for a freshly created attempt.
    ///
    /// Uses the attempt's randomized layout when the backend supplied one,
    /// otherwise the quiz's own question order and labels.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::EmptyQuiz` if there is nothing to answer.
    /// Returns `AttemptError::InvalidRecord` if the attempt belongs to
    /// another quiz, is already completed, or its layout does not match the
    /// quiz.
    pub fn new(quiz: Quiz, attempt: Attempt) -> Result<Self, AttemptError> {
        if quiz.question_count() == 0 {
            return Err(AttemptError::EmptyQuiz);
        }
        if attempt.quiz_id() != quiz.id() {
            return Err(AttemptError::InvalidRecord(format!(
                "attempt {} belongs to quiz {}",
                attempt.id(),
                attempt.quiz_id()
            )));
        }
        if attempt.is_completed() {
            return Err(AttemptError::InvalidRecord(format!(
                "attempt {} is already completed",
                attempt.id()
            )));
        }

        let questions = match attempt.randomized_questions() {
            Some(layout) if layout.len() != quiz.question_count() => {
                return Err(AttemptError::InvalidRecord(format!(
                    "layout has {} questions, quiz has {}",
                    layout.len(),
                    quiz.question_count()
                )));
            }
            Some(layout) => layout.to_vec(),
            None => quiz.questions().to_vec(),
        };

        Ok(Self {
            quiz,
            attempt,
            questions,
            current: 0,
            selected: None,
            feedback: None,
            history: Vec::new(),
            recorded_unseen: 0,
            unacknowledged: false,
            phase: Phase::Answering,
            in_flight: false,
            results: None,
            failure: None,
        })
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt.id()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// The question being answered, as laid out for this attempt.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Answering | Phase::Answered => self.questions.get(self.current),
            _ => None,
        }
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<OptionLabel> {
        self.selected
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&AnswerFeedback> {
        self.feedback.as_ref()
    }

    /// Feedback of every answered question, in answer order.
    #[must_use]
    pub fn history(&self) -> &[AnswerFeedback] {
        &self.history
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// A submission for the current question failed without a response, so
    /// the backend may already hold the answer.
    #[must_use]
    pub fn awaiting_ack(&self) -> bool {
        self.unacknowledged
    }

    #[must_use]
    pub fn results(&self) -> Option<&ResultBreakdown> {
        self.results.as_ref()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&AttemptError> {
        self.failure.as_ref()
    }

    /// Where to send the user once the session has failed.
    #[must_use]
    pub fn redirect(&self) -> Option<Redirect> {
        self.failure
            .as_ref()
            .map(|err| err.redirect().unwrap_or(Redirect::Listing))
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.phase == Phase::Answering && !self.in_flight && self.selected.is_some()
    }

    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.phase == Phase::Answered && !self.in_flight
    }

    /// Running score to display, preferring the backend's figure.
    #[must_use]
    pub fn score_so_far(&self) -> f64 {
        self.history
            .last()
            .and_then(|feedback| feedback.score_so_far)
            .unwrap_or_else(|| running_score(self.correct_count(), self.history.len()))
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.history.iter().filter(|f| f.is_correct).count()
    }

    #[must_use]
    pub fn progress(&self) -> AttemptProgress {
        AttemptProgress::new(
            self.current,
            self.questions.len(),
            self.history.len() + self.recorded_unseen,
            self.correct_count(),
            self.score_so_far(),
        )
    }

    fn ensure_idle(&self) -> Result<(), ValidationError> {
        if self.in_flight {
            return Err(ValidationError::InFlight);
        }
        Ok(())
    }

    /// Choose an option for the current question.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::AlreadyAnswered` once feedback arrived,
    /// `ValidationError::InFlight` while the answer is being submitted.
    pub fn select_option(&mut self, label: OptionLabel) -> Result<(), ValidationError> {
        match self.phase {
            Phase::Answering => {}
            Phase::Answered => return Err(ValidationError::AlreadyAnswered),
            other => return Err(ValidationError::WrongPhase(other)),
        }
        self.ensure_idle()?;
        self.selected = Some(label);
        Ok(())
    }

    /// Lock in the current selection and mark the submission in flight.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NoSelection` without a selected option and
    /// `ValidationError::AlreadyAnswered` when feedback is already present.
    pub fn begin_submission(&mut self) -> Result<PendingAnswer, ValidationError> {
        match self.phase {
            Phase::Answering => {}
            Phase::Answered => return Err(ValidationError::AlreadyAnswered),
            other => return Err(ValidationError::WrongPhase(other)),
        }
        self.ensure_idle()?;
        let selected_option = self.selected.ok_or(ValidationError::NoSelection)?;

        self.in_flight = true;
        Ok(PendingAnswer {
            attempt_id: self.attempt.id(),
            submission: AnswerSubmission {
                question_index: self.current,
                selected_option,
            },
        })
    }

    /// Record the backend's feedback for the pending answer.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::StaleResponse` if `pending` is not the
    /// request currently in flight.
    pub fn apply_feedback(
        &mut self,
        pending: PendingAnswer,
        feedback: AnswerFeedback,
    ) -> Result<&AnswerFeedback, ValidationError> {
        if self.phase != Phase::Answering || !self.in_flight {
            return Err(ValidationError::StaleResponse);
        }
        self.ensure_pending(pending)?;
        if feedback.selected_option != pending.submission.selected_option {
            return Err(ValidationError::StaleResponse);
        }

        self.in_flight = false;
        self.unacknowledged = false;
        self.phase = Phase::Answered;
        self.history.push(feedback.clone());
        Ok(&*self.feedback.insert(feedback))
    }

    /// The backend already holds an answer for the pending question from an
    /// earlier submission whose response was lost. The question is locked
    /// without feedback; its outcome appears in the results.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::StaleResponse` if `pending` is not the
    /// request in flight or no earlier submission for it went unanswered.
    pub fn acknowledge_recorded(&mut self, pending: PendingAnswer) -> Result<(), ValidationError> {
        if self.phase != Phase::Answering || !self.in_flight || !self.unacknowledged {
            return Err(ValidationError::StaleResponse);
        }
        self.ensure_pending(pending)?;

        self.in_flight = false;
        self.unacknowledged = false;
        self.recorded_unseen += 1;
        self.phase = Phase::Answered;
        tracing::debug!(attempt = %self.attempt.id(), index = self.current, "answer recorded earlier");
        Ok(())
    }

    fn ensure_pending(&self, pending: PendingAnswer) -> Result<(), ValidationError> {
        if pending.attempt_id != self.attempt.id()
            || pending.submission.question_index != self.current
        {
            return Err(ValidationError::StaleResponse);
        }
        Ok(())
    }

    /// The submission failed; the question stays answerable with its
    /// selection intact.
    pub fn abort_submission(&mut self) {
        if self.phase == Phase::Answering && self.in_flight {
            self.in_flight = false;
            self.unacknowledged = true;
        }
    }

    /// Move past an answered question.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotAnswered` while the current question has
    /// no feedback.
    pub fn advance(&mut self) -> Result<Advance, ValidationError> {
        match self.phase {
            Phase::Answered => {}
            Phase::Answering => return Err(ValidationError::NotAnswered),
            other => return Err(ValidationError::WrongPhase(other)),
        }
        self.ensure_idle()?;

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.selected = None;
            self.feedback = None;
            self.phase = Phase::Answering;
            tracing::debug!(attempt = %self.attempt.id(), index = self.current, "next question");
            Ok(Advance::Next(self.current))
        } else {
            self.phase = Phase::Completing;
            tracing::debug!(attempt = %self.attempt.id(), "ready to complete");
            Ok(Advance::ReadyToComplete)
        }
    }

    /// Mark the completion request in flight.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::WrongPhase` unless the last question has
    /// been answered and advanced past.
    pub fn begin_completion(&mut self) -> Result<AttemptId, ValidationError> {
        if self.phase != Phase::Completing {
            return Err(ValidationError::WrongPhase(self.phase));
        }
        self.ensure_idle()?;
        self.in_flight = true;
        Ok(self.attempt.id())
    }

    /// Store the finalized attempt returned by the backend.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidRecord` if the returned attempt is a
    /// different one or carries no score.
    pub fn apply_completion(&mut self, attempt: Attempt) -> Result<f64, AttemptError> {
        if self.phase != Phase::Completing || !self.in_flight {
            return Err(ValidationError::StaleResponse.into());
        }
        if attempt.id() != self.attempt.id() {
            self.in_flight = false;
            return Err(AttemptError::InvalidRecord(format!(
                "completed attempt {} while finishing {}",
                attempt.id(),
                self.attempt.id()
            )));
        }
        let Some(score) = attempt.score() else {
            self.in_flight = false;
            return Err(AttemptError::InvalidRecord(
                "completed attempt has no score".into(),
            ));
        };

        self.in_flight = false;
        self.attempt = attempt;
        self.phase = Phase::Completed;
        tracing::debug!(attempt = %self.attempt.id(), score, "attempt completed");
        Ok(score)
    }

    /// The backend had already finalized the attempt when completion was
    /// retried; `results` stands in for the lost acknowledgement and the
    /// session goes straight to `ResultsReady`.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidRecord` if the breakdown belongs to a
    /// different attempt.
    pub fn recover_completion(&mut self, results: ResultBreakdown) -> Result<f64, AttemptError> {
        if self.phase != Phase::Completing || !self.in_flight {
            return Err(ValidationError::StaleResponse.into());
        }
        self.in_flight = false;
        if results.attempt_id() != self.attempt.id() {
            return Err(AttemptError::InvalidRecord(format!(
                "results for attempt {} while finishing {}",
                results.attempt_id(),
                self.attempt.id()
            )));
        }

        let score = results.score();
        self.results = Some(results);
        self.phase = Phase::ResultsReady;
        tracing::debug!(attempt = %self.attempt.id(), score, "completion recovered from results");
        Ok(score)
    }

    /// Completion failed; it can be requested again.
    pub fn abort_completion(&mut self) {
        if self.phase == Phase::Completing {
            self.in_flight = false;
        }
    }

    /// Mark the results request in flight.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::WrongPhase` before completion succeeded.
    pub fn begin_results(&mut self) -> Result<AttemptId, ValidationError> {
        if self.phase != Phase::Completed {
            return Err(ValidationError::WrongPhase(self.phase));
        }
        self.ensure_idle()?;
        self.in_flight = true;
        Ok(self.attempt.id())
    }

    /// Store the breakdown; the session becomes read-only.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidRecord` if the breakdown belongs to a
    /// different attempt.
    pub fn apply_results(
        &mut self,
        results: ResultBreakdown,
    ) -> Result<&ResultBreakdown, AttemptError> {
        if self.phase != Phase::Completed || !self.in_flight {
            return Err(ValidationError::StaleResponse.into());
        }
        self.in_flight = false;
        if results.attempt_id() != self.attempt.id() {
            return Err(AttemptError::InvalidRecord(format!(
                "results for attempt {} while viewing {}",
                results.attempt_id(),
                self.attempt.id()
            )));
        }

        self.phase = Phase::ResultsReady;
        Ok(&*self.results.insert(results))
    }

    /// Enter the terminal failed state.
    pub fn fail(&mut self, err: AttemptError) {
        tracing::debug!(attempt = %self.attempt.id(), from = %self.phase, error = %err, "attempt failed");
        self.in_flight = false;
        self.phase = Phase::Failed;
        self.failure = Some(err);
    }
}

impl fmt::Debug for AttemptSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttemptSession")
            .field("attempt_id", &self.attempt.id())
            .field("quiz_id", &self.quiz.id())
            .field("phase", &self.phase)
            .field("current", &self.current)
            .field("total", &self.questions.len())
            .field("selected", &self.selected)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}
