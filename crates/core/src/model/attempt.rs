use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{AttemptId, QuizId, UserId};
use crate::model::options::OptionLabel;
use crate::model::quiz::Question;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum AttemptRecordError {
    #[error("attempt has a score but no completion time")]
    ScoreWithoutCompletion,

    #[error("attempt is completed but has no score")]
    CompletionWithoutScore,

    #[error("score must be within 0..=100, got {0}")]
    ScoreOutOfRange(f64),

    #[error("completed_at is before started_at")]
    InvalidTimeRange,
}

/// Server-tracked traversal of a quiz by one user.
///
/// `score` and `completed_at` are either both present or both absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    id: AttemptId,
    quiz_id: QuizId,
    user_id: UserId,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    score: Option<f64>,
    correct_options: Vec<OptionLabel>,
    user_answers: Vec<OptionLabel>,
    randomized_questions: Option<Vec<Question>>,
}

impl Attempt {
    /// Start record for a fresh, unanswered attempt.
    #[must_use]
    pub fn started(
        id: AttemptId,
        quiz_id: QuizId,
        user_id: UserId,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            quiz_id,
            user_id,
            started_at,
            completed_at: None,
            score: None,
            correct_options: Vec::new(),
            user_answers: Vec::new(),
            randomized_questions: None,
        }
    }

    /// Rehydrate an attempt received from the backend.
    ///
    /// # Errors
    ///
    /// Returns `AttemptRecordError` when the score/completion pairing is broken,
    /// the score is out of range, or the timestamps are inverted.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: AttemptId,
        quiz_id: QuizId,
        user_id: UserId,
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        score: Option<f64>,
        correct_options: Vec<OptionLabel>,
        user_answers: Vec<OptionLabel>,
    ) -> Result<Self, AttemptRecordError> {
        match (completed_at, score) {
            (None, Some(_)) => return Err(AttemptRecordError::ScoreWithoutCompletion),
            (Some(_), None) => return Err(AttemptRecordError::CompletionWithoutScore),
            (Some(done), Some(score)) => {
                if !(0.0..=100.0).contains(&score) {
                    return Err(AttemptRecordError::ScoreOutOfRange(score));
                }
                if done < started_at {
                    return Err(AttemptRecordError::InvalidTimeRange);
                }
            }
            (None, None) => {}
        }

        Ok(Self {
            id,
            quiz_id,
            user_id,
            started_at,
            completed_at,
            score,
            correct_options,
            user_answers,
            randomized_questions: None,
        })
    }

    /// Attach the per-attempt option layout computed by the server.
    #[must_use]
    pub fn with_randomized_questions(mut self, questions: Vec<Question>) -> Self {
        self.randomized_questions = Some(questions);
        self
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn correct_options(&self) -> &[OptionLabel] {
        &self.correct_options
    }

    #[must_use]
    pub fn user_answers(&self) -> &[OptionLabel] {
        &self.user_answers
    }

    #[must_use]
    pub fn randomized_questions(&self) -> Option<&[Question]> {
        self.randomized_questions.as_deref()
    }
}

/// One answer sent to the backend, keyed by 0-based question position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub question_index: usize,
    pub selected_option: OptionLabel,
}

/// Immediate per-question result returned after a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_option: OptionLabel,
    pub explanation: String,
    pub selected_option: OptionLabel,
    /// Running percentage so far; older backends omit it.
    pub score_so_far: Option<f64>,
}
