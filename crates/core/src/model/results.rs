use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{AttemptId, QuizId};
use crate::model::options::{OptionLabel, OptionSet};

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("score must be within 0..=100, got {0}")]
    ScoreOutOfRange(f64),

    #[error("correct ({correct}) + incorrect ({incorrect}) does not match total ({total})")]
    CountMismatch {
        total: u32,
        correct: u32,
        incorrect: u32,
    },

    #[error("total questions ({total}) does not match detail rows ({rows})")]
    RowMismatch { total: u32, rows: usize },
}

/// Post-completion detail for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionResult {
    pub question_text: String,
    pub options: OptionSet,
    pub correct_option: OptionLabel,
    pub selected_option: OptionLabel,
    pub is_correct: bool,
    pub explanation: String,
}

/// Full report for a completed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBreakdown {
    attempt_id: AttemptId,
    quiz_id: QuizId,
    score: f64,
    total_questions: u32,
    correct_answers: u32,
    incorrect_answers: u32,
    completed_at: DateTime<Utc>,
    questions: Vec<QuestionResult>,
}

impl ResultBreakdown {
    /// # Errors
    ///
    /// Returns `ResultError` when the score is outside 0..=100 or the
    /// aggregate counts disagree with each other or with the detail rows.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        attempt_id: AttemptId,
        quiz_id: QuizId,
        score: f64,
        total_questions: u32,
        correct_answers: u32,
        incorrect_answers: u32,
        completed_at: DateTime<Utc>,
        questions: Vec<QuestionResult>,
    ) -> Result<Self, ResultError> {
        if !(0.0..=100.0).contains(&score) {
            return Err(ResultError::ScoreOutOfRange(score));
        }
        if correct_answers.saturating_add(incorrect_answers) != total_questions {
            return Err(ResultError::CountMismatch {
                total: total_questions,
                correct: correct_answers,
                incorrect: incorrect_answers,
            });
        }
        if usize::try_from(total_questions).ok() != Some(questions.len()) {
            return Err(ResultError::RowMismatch {
                total: total_questions,
                rows: questions.len(),
            });
        }

        Ok(Self {
            attempt_id,
            quiz_id,
            score,
            total_questions,
            correct_answers,
            incorrect_answers,
            completed_at,
            questions,
        })
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn incorrect_answers(&self) -> u32 {
        self.incorrect_answers
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionResult] {
        &self.questions
    }

    /// Positions of the questions answered incorrectly.
    #[must_use]
    pub fn incorrect_indices(&self) -> Vec<usize> {
        self.questions
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_correct)
            .map(|(idx, _)| idx)
            .collect()
    }
}
