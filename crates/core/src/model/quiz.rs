use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::model::ids::{QuizId, UserId};
use crate::model::options::OptionSet;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("difficulty level must be between 1 and 5, got {0}")]
    InvalidDifficulty(u8),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Coarse grouping of difficulty levels used for badge coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyBand {
    Gentle,
    Moderate,
    Demanding,
}

/// Quiz difficulty on the 1-5 scale assigned at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DifficultyLevel(u8);

impl DifficultyLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// # Errors
    ///
    /// Returns `QuizError::InvalidDifficulty` outside `1..=5`.
    pub fn new(level: u8) -> Result<Self, QuizError> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(QuizError::InvalidDifficulty(level))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Very easy",
            2 => "Easy",
            3 => "Intermediate",
            4 => "Hard",
            _ => "Very hard",
        }
    }

    #[must_use]
    pub fn band(self) -> DifficultyBand {
        match self.0 {
            0..=2 => DifficultyBand::Gentle,
            3 => DifficultyBand::Moderate,
            _ => DifficultyBand::Demanding,
        }
    }
}

impl Default for DifficultyLevel {
    fn default() -> Self {
        Self(3)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A question as shown while answering.
///
/// The answer key is deliberately absent; correctness and explanation are
/// only revealed through feedback and results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: OptionSet,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuestion` if the text is blank.
    pub fn new(text: impl Into<String>, options: OptionSet) -> Result<Self, QuizError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuizError::EmptyQuestion);
        }
        Ok(Self { text, options })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &OptionSet {
        &self.options
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Quiz metadata plus its ordered question list. Read-only on the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    id: QuizId,
    user_id: UserId,
    summary_id: Option<Uuid>,
    title: String,
    topic: String,
    difficulty: DifficultyLevel,
    created_at: DateTime<Utc>,
    questions: Vec<Question>,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` if the title is blank.
    pub fn new(
        id: QuizId,
        user_id: UserId,
        title: impl Into<String>,
        topic: impl Into<String>,
        difficulty: DifficultyLevel,
        created_at: DateTime<Utc>,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        let topic = topic.into();
        let topic = if topic.trim().is_empty() {
            "general".to_string()
        } else {
            topic
        };

        Ok(Self {
            id,
            user_id,
            summary_id: None,
            title,
            topic,
            difficulty,
            created_at,
            questions,
        })
    }

    #[must_use]
    pub fn with_summary_id(mut self, summary_id: Option<Uuid>) -> Self {
        self.summary_id = summary_id;
        self
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn summary_id(&self) -> Option<Uuid> {
        self.summary_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

/// Listing row for the quiz catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizListItem {
    pub id: QuizId,
    pub title: String,
    pub topic: String,
    pub difficulty: DifficultyLevel,
    pub question_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&Quiz> for QuizListItem {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id(),
            title: quiz.title().to_string(),
            topic: quiz.topic().to_string(),
            difficulty: quiz.difficulty(),
            question_count: quiz.question_count(),
            created_at: quiz.created_at(),
        }
    }
}

/// A skip/limit page returned by listing endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    /// True when more rows exist past this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.skip + (self.items.len() as u64) < self.total
    }
}
