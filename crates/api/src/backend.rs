use std::sync::Arc;

use async_trait::async_trait;
use forge_core::model::{
    AnswerFeedback, AnswerSubmission, Attempt, AttemptId, Page, Quiz, QuizId, QuizListItem,
    ResultBreakdown, StatsSummary, UserPerformance, UserProgress,
};

use crate::error::ApiError;

/// Quiz and attempt endpoints of the StudyForge backend.
///
/// The backend owns scoring; implementations only transport and decode.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// List the caller's quizzes.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for auth, transport, or decode failures.
    async fn list_quizzes(&self, skip: u64, limit: u64) -> Result<Page<QuizListItem>, ApiError>;

    /// Fetch quiz metadata and questions.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the quiz no longer exists.
    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, ApiError>;

    /// Create a server-tracked attempt, possibly with a randomized layout.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the quiz no longer exists.
    async fn create_attempt(&self, quiz_id: QuizId) -> Result<Attempt, ApiError>;

    /// Record one answer and return immediate feedback.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the question was already answered or
    /// the attempt is completed.
    async fn submit_answer(
        &self,
        attempt_id: AttemptId,
        answer: AnswerSubmission,
    ) -> Result<AnswerFeedback, ApiError>;

    /// Finalize the attempt and compute its score.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the attempt is already completed or
    /// has no answers.
    async fn complete_attempt(&self, attempt_id: AttemptId) -> Result<Attempt, ApiError>;

    /// Fetch the per-question breakdown of a completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the attempt is not completed yet.
    async fn get_results(&self, attempt_id: AttemptId) -> Result<ResultBreakdown, ApiError>;
}

/// Progress and performance endpoints.
#[async_trait]
pub trait StatsBackend: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` for auth, transport, or decode failures.
    async fn progress(&self) -> Result<UserProgress, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` for auth, transport, or decode failures.
    async fn performance(&self, limit: u32) -> Result<UserPerformance, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` for auth, transport, or decode failures.
    async fn summary(&self) -> Result<StatsSummary, ApiError>;
}

/// Aggregates backend seams behind trait objects for easy swapping.
#[derive(Clone)]
pub struct Backend {
    pub quizzes: Arc<dyn QuizBackend>,
    pub stats: Arc<dyn StatsBackend>,
}

impl Backend {
    #[must_use]
    pub fn from_shared<B>(backend: B) -> Self
    where
        B: QuizBackend + StatsBackend + 'static,
    {
        let shared = Arc::new(backend);
        let quizzes: Arc<dyn QuizBackend> = shared.clone();
        let stats: Arc<dyn StatsBackend> = shared;
        Self { quizzes, stats }
    }
}
