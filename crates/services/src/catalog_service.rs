use std::sync::Arc;

use api::{Credentials, QuizBackend};
use forge_core::model::{Page, Quiz, QuizId, QuizListItem};

use crate::error::AttemptError;

pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Read-only access to the caller's quizzes.
#[derive(Clone)]
pub struct QuizCatalogService {
    quizzes: Arc<dyn QuizBackend>,
    credentials: Arc<dyn Credentials>,
}

impl QuizCatalogService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizBackend>, credentials: Arc<dyn Credentials>) -> Self {
        Self {
            quizzes,
            credentials,
        }
    }

    /// # Errors
    ///
    /// Returns `AttemptError` for auth or transport failures.
    pub async fn list(&self, skip: u64, limit: u64) -> Result<Page<QuizListItem>, AttemptError> {
        let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
        self.quizzes
            .list_quizzes(skip, limit)
            .await
            .map_err(|err| AttemptError::from_api(err, self.credentials.as_ref()))
    }

    /// # Errors
    ///
    /// Returns `AttemptError::NotFound` if the quiz does not exist.
    pub async fn get(&self, id: QuizId) -> Result<Quiz, AttemptError> {
        self.quizzes
            .get_quiz(id)
            .await
            .map_err(|err| AttemptError::from_api(err, self.credentials.as_ref()))
    }
}
