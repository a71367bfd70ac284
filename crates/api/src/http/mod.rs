mod wire;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forge_core::model::{
    AnswerFeedback, AnswerSubmission, Attempt, AttemptId, Page, Quiz, QuizId, QuizListItem,
    ResultBreakdown, StatsSummary, UserPerformance, UserProgress,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Credentials;
use crate::backend::{QuizBackend, StatsBackend};
use crate::error::ApiError;
use wire::{
    AnswerBody, AttemptDto, CreateAttemptBody, FeedbackDto, HealthDto, LoginBody,
    PerformanceDto, QuizDto, QuizListDto, ResultsDto,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const API_BASE_ENV: &str = "STUDYFORGE_API_BASE";
pub const TIMEOUT_ENV: &str = "STUDYFORGE_TIMEOUT_SECS";

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    /// # Errors
    ///
    /// Returns `url::ParseError` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: normalize_base(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `STUDYFORGE_API_BASE` and `STUDYFORGE_TIMEOUT_SECS` through
    /// `lookup`, falling back to the defaults for unset or blank values.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the configured base URL is invalid.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, url::ParseError> {
        let base = lookup(API_BASE_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let timeout = lookup(TIMEOUT_ENV)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Ok(Self::new(&base)?.with_timeout(Duration::from_secs(timeout)))
    }
}

/// Joining relative paths onto a base drops its last segment unless the
/// base ends with `/`.
fn normalize_base(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{trimmed}/"))
    }
}

/// Bearer token returned by `/auth/login`.
#[derive(Clone, Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

/// REST adapter for the StudyForge backend.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn Credentials>,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig, credentials: Arc<dyn Credentials>) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
            credentials,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::Transport(format!("invalid endpoint {path}: {err}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "backend request");
        let builder = self.client.request(method, url);
        Ok(match self.credentials.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), wire::error_detail(&body));
        tracing::warn!(
            status = status.as_u16(),
            transient = err.is_transient(),
            error = %err,
            "backend request failed"
        );
        Err(err)
    }

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for bad credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken, ApiError> {
        let builder = self
            .request(Method::POST, "auth/login")?
            .json(&LoginBody { email, password });
        self.send(builder).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend is unreachable.
    pub async fn health(&self) -> Result<String, ApiError> {
        let dto: HealthDto = self.send(self.request(Method::GET, "health")?).await?;
        Ok(dto.status)
    }
}

#[async_trait]
impl QuizBackend for HttpBackend {
    async fn list_quizzes(&self, skip: u64, limit: u64) -> Result<Page<QuizListItem>, ApiError> {
        let builder = self
            .request(Method::GET, "quizzes")?
            .query(&[("skip", skip), ("limit", limit)]);
        let dto: QuizListDto = self.send(builder).await?;
        dto.into_domain()
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, ApiError> {
        let dto: QuizDto = self
            .send(self.request(Method::GET, &format!("quizzes/{id}"))?)
            .await?;
        dto.into_domain()
    }

    async fn create_attempt(&self, quiz_id: QuizId) -> Result<Attempt, ApiError> {
        let builder = self
            .request(Method::POST, "quiz-attempts")?
            .json(&CreateAttemptBody { quiz_id });
        let dto: AttemptDto = self.send(builder).await?;
        dto.into_domain()
    }

    async fn submit_answer(
        &self,
        attempt_id: AttemptId,
        answer: AnswerSubmission,
    ) -> Result<AnswerFeedback, ApiError> {
        let builder = self
            .request(Method::POST, &format!("quiz-attempts/{attempt_id}/answer"))?
            .json(&AnswerBody::from(answer));
        let dto: FeedbackDto = self.send(builder).await?;
        Ok(dto.into())
    }

    async fn complete_attempt(&self, attempt_id: AttemptId) -> Result<Attempt, ApiError> {
        let builder = self.request(
            Method::POST,
            &format!("quiz-attempts/{attempt_id}/complete"),
        )?;
        let dto: AttemptDto = self.send(builder).await?;
        dto.into_domain()
    }

    async fn get_results(&self, attempt_id: AttemptId) -> Result<ResultBreakdown, ApiError> {
        let builder = self.request(
            Method::GET,
            &format!("quiz-attempts/{attempt_id}/results"),
        )?;
        let dto: ResultsDto = self.send(builder).await?;
        dto.into_domain()
    }
}

#[async_trait]
impl StatsBackend for HttpBackend {
    async fn progress(&self) -> Result<UserProgress, ApiError> {
        self.send(self.request(Method::GET, "stats/progress")?).await
    }

    async fn performance(&self, limit: u32) -> Result<UserPerformance, ApiError> {
        let builder = self
            .request(Method::GET, "stats/performance")?
            .query(&[("limit", limit)]);
        let dto: PerformanceDto = self.send(builder).await?;
        Ok(dto.into())
    }

    async fn summary(&self) -> Result<StatsSummary, ApiError> {
        self.send(self.request(Method::GET, "stats/summary")?).await
    }
}
