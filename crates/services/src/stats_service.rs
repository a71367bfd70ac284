use std::sync::Arc;

use api::{Credentials, StatsBackend};
use forge_core::model::{StatsSummary, UserPerformance, UserProgress};

use crate::error::AttemptError;

pub const DEFAULT_PERFORMANCE_LIMIT: u32 = 10;

/// Everything the stats page shows, fetched together.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsOverview {
    pub summary: StatsSummary,
    pub progress: UserProgress,
    pub performance: UserPerformance,
}

/// Read-only progress and performance statistics.
#[derive(Clone)]
pub struct StatsService {
    stats: Arc<dyn StatsBackend>,
    credentials: Arc<dyn Credentials>,
}

impl StatsService {
    #[must_use]
    pub fn new(stats: Arc<dyn StatsBackend>, credentials: Arc<dyn Credentials>) -> Self {
        Self { stats, credentials }
    }

    fn surface(&self, err: api::ApiError) -> AttemptError {
        AttemptError::from_api(err, self.credentials.as_ref())
    }

    /// # Errors
    ///
    /// Returns `AttemptError` for auth or transport failures.
    pub async fn progress(&self) -> Result<UserProgress, AttemptError> {
        self.stats.progress().await.map_err(|err| self.surface(err))
    }

    /// Most recent completed attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` for auth or transport failures.
    pub async fn performance(&self, limit: u32) -> Result<UserPerformance, AttemptError> {
        let limit = if limit == 0 {
            DEFAULT_PERFORMANCE_LIMIT
        } else {
            limit
        };
        self.stats
            .performance(limit)
            .await
            .map_err(|err| self.surface(err))
    }

    /// # Errors
    ///
    /// Returns `AttemptError` for auth or transport failures.
    pub async fn summary(&self) -> Result<StatsSummary, AttemptError> {
        self.stats.summary().await.map_err(|err| self.surface(err))
    }

    /// Summary, per-topic progress and recent attempts in one call.
    ///
    /// # Errors
    ///
    /// Returns the first failing request's error.
    pub async fn overview(&self, limit: u32) -> Result<StatsOverview, AttemptError> {
        Ok(StatsOverview {
            summary: self.summary().await?,
            progress: self.progress().await?,
            performance: self.performance(limit).await?,
        })
    }
}
