use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AttemptId, QuizId};

/// Completed-attempt aggregates for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicProgress {
    pub topic: String,
    pub total_attempts: u32,
    pub avg_score: f64,
    pub max_score: f64,
    pub min_score: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProgress {
    pub total_attempts: u32,
    pub avg_score_overall: f64,
    pub progress_by_topic: Vec<TopicProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentAttempt {
    pub attempt_id: AttemptId,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub topic: String,
    pub difficulty_level: u8,
    pub score: f64,
    pub completed_at: DateTime<Utc>,
}

/// Most recent completed attempts, newest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserPerformance {
    pub recent_attempts: Vec<RecentAttempt>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_summaries: u32,
    pub total_quizzes: u32,
    pub total_completed_attempts: u32,
    pub avg_score: f64,
    pub best_score: f64,
    pub unique_topics_studied: u32,
}
