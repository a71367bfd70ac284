//! JSON shapes exchanged with the backend and their mapping into domain types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use forge_core::model::{
    AnswerFeedback, AnswerSubmission, Attempt, AttemptId, DifficultyLevel, OptionLabel,
    OptionSet, Page, Question, QuestionResult, Quiz, QuizId, QuizListItem, RecentAttempt,
    ResultBreakdown, UserId, UserPerformance,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

fn decode(err: impl std::fmt::Display) -> ApiError {
    ApiError::Decode(err.to_string())
}

//
// ─── TIMESTAMPS ────────────────────────────────────────────────────────────────
//

/// Accepts RFC 3339 as well as the naive UTC timestamps the backend emits.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, de};

    pub(crate) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub(crate) mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, de};

        pub(crate) fn deserialize<'de, D>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
            }
        }
    }
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// Both question shapes seen on the wire: fixed `option_a..option_d`
/// columns, or an `options` map keyed by label.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum QuestionDto {
    Columns {
        question_text: String,
        option_a: String,
        option_b: String,
        option_c: String,
        option_d: String,
    },
    Labeled {
        #[serde(alias = "question_text")]
        question: String,
        options: BTreeMap<String, String>,
    },
}

impl QuestionDto {
    fn into_parts(self) -> Result<(String, OptionSet), ApiError> {
        match self {
            Self::Columns {
                question_text,
                option_a,
                option_b,
                option_c,
                option_d,
            } => Ok((
                question_text,
                OptionSet::new(option_a, option_b, option_c, option_d),
            )),
            Self::Labeled { question, options } => {
                let pairs = options
                    .into_iter()
                    .map(|(key, text)| key.parse::<OptionLabel>().map(|label| (label, text)))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(decode)?;
                let options = OptionSet::from_labeled(pairs).map_err(decode)?;
                Ok((question, options))
            }
        }
    }

    pub(crate) fn into_question(self) -> Result<Question, ApiError> {
        let (text, options) = self.into_parts()?;
        Question::new(text, options).map_err(decode)
    }
}

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

fn default_topic() -> String {
    "general".to_string()
}

fn default_difficulty() -> u8 {
    3
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizDto {
    id: QuizId,
    user_id: UserId,
    #[serde(default)]
    summary_id: Option<Uuid>,
    title: String,
    #[serde(default = "default_topic")]
    topic: String,
    #[serde(default = "default_difficulty")]
    difficulty_level: u8,
    #[serde(deserialize_with = "timestamp::deserialize")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    questions: Vec<QuestionDto>,
}

impl QuizDto {
    pub(crate) fn into_domain(self) -> Result<Quiz, ApiError> {
        let difficulty = DifficultyLevel::new(self.difficulty_level).map_err(decode)?;
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDto::into_question)
            .collect::<Result<Vec<_>, _>>()?;
        let quiz = Quiz::new(
            self.id,
            self.user_id,
            self.title,
            self.topic,
            difficulty,
            self.created_at,
            questions,
        )
        .map_err(decode)?;
        Ok(quiz.with_summary_id(self.summary_id))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizListDto {
    items: Vec<QuizDto>,
    total: u64,
    #[serde(default)]
    skip: u64,
    #[serde(default)]
    limit: u64,
}

impl QuizListDto {
    pub(crate) fn into_domain(self) -> Result<Page<QuizListItem>, ApiError> {
        let items = self
            .items
            .into_iter()
            .map(|dto| dto.into_domain().map(|quiz| QuizListItem::from(&quiz)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: self.total,
            skip: self.skip,
            limit: self.limit,
        })
    }
}

//
// ─── ATTEMPTS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(crate) struct CreateAttemptBody {
    pub(crate) quiz_id: QuizId,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerBody {
    question_index: usize,
    selected_option: OptionLabel,
}

impl From<AnswerSubmission> for AnswerBody {
    fn from(answer: AnswerSubmission) -> Self {
        Self {
            question_index: answer.question_index,
            selected_option: answer.selected_option,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptDto {
    id: AttemptId,
    quiz_id: QuizId,
    user_id: UserId,
    #[serde(deserialize_with = "timestamp::deserialize")]
    started_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    correct_answers: Vec<OptionLabel>,
    #[serde(default)]
    user_answers: Vec<OptionLabel>,
    #[serde(default)]
    randomized_questions: Option<Vec<QuestionDto>>,
}

impl AttemptDto {
    pub(crate) fn into_domain(self) -> Result<Attempt, ApiError> {
        let attempt = Attempt::from_persisted(
            self.id,
            self.quiz_id,
            self.user_id,
            self.started_at,
            self.completed_at,
            self.score,
            self.correct_answers,
            self.user_answers,
        )
        .map_err(decode)?;

        match self.randomized_questions {
            Some(layout) => {
                let questions = layout
                    .into_iter()
                    .map(QuestionDto::into_question)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(attempt.with_randomized_questions(questions))
            }
            None => Ok(attempt),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedbackDto {
    is_correct: bool,
    correct_option: OptionLabel,
    #[serde(default)]
    explanation: String,
    selected_option: OptionLabel,
    #[serde(default)]
    score_so_far: Option<f64>,
}

impl From<FeedbackDto> for AnswerFeedback {
    fn from(dto: FeedbackDto) -> Self {
        Self {
            is_correct: dto.is_correct,
            correct_option: dto.correct_option,
            explanation: dto.explanation,
            selected_option: dto.selected_option,
            score_so_far: dto.score_so_far,
        }
    }
}

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct ResultRowDto {
    #[serde(flatten)]
    question: QuestionDto,
    correct_option: OptionLabel,
    selected_option: OptionLabel,
    is_correct: bool,
    #[serde(default)]
    explanation: String,
}

impl ResultRowDto {
    fn into_domain(self) -> Result<QuestionResult, ApiError> {
        let (question_text, options) = self.question.into_parts()?;
        Ok(QuestionResult {
            question_text,
            options,
            correct_option: self.correct_option,
            selected_option: self.selected_option,
            is_correct: self.is_correct,
            explanation: self.explanation,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultsDto {
    attempt_id: AttemptId,
    quiz_id: QuizId,
    score: f64,
    total_questions: u32,
    correct_answers: u32,
    incorrect_answers: u32,
    #[serde(deserialize_with = "timestamp::deserialize")]
    completed_at: DateTime<Utc>,
    questions: Vec<ResultRowDto>,
}

impl ResultsDto {
    pub(crate) fn into_domain(self) -> Result<ResultBreakdown, ApiError> {
        let rows = self
            .questions
            .into_iter()
            .map(ResultRowDto::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        ResultBreakdown::from_persisted(
            self.attempt_id,
            self.quiz_id,
            self.score,
            self.total_questions,
            self.correct_answers,
            self.incorrect_answers,
            self.completed_at,
            rows,
        )
        .map_err(decode)
    }
}

//
// ─── STATS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct RecentAttemptDto {
    attempt_id: AttemptId,
    quiz_id: QuizId,
    quiz_title: String,
    topic: String,
    difficulty_level: u8,
    score: f64,
    #[serde(deserialize_with = "timestamp::deserialize")]
    completed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PerformanceDto {
    recent_attempts: Vec<RecentAttemptDto>,
}

impl From<PerformanceDto> for UserPerformance {
    fn from(dto: PerformanceDto) -> Self {
        Self {
            recent_attempts: dto
                .recent_attempts
                .into_iter()
                .map(|row| RecentAttempt {
                    attempt_id: row.attempt_id,
                    quiz_id: row.quiz_id,
                    quiz_title: row.quiz_title,
                    topic: row.topic,
                    difficulty_level: row.difficulty_level,
                    score: row.score,
                    completed_at: row.completed_at,
                })
                .collect(),
        }
    }
}

//
// ─── AUTH / ERRORS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub(crate) email: &'a str,
    pub(crate) password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthDto {
    pub(crate) status: String,
}

/// Extract FastAPI's `{"detail": ...}` from an error body.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        other => Some(other.to_string()),
    }
}
