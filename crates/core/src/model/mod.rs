mod attempt;
mod ids;
mod options;
mod quiz;
mod results;
mod stats;

pub use ids::{AttemptId, ParseIdError, QuizId, UserId};
pub use options::{OptionError, OptionLabel, OptionSet};

pub use attempt::{AnswerFeedback, AnswerSubmission, Attempt, AttemptRecordError};
pub use quiz::{DifficultyBand, DifficultyLevel, Page, Question, Quiz, QuizError, QuizListItem};
pub use results::{QuestionResult, ResultBreakdown, ResultError};
pub use stats::{RecentAttempt, StatsSummary, TopicProgress, UserPerformance, UserProgress};
