use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use forge_core::Clock;
use forge_core::model::{
    AnswerFeedback, AnswerSubmission, Attempt, AttemptId, DifficultyLevel, OptionLabel,
    OptionSet, Page, Question, QuestionResult, Quiz, QuizId, QuizListItem, RecentAttempt,
    ResultBreakdown, StatsSummary, TopicProgress, UserId, UserPerformance, UserProgress,
};
use forge_core::scoring::running_score;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::backend::{QuizBackend, StatsBackend};
use crate::error::ApiError;

/// Backend calls that can be counted and made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListQuizzes,
    GetQuiz,
    CreateAttempt,
    SubmitAnswer,
    CompleteAttempt,
    GetResults,
}

/// Seed data for one quiz, including the answer key the client never sees.
#[derive(Debug, Clone)]
pub struct QuizFixture {
    title: String,
    topic: String,
    difficulty: DifficultyLevel,
    questions: Vec<FixtureQuestion>,
}

#[derive(Debug, Clone)]
struct FixtureQuestion {
    text: String,
    options: OptionSet,
    correct: OptionLabel,
    explanation: String,
}

impl QuizFixture {
    #[must_use]
    pub fn new(title: impl Into<String>, topic: impl Into<String>, difficulty: DifficultyLevel) -> Self {
        Self {
            title: title.into(),
            topic: topic.into(),
            difficulty,
            questions: Vec::new(),
        }
    }

    /// Append a question; `options` are given in A..D order.
    #[must_use]
    pub fn question(
        mut self,
        text: impl Into<String>,
        options: [&str; 4],
        correct: OptionLabel,
        explanation: impl Into<String>,
    ) -> Self {
        let [a, b, c, d] = options;
        self.questions.push(FixtureQuestion {
            text: text.into(),
            options: OptionSet::new(a, b, c, d),
            correct,
            explanation: explanation.into(),
        });
        self
    }
}

struct StoredQuiz {
    quiz: Quiz,
    questions: Vec<FixtureQuestion>,
}

/// One question as laid out for a specific attempt.
struct LayoutSlot {
    question: Question,
    correct: OptionLabel,
    explanation: String,
}

struct RecordedAnswer {
    selected: OptionLabel,
    is_correct: bool,
}

struct StoredAttempt {
    id: AttemptId,
    quiz_id: QuizId,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    score: Option<f64>,
    layout: Vec<LayoutSlot>,
    answers: BTreeMap<usize, RecordedAnswer>,
}

impl StoredAttempt {
    fn correct_count(&self) -> usize {
        self.answers.values().filter(|a| a.is_correct).count()
    }

    fn to_attempt(&self, user_id: UserId) -> Result<Attempt, ApiError> {
        // The answer key is only exposed once the attempt is finished.
        let correct_options = if self.completed_at.is_some() {
            self.layout.iter().map(|slot| slot.correct).collect()
        } else {
            Vec::new()
        };
        let user_answers = self.answers.values().map(|a| a.selected).collect();
        let attempt = Attempt::from_persisted(
            self.id,
            self.quiz_id,
            user_id,
            self.started_at,
            self.completed_at,
            self.score,
            correct_options,
            user_answers,
        )
        .map_err(forge_core::Error::from)?;
        Ok(attempt.with_randomized_questions(
            self.layout.iter().map(|slot| slot.question.clone()).collect(),
        ))
    }
}

struct State {
    clock: Clock,
    rng: StdRng,
    shuffle_options: bool,
    order: Vec<QuizId>,
    quizzes: HashMap<QuizId, StoredQuiz>,
    attempts: HashMap<AttemptId, StoredAttempt>,
    failures: HashMap<Operation, VecDeque<ApiError>>,
    calls: HashMap<Operation, usize>,
    summaries: u32,
}

impl State {
    /// Count the call and pop an injected failure, if one is queued.
    fn enter(&mut self, op: Operation) -> Result<(), ApiError> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn layout_for(&mut self, questions: &[FixtureQuestion]) -> Result<Vec<LayoutSlot>, ApiError> {
        questions
            .iter()
            .map(|fixture| -> Result<LayoutSlot, ApiError> {
                let mut order = OptionLabel::ALL;
                if self.shuffle_options {
                    order.shuffle(&mut self.rng);
                }
                let options = OptionSet::new(
                    fixture.options.get(order[0]),
                    fixture.options.get(order[1]),
                    fixture.options.get(order[2]),
                    fixture.options.get(order[3]),
                );
                let position = order
                    .iter()
                    .position(|label| *label == fixture.correct)
                    .unwrap_or_default();
                let correct = OptionLabel::from_index(position)
                    .map_err(forge_core::Error::from)?;
                let question = Question::new(fixture.text.clone(), options)
                    .map_err(forge_core::Error::from)?;
                Ok(LayoutSlot {
                    question,
                    correct,
                    explanation: fixture.explanation.clone(),
                })
            })
            .collect()
    }

    fn completed(&self) -> impl Iterator<Item = (&StoredAttempt, &Quiz)> {
        self.attempts.values().filter_map(|attempt| {
            attempt.completed_at?;
            self.quizzes
                .get(&attempt.quiz_id)
                .map(|stored| (attempt, &stored.quiz))
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// In-process stand-in for the StudyForge backend.
///
/// Follows the server contract closely enough to drive the attempt engine
/// end to end: per-attempt option shuffling, single-answer-per-question,
/// completion scoring and results gating.
#[derive(Clone)]
pub struct InMemoryBackend {
    user_id: UserId,
    state: Arc<Mutex<State>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng(), Clock::default())
    }

    /// Deterministic shuffling and timestamps.
    #[must_use]
    pub fn seeded(seed: u64, clock: Clock) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), clock)
    }

    fn with_rng(rng: StdRng, clock: Clock) -> Self {
        Self {
            user_id: UserId::random(),
            state: Arc::new(Mutex::new(State {
                clock,
                rng,
                shuffle_options: true,
                order: Vec::new(),
                quizzes: HashMap::new(),
                attempts: HashMap::new(),
                failures: HashMap::new(),
                calls: HashMap::new(),
                summaries: 0,
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, ApiError> {
        self.state
            .lock()
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    /// Keep options in fixture order instead of shuffling per attempt.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the state lock is poisoned.
    pub fn set_shuffle_options(&self, shuffle: bool) -> Result<(), ApiError> {
        self.lock()?.shuffle_options = shuffle;
        Ok(())
    }

    /// Register a quiz and return its id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the fixture is not a valid quiz.
    pub fn insert_quiz(&self, fixture: QuizFixture) -> Result<QuizId, ApiError> {
        let mut state = self.lock()?;
        let questions = fixture
            .questions
            .iter()
            .map(|q| Question::new(q.text.clone(), q.options.clone()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::Rejected {
                status: 422,
                detail: e.to_string(),
            })?;
        let quiz = Quiz::new(
            QuizId::random(),
            self.user_id,
            fixture.title,
            fixture.topic,
            fixture.difficulty,
            state.clock.now(),
            questions,
        )
        .map_err(|e| ApiError::Rejected {
            status: 422,
            detail: e.to_string(),
        })?;

        let id = quiz.id();
        state.order.push(id);
        state.quizzes.insert(
            id,
            StoredQuiz {
                quiz,
                questions: fixture.questions,
            },
        );
        Ok(id)
    }

    /// Drop a quiz, as if it was deleted on the server.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the state lock is poisoned.
    pub fn remove_quiz(&self, id: QuizId) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        state.quizzes.remove(&id);
        state.order.retain(|other| *other != id);
        Ok(())
    }

    /// Make the next call of `op` fail with `err`. Failures queue up.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the state lock is poisoned.
    pub fn fail_next(&self, op: Operation, err: ApiError) -> Result<(), ApiError> {
        self.lock()?.failures.entry(op).or_default().push_back(err);
        Ok(())
    }

    /// Number of times `op` has been called, failed calls included.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the state lock is poisoned.
    pub fn calls(&self, op: Operation) -> Result<usize, ApiError> {
        Ok(self.lock()?.calls.get(&op).copied().unwrap_or_default())
    }

    /// Step the backend clock (fixed clocks only).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the state lock is poisoned.
    pub fn advance_clock(&self, delta: Duration) -> Result<(), ApiError> {
        self.lock()?.clock.advance(delta);
        Ok(())
    }

    /// Count a generated summary for the stats overview.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the state lock is poisoned.
    pub fn record_summary(&self) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        state.summaries = state.summaries.saturating_add(1);
        Ok(())
    }

    /// Correct label of `question_index` in the attempt's shuffled layout.
    ///
    /// Test helper; a real client never has this before answering.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown attempts or indices.
    pub fn answer_key(
        &self,
        attempt_id: AttemptId,
        question_index: usize,
    ) -> Result<OptionLabel, ApiError> {
        let state = self.lock()?;
        state
            .attempts
            .get(&attempt_id)
            .and_then(|attempt| attempt.layout.get(question_index))
            .map(|slot| slot.correct)
            .ok_or_else(|| ApiError::NotFound("question".into()))
    }
}

fn rejected(detail: &str) -> ApiError {
    ApiError::Rejected {
        status: 400,
        detail: detail.to_string(),
    }
}

#[async_trait]
impl QuizBackend for InMemoryBackend {
    async fn list_quizzes(&self, skip: u64, limit: u64) -> Result<Page<QuizListItem>, ApiError> {
        let mut state = self.lock()?;
        state.enter(Operation::ListQuizzes)?;
        let skip_n = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit_n = usize::try_from(limit).unwrap_or(usize::MAX);
        let items = state
            .order
            .iter()
            .skip(skip_n)
            .take(limit_n)
            .filter_map(|id| state.quizzes.get(id))
            .map(|stored| QuizListItem::from(&stored.quiz))
            .collect();
        Ok(Page {
            items,
            total: state.order.len() as u64,
            skip,
            limit,
        })
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, ApiError> {
        let mut state = self.lock()?;
        state.enter(Operation::GetQuiz)?;
        state
            .quizzes
            .get(&id)
            .map(|stored| stored.quiz.clone())
            .ok_or_else(|| ApiError::NotFound("quiz not found".into()))
    }

    async fn create_attempt(&self, quiz_id: QuizId) -> Result<Attempt, ApiError> {
        let mut state = self.lock()?;
        state.enter(Operation::CreateAttempt)?;
        let fixtures = state
            .quizzes
            .get(&quiz_id)
            .map(|stored| stored.questions.clone())
            .ok_or_else(|| ApiError::NotFound("quiz not found".into()))?;

        let layout = state.layout_for(&fixtures)?;
        let stored = StoredAttempt {
            id: AttemptId::random(),
            quiz_id,
            started_at: state.clock.now(),
            completed_at: None,
            score: None,
            layout,
            answers: BTreeMap::new(),
        };
        let attempt = stored.to_attempt(self.user_id)?;
        state.attempts.insert(stored.id, stored);
        Ok(attempt)
    }

    async fn submit_answer(
        &self,
        attempt_id: AttemptId,
        answer: AnswerSubmission,
    ) -> Result<AnswerFeedback, ApiError> {
        let mut state = self.lock()?;
        state.enter(Operation::SubmitAnswer)?;
        let attempt = state
            .attempts
            .get_mut(&attempt_id)
            .ok_or_else(|| ApiError::NotFound("attempt not found".into()))?;

        if attempt.completed_at.is_some() {
            return Err(rejected("attempt already completed"));
        }
        let slot = attempt
            .layout
            .get(answer.question_index)
            .ok_or_else(|| ApiError::NotFound("question not found".into()))?;
        if attempt.answers.contains_key(&answer.question_index) {
            return Err(rejected("question already answered"));
        }

        let is_correct = slot.correct == answer.selected_option;
        let correct_option = slot.correct;
        let explanation = slot.explanation.clone();
        attempt.answers.insert(
            answer.question_index,
            RecordedAnswer {
                selected: answer.selected_option,
                is_correct,
            },
        );

        Ok(AnswerFeedback {
            is_correct,
            correct_option,
            explanation,
            selected_option: answer.selected_option,
            score_so_far: Some(running_score(attempt.correct_count(), attempt.answers.len())),
        })
    }

    async fn complete_attempt(&self, attempt_id: AttemptId) -> Result<Attempt, ApiError> {
        let mut state = self.lock()?;
        state.enter(Operation::CompleteAttempt)?;
        let now = state.clock.now();
        let attempt = state
            .attempts
            .get_mut(&attempt_id)
            .ok_or_else(|| ApiError::NotFound("attempt not found".into()))?;

        if attempt.completed_at.is_some() {
            return Err(rejected("attempt already completed"));
        }
        if attempt.answers.is_empty() {
            return Err(rejected("no questions answered"));
        }

        attempt.score = Some(running_score(attempt.correct_count(), attempt.answers.len()));
        attempt.completed_at = Some(now.max(attempt.started_at));
        attempt.to_attempt(self.user_id)
    }

    async fn get_results(&self, attempt_id: AttemptId) -> Result<ResultBreakdown, ApiError> {
        let mut state = self.lock()?;
        state.enter(Operation::GetResults)?;
        let attempt = state
            .attempts
            .get(&attempt_id)
            .ok_or_else(|| ApiError::NotFound("attempt not found".into()))?;

        let (Some(completed_at), Some(score)) = (attempt.completed_at, attempt.score) else {
            return Err(rejected("attempt not completed yet"));
        };

        let rows: Vec<QuestionResult> = attempt
            .answers
            .iter()
            .filter_map(|(index, answer)| {
                attempt.layout.get(*index).map(|slot| QuestionResult {
                    question_text: slot.question.text().to_string(),
                    options: slot.question.options().clone(),
                    correct_option: slot.correct,
                    selected_option: answer.selected,
                    is_correct: answer.is_correct,
                    explanation: slot.explanation.clone(),
                })
            })
            .collect();

        let total = u32::try_from(rows.len()).unwrap_or(u32::MAX);
        let correct = u32::try_from(attempt.correct_count()).unwrap_or(u32::MAX);
        let breakdown = ResultBreakdown::from_persisted(
            attempt.id,
            attempt.quiz_id,
            score,
            total,
            correct,
            total.saturating_sub(correct),
            completed_at,
            rows,
        )
        .map_err(forge_core::Error::from)?;
        Ok(breakdown)
    }
}

#[async_trait]
impl StatsBackend for InMemoryBackend {
    async fn progress(&self) -> Result<UserProgress, ApiError> {
        let state = self.lock()?;
        let mut by_topic: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut all = Vec::new();
        for (attempt, quiz) in state.completed() {
            let score = attempt.score.unwrap_or_default();
            by_topic.entry(quiz.topic().to_string()).or_default().push(score);
            all.push(score);
        }

        let progress_by_topic = by_topic
            .into_iter()
            .map(|(topic, scores)| TopicProgress {
                topic,
                total_attempts: u32::try_from(scores.len()).unwrap_or(u32::MAX),
                avg_score: round2(mean(&scores)),
                max_score: round2(scores.iter().copied().fold(f64::MIN, f64::max)),
                min_score: round2(scores.iter().copied().fold(f64::MAX, f64::min)),
            })
            .collect();

        Ok(UserProgress {
            total_attempts: u32::try_from(all.len()).unwrap_or(u32::MAX),
            avg_score_overall: round2(mean(&all)),
            progress_by_topic,
        })
    }

    async fn performance(&self, limit: u32) -> Result<UserPerformance, ApiError> {
        let state = self.lock()?;
        let mut rows: Vec<RecentAttempt> = state
            .completed()
            .filter_map(|(attempt, quiz)| {
                Some(RecentAttempt {
                    attempt_id: attempt.id,
                    quiz_id: quiz.id(),
                    quiz_title: quiz.title().to_string(),
                    topic: quiz.topic().to_string(),
                    difficulty_level: quiz.difficulty().value(),
                    score: round2(attempt.score?),
                    completed_at: attempt.completed_at?,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(UserPerformance {
            recent_attempts: rows,
        })
    }

    async fn summary(&self) -> Result<StatsSummary, ApiError> {
        let state = self.lock()?;
        let scores: Vec<f64> = state
            .completed()
            .filter_map(|(attempt, _)| attempt.score)
            .collect();
        let topics: std::collections::BTreeSet<&str> =
            state.completed().map(|(_, quiz)| quiz.topic()).collect();

        Ok(StatsSummary {
            total_summaries: state.summaries,
            total_quizzes: u32::try_from(state.quizzes.len()).unwrap_or(u32::MAX),
            total_completed_attempts: u32::try_from(scores.len()).unwrap_or(u32::MAX),
            avg_score: round2(mean(&scores)),
            best_score: round2(scores.iter().copied().fold(0.0, f64::max)),
            unique_topics_studied: u32::try_from(topics.len()).unwrap_or(u32::MAX),
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    avg
}
