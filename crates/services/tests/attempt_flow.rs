use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use api::{
    ApiError, Credentials, InMemoryBackend, Operation, QuizBackend, QuizFixture,
    StaticCredentials,
};
use forge_core::model::{
    AnswerFeedback, AnswerSubmission, Attempt, AttemptId, DifficultyLevel, OptionLabel, Page,
    Quiz, QuizId, QuizListItem, ResultBreakdown,
};
use forge_core::time::fixed_clock;
use services::{
    AttemptError, AttemptFlow, AttemptLoopService, AttemptSession, Phase, Redirect, Step,
    Submitted, ValidationError,
};

struct Harness {
    backend: InMemoryBackend,
    credentials: Arc<StaticCredentials>,
    service: AttemptLoopService,
}

fn harness() -> Harness {
    let backend = InMemoryBackend::seeded(42, fixed_clock());
    let credentials = Arc::new(StaticCredentials::new("test-token"));
    let service = AttemptLoopService::new(Arc::new(backend.clone()), credentials.clone());
    Harness {
        backend,
        credentials,
        service,
    }
}

fn seed(backend: &InMemoryBackend, questions: usize) -> QuizId {
    let pool = [
        ("Which keyword declares an immutable binding?", ["let", "mut", "var", "const fn"], OptionLabel::A),
        ("Which type owns a heap string?", ["&str", "String", "char", "[u8]"], OptionLabel::B),
        ("Which macro formats to a String?", ["println!", "write!", "format!", "panic!"], OptionLabel::C),
    ];
    let fixture = pool.iter().take(questions).fold(
        QuizFixture::new("Rust basics", "rust", DifficultyLevel::default()),
        |fixture, (text, options, correct)| {
            fixture.question(*text, *options, *correct, "See the book.")
        },
    );
    backend.insert_quiz(fixture).unwrap()
}

fn wrong(label: OptionLabel) -> OptionLabel {
    OptionLabel::from_index((label.index() + 1) % 4).unwrap()
}

async fn answer(h: &Harness, session: &mut AttemptSession, correct: bool) {
    let key = h
        .backend
        .answer_key(session.attempt_id(), session.current_index())
        .unwrap();
    let pick = if correct { key } else { wrong(key) };
    session.select_option(pick).unwrap();
    let feedback = h
        .service
        .submit_answer(session)
        .await
        .unwrap()
        .into_feedback()
        .unwrap();
    assert_eq!(feedback.is_correct, correct);
    assert_eq!(feedback.correct_option, key);
}

#[tokio::test]
async fn single_correct_answer_scores_full_marks() {
    let h = harness();
    let quiz_id = seed(&h.backend, 1);

    let mut session = h.service.start_attempt(quiz_id).await.unwrap();
    assert_eq!(session.phase(), Phase::Answering);
    answer(&h, &mut session, true).await;
    assert_eq!(session.phase(), Phase::Answered);

    let step = h.service.advance(&mut session).await.unwrap();
    assert_eq!(step, Step::Completed(100.0));
    assert_eq!(session.phase(), Phase::Completed);
    assert_eq!(session.attempt().score(), Some(100.0));

    let results = h.service.load_results(&mut session).await.unwrap();
    assert_eq!(results.correct_answers(), 1);
    assert_eq!(session.phase(), Phase::ResultsReady);
}

#[tokio::test]
async fn wrong_then_right_scores_half() {
    let h = harness();
    let quiz_id = seed(&h.backend, 2);

    let mut session = h.service.start_attempt(quiz_id).await.unwrap();
    answer(&h, &mut session, false).await;
    assert_eq!(h.service.advance(&mut session).await.unwrap(), Step::Next(1));
    answer(&h, &mut session, true).await;
    assert_eq!(
        h.service.advance(&mut session).await.unwrap(),
        Step::Completed(50.0)
    );

    let results = h.service.load_results(&mut session).await.unwrap();
    assert_eq!(results.score(), 50.0);
    let incorrect: Vec<_> = results
        .questions()
        .iter()
        .enumerate()
        .filter(|(_, row)| !row.is_correct)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(incorrect, vec![0]);
}

#[tokio::test]
async fn missing_quiz_fails_on_entry() {
    let h = harness();
    let mut flow = AttemptFlow::default();
    assert_eq!(flow.phase(), Phase::NotStarted);

    let err = flow.start(&h.service, QuizId::random()).await.unwrap_err();
    assert!(matches!(err, AttemptError::NotFound(_)));
    assert_eq!(flow.phase(), Phase::Failed);
    assert!(flow.session().is_none());
    assert_eq!(flow.redirect(), Some(Redirect::Listing));
    assert_eq!(h.backend.calls(Operation::CreateAttempt).unwrap(), 0);
}

#[tokio::test]
async fn submit_timeout_keeps_question_answerable() {
    let h = harness();
    let quiz_id = seed(&h.backend, 2);
    let mut session = h.service.start_attempt(quiz_id).await.unwrap();

    h.backend
        .fail_next(Operation::SubmitAnswer, ApiError::Transport("timed out".into()))
        .unwrap();
    let key = h.backend.answer_key(session.attempt_id(), 0).unwrap();
    session.select_option(key).unwrap();

    let err = h.service.submit_answer(&mut session).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(session.phase(), Phase::Answering);
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.selected_option(), Some(key));
    assert!(session.feedback().is_none());

    let submitted = h.service.submit_answer(&mut session).await.unwrap();
    assert!(submitted.feedback().unwrap().is_correct);
    assert_eq!(h.backend.calls(Operation::GetQuiz).unwrap(), 1);
    assert_eq!(h.backend.calls(Operation::SubmitAnswer).unwrap(), 2);
}

#[tokio::test]
async fn expired_token_redirects_to_login() {
    let h = harness();
    let quiz_id = seed(&h.backend, 1);
    h.backend
        .fail_next(Operation::GetQuiz, ApiError::Unauthorized)
        .unwrap();

    let mut flow = AttemptFlow::default();
    let err = flow.start(&h.service, quiz_id).await.unwrap_err();
    assert_eq!(err, AttemptError::Auth);
    assert_eq!(flow.redirect(), Some(Redirect::Login));
    assert_eq!(h.credentials.token(), None);
}

#[tokio::test]
async fn answered_question_never_reaches_backend_twice() {
    let h = harness();
    let quiz_id = seed(&h.backend, 2);
    let mut session = h.service.start_attempt(quiz_id).await.unwrap();
    answer(&h, &mut session, true).await;

    let err = h.service.submit_answer(&mut session).await.unwrap_err();
    assert_eq!(err, AttemptError::Validation(ValidationError::AlreadyAnswered));
    assert_eq!(h.backend.calls(Operation::SubmitAnswer).unwrap(), 1);
}

#[tokio::test]
async fn failed_completion_can_be_retried() {
    let h = harness();
    let quiz_id = seed(&h.backend, 1);
    let mut session = h.service.start_attempt(quiz_id).await.unwrap();
    answer(&h, &mut session, false).await;

    h.backend
        .fail_next(Operation::CompleteAttempt, ApiError::Server { status: 503 })
        .unwrap();
    let err = h.service.advance(&mut session).await.unwrap_err();
    assert_eq!(err, AttemptError::Server { status: 503 });
    assert_eq!(session.phase(), Phase::Completing);
    assert!(!session.is_in_flight());

    let err = h.service.load_results(&mut session).await.unwrap_err();
    assert_eq!(
        err,
        AttemptError::Validation(ValidationError::WrongPhase(Phase::Completing))
    );

    assert_eq!(h.service.complete(&mut session).await.unwrap(), 0.0);
    assert_eq!(session.phase(), Phase::Completed);
}

#[tokio::test]
async fn results_failure_ends_the_session() {
    let h = harness();
    let quiz_id = seed(&h.backend, 1);
    let mut session = h.service.start_attempt(quiz_id).await.unwrap();
    answer(&h, &mut session, true).await;
    h.service.advance(&mut session).await.unwrap();

    h.backend
        .fail_next(Operation::GetResults, ApiError::Transport("reset".into()))
        .unwrap();
    let err = h.service.load_results(&mut session).await.unwrap_err();
    assert!(matches!(err, AttemptError::Network(_)));
    assert_eq!(session.phase(), Phase::Failed);
    assert_eq!(session.redirect(), Some(Redirect::Listing));

    let flow = AttemptFlow::from(session);
    assert_eq!(flow.phase(), Phase::Failed);
    assert!(flow.failure().is_some());
}

#[tokio::test]
async fn past_results_can_be_fetched_by_id() {
    let h = harness();
    let quiz_id = seed(&h.backend, 3);
    let mut session = h.service.start_attempt(quiz_id).await.unwrap();
    for correct in [true, true, false] {
        answer(&h, &mut session, correct).await;
        h.service.advance(&mut session).await.unwrap();
    }

    let results = h.service.fetch_results(session.attempt_id()).await.unwrap();
    assert_eq!(results.total_questions(), 3);
    assert_eq!(results.incorrect_indices(), vec![2]);
}

/// Backend that answers attempts for the wrong quiz.
struct MismatchedBackend {
    inner: InMemoryBackend,
    other: QuizId,
}

#[async_trait::async_trait]
impl QuizBackend for MismatchedBackend {
    async fn list_quizzes(&self, skip: u64, limit: u64) -> Result<Page<QuizListItem>, ApiError> {
        self.inner.list_quizzes(skip, limit).await
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, ApiError> {
        self.inner.get_quiz(id).await
    }

    async fn create_attempt(&self, _quiz_id: QuizId) -> Result<Attempt, ApiError> {
        self.inner.create_attempt(self.other).await
    }

    async fn submit_answer(
        &self,
        attempt_id: AttemptId,
        answer: AnswerSubmission,
    ) -> Result<AnswerFeedback, ApiError> {
        self.inner.submit_answer(attempt_id, answer).await
    }

    async fn complete_attempt(&self, attempt_id: AttemptId) -> Result<Attempt, ApiError> {
        self.inner.complete_attempt(attempt_id).await
    }

    async fn get_results(&self, attempt_id: AttemptId) -> Result<ResultBreakdown, ApiError> {
        self.inner.get_results(attempt_id).await
    }
}

#[tokio::test]
async fn attempt_for_another_quiz_is_rejected() {
    let inner = InMemoryBackend::seeded(1, fixed_clock());
    let wanted = seed(&inner, 2);
    let other = seed(&inner, 1);
    let service = AttemptLoopService::new(
        Arc::new(MismatchedBackend { inner, other }),
        Arc::new(StaticCredentials::anonymous()),
    );

    let mut flow = AttemptFlow::default();
    let err = flow.start(&service, wanted).await.unwrap_err();
    assert!(matches!(err, AttemptError::InvalidRecord(_)));
    assert_eq!(flow.redirect(), Some(Redirect::Listing));
}

/// Backend that performs a call and then loses its response once.
struct LostAckBackend {
    inner: InMemoryBackend,
    drop_submit: AtomicBool,
    drop_complete: AtomicBool,
}

impl LostAckBackend {
    fn new(inner: InMemoryBackend) -> Self {
        Self {
            inner,
            drop_submit: AtomicBool::new(false),
            drop_complete: AtomicBool::new(false),
        }
    }
}

fn timed_out() -> ApiError {
    ApiError::Transport("timed out".into())
}

#[async_trait::async_trait]
impl QuizBackend for LostAckBackend {
    async fn list_quizzes(&self, skip: u64, limit: u64) -> Result<Page<QuizListItem>, ApiError> {
        self.inner.list_quizzes(skip, limit).await
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, ApiError> {
        self.inner.get_quiz(id).await
    }

    async fn create_attempt(&self, quiz_id: QuizId) -> Result<Attempt, ApiError> {
        self.inner.create_attempt(quiz_id).await
    }

    async fn submit_answer(
        &self,
        attempt_id: AttemptId,
        answer: AnswerSubmission,
    ) -> Result<AnswerFeedback, ApiError> {
        let feedback = self.inner.submit_answer(attempt_id, answer).await?;
        if self.drop_submit.swap(false, Ordering::SeqCst) {
            return Err(timed_out());
        }
        Ok(feedback)
    }

    async fn complete_attempt(&self, attempt_id: AttemptId) -> Result<Attempt, ApiError> {
        let attempt = self.inner.complete_attempt(attempt_id).await?;
        if self.drop_complete.swap(false, Ordering::SeqCst) {
            return Err(timed_out());
        }
        Ok(attempt)
    }

    async fn get_results(&self, attempt_id: AttemptId) -> Result<ResultBreakdown, ApiError> {
        self.inner.get_results(attempt_id).await
    }
}

fn lost_ack_service(inner: &InMemoryBackend) -> (Arc<LostAckBackend>, AttemptLoopService) {
    let backend = Arc::new(LostAckBackend::new(inner.clone()));
    let service = AttemptLoopService::new(
        Arc::clone(&backend) as Arc<dyn QuizBackend>,
        Arc::new(StaticCredentials::new("test-token")),
    );
    (backend, service)
}

#[tokio::test]
async fn completion_survives_a_lost_acknowledgement() {
    let inner = InMemoryBackend::seeded(7, fixed_clock());
    let quiz_id = seed(&inner, 1);
    let (backend, service) = lost_ack_service(&inner);

    let mut session = service.start_attempt(quiz_id).await.unwrap();
    let key = inner.answer_key(session.attempt_id(), 0).unwrap();
    session.select_option(key).unwrap();
    service.submit_answer(&mut session).await.unwrap();

    backend.drop_complete.store(true, Ordering::SeqCst);
    let err = service.advance(&mut session).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(session.phase(), Phase::Completing);

    assert_eq!(service.complete(&mut session).await.unwrap(), 100.0);
    assert_eq!(session.phase(), Phase::ResultsReady);

    let results = service.load_results(&mut session).await.unwrap();
    assert_eq!(results.correct_answers(), 1);
    assert_eq!(inner.calls(Operation::CompleteAttempt).unwrap(), 2);
    assert_eq!(inner.calls(Operation::GetResults).unwrap(), 1);
}

#[tokio::test]
async fn genuine_completion_rejection_keeps_completing() {
    let h = harness();
    let quiz_id = seed(&h.backend, 1);
    let mut session = h.service.start_attempt(quiz_id).await.unwrap();
    answer(&h, &mut session, true).await;

    h.backend
        .fail_next(
            Operation::CompleteAttempt,
            ApiError::Rejected {
                status: 400,
                detail: "no questions answered".into(),
            },
        )
        .unwrap();
    let err = h.service.advance(&mut session).await.unwrap_err();
    assert_eq!(err, AttemptError::Rejected("no questions answered".into()));
    assert_eq!(session.phase(), Phase::Completing);
    assert!(!session.is_in_flight());
    assert_eq!(h.backend.calls(Operation::GetResults).unwrap(), 1);

    assert_eq!(h.service.complete(&mut session).await.unwrap(), 100.0);
    assert_eq!(session.phase(), Phase::Completed);
}

#[tokio::test]
async fn answer_survives_a_lost_acknowledgement() {
    let inner = InMemoryBackend::seeded(9, fixed_clock());
    let quiz_id = seed(&inner, 2);
    let (backend, service) = lost_ack_service(&inner);

    let mut session = service.start_attempt(quiz_id).await.unwrap();
    let key = inner.answer_key(session.attempt_id(), 0).unwrap();
    session.select_option(key).unwrap();

    backend.drop_submit.store(true, Ordering::SeqCst);
    let err = service.submit_answer(&mut session).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(session.awaiting_ack());

    let submitted = service.submit_answer(&mut session).await.unwrap();
    assert_eq!(submitted, Submitted::Recorded);
    assert_eq!(session.phase(), Phase::Answered);
    assert_eq!(session.progress().answered, 1);

    assert_eq!(service.advance(&mut session).await.unwrap(), Step::Next(1));
    let key = inner.answer_key(session.attempt_id(), 1).unwrap();
    session.select_option(key).unwrap();
    service.submit_answer(&mut session).await.unwrap();
    assert_eq!(
        service.advance(&mut session).await.unwrap(),
        Step::Completed(100.0)
    );
}
