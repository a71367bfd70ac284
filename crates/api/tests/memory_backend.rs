use api::{ApiError, InMemoryBackend, Operation, QuizBackend, QuizFixture, StatsBackend};
use chrono::Duration;
use forge_core::model::{AnswerSubmission, DifficultyLevel, OptionLabel, QuizId};
use forge_core::time::fixed_clock;

fn backend() -> InMemoryBackend {
    InMemoryBackend::seeded(7, fixed_clock())
}

fn seed_quiz(backend: &InMemoryBackend, topic: &str) -> QuizId {
    let fixture = QuizFixture::new("Ownership", topic, DifficultyLevel::default())
        .question(
            "Which keyword moves a closure's captures?",
            ["move", "ref", "static", "dyn"],
            OptionLabel::A,
            "`move` forces captures by value.",
        )
        .question(
            "What does `&mut` grant?",
            ["Shared access", "Exclusive access", "Ownership", "Nothing"],
            OptionLabel::B,
            "A mutable borrow is exclusive.",
        )
        .question(
            "Which trait enables `clone()`?",
            ["Copy", "Default", "Clone", "Drop"],
            OptionLabel::C,
            "`Clone` provides explicit duplication.",
        );
    backend.insert_quiz(fixture).unwrap()
}

fn answer(question_index: usize, selected_option: OptionLabel) -> AnswerSubmission {
    AnswerSubmission {
        question_index,
        selected_option,
    }
}

fn wrong(label: OptionLabel) -> OptionLabel {
    OptionLabel::from_index((label.index() + 1) % 4).unwrap()
}

#[tokio::test]
async fn shuffled_layout_keeps_option_texts() {
    let backend = backend();
    let quiz_id = seed_quiz(&backend, "rust");
    let quiz = backend.get_quiz(quiz_id).await.unwrap();
    let attempt = backend.create_attempt(quiz_id).await.unwrap();

    let layout = attempt.randomized_questions().unwrap();
    assert_eq!(layout.len(), quiz.question_count());
    for (original, shuffled) in quiz.questions().iter().zip(layout) {
        assert_eq!(original.text(), shuffled.text());
        let mut expected: Vec<_> = original.options().iter().map(|(_, t)| t).collect();
        let mut actual: Vec<_> = shuffled.options().iter().map(|(_, t)| t).collect();
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(expected, actual);
    }
    assert!(attempt.correct_options().is_empty());
}

#[tokio::test]
async fn feedback_reports_running_score() {
    let backend = backend();
    let quiz_id = seed_quiz(&backend, "rust");
    let attempt = backend.create_attempt(quiz_id).await.unwrap();

    let key = backend.answer_key(attempt.id(), 0).unwrap();
    let first = backend.submit_answer(attempt.id(), answer(0, key)).await.unwrap();
    assert!(first.is_correct);
    assert_eq!(first.correct_option, key);
    assert_eq!(first.score_so_far, Some(100.0));

    let key = backend.answer_key(attempt.id(), 1).unwrap();
    let second = backend
        .submit_answer(attempt.id(), answer(1, wrong(key)))
        .await
        .unwrap();
    assert!(!second.is_correct);
    assert_eq!(second.correct_option, key);
    assert_eq!(second.explanation, "A mutable borrow is exclusive.");
    assert_eq!(second.score_so_far, Some(50.0));
}

#[tokio::test]
async fn answering_twice_is_rejected() {
    let backend = backend();
    let quiz_id = seed_quiz(&backend, "rust");
    let attempt = backend.create_attempt(quiz_id).await.unwrap();

    backend
        .submit_answer(attempt.id(), answer(0, OptionLabel::A))
        .await
        .unwrap();
    let err = backend
        .submit_answer(attempt.id(), answer(0, OptionLabel::B))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Rejected { status: 400, .. }));

    let err = backend
        .submit_answer(attempt.id(), answer(9, OptionLabel::A))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn completion_requires_an_answer_and_gates_results() {
    let backend = backend();
    let quiz_id = seed_quiz(&backend, "rust");
    let attempt = backend.create_attempt(quiz_id).await.unwrap();

    let err = backend.complete_attempt(attempt.id()).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected { .. }));

    backend
        .submit_answer(attempt.id(), answer(0, OptionLabel::A))
        .await
        .unwrap();
    let err = backend.get_results(attempt.id()).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected { .. }));

    backend.advance_clock(Duration::minutes(3)).unwrap();
    let done = backend.complete_attempt(attempt.id()).await.unwrap();
    assert!(done.is_completed());
    assert_eq!(done.correct_options().len(), 3);
    assert!(done.completed_at().unwrap() > done.started_at());

    let err = backend
        .submit_answer(attempt.id(), answer(1, OptionLabel::A))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Rejected { .. }));
}

#[tokio::test]
async fn results_cover_answered_questions_in_order() {
    let backend = backend();
    let quiz_id = seed_quiz(&backend, "rust");
    let attempt = backend.create_attempt(quiz_id).await.unwrap();

    let key0 = backend.answer_key(attempt.id(), 0).unwrap();
    let key2 = backend.answer_key(attempt.id(), 2).unwrap();
    backend
        .submit_answer(attempt.id(), answer(2, wrong(key2)))
        .await
        .unwrap();
    backend
        .submit_answer(attempt.id(), answer(0, key0))
        .await
        .unwrap();
    backend.complete_attempt(attempt.id()).await.unwrap();

    let results = backend.get_results(attempt.id()).await.unwrap();
    assert_eq!(results.total_questions(), 2);
    assert_eq!(results.correct_answers(), 1);
    assert_eq!(results.incorrect_answers(), 1);
    assert_eq!(results.score(), 50.0);
    assert_eq!(results.questions()[0].question_text, "Which keyword moves a closure's captures?");
    assert_eq!(results.incorrect_indices(), vec![1]);
}

#[tokio::test]
async fn injected_failures_fire_once_and_are_counted() {
    let backend = backend();
    let quiz_id = seed_quiz(&backend, "rust");
    backend
        .fail_next(Operation::CreateAttempt, ApiError::Server { status: 503 })
        .unwrap();

    let err = backend.create_attempt(quiz_id).await.unwrap_err();
    assert_eq!(err, ApiError::Server { status: 503 });
    assert!(backend.create_attempt(quiz_id).await.is_ok());
    assert_eq!(backend.calls(Operation::CreateAttempt).unwrap(), 2);
    assert_eq!(backend.calls(Operation::SubmitAnswer).unwrap(), 0);
}

#[tokio::test]
async fn removed_quiz_is_not_found() {
    let backend = backend();
    let quiz_id = seed_quiz(&backend, "rust");
    backend.remove_quiz(quiz_id).unwrap();

    assert!(matches!(
        backend.get_quiz(quiz_id).await,
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        backend.create_attempt(quiz_id).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn listing_pages_in_insertion_order() {
    let backend = backend();
    let first = seed_quiz(&backend, "rust");
    let second = seed_quiz(&backend, "async");
    let third = seed_quiz(&backend, "traits");

    let page = backend.list_quizzes(0, 2).await.unwrap();
    assert_eq!(page.total, 3);
    assert!(page.has_more());
    let ids: Vec<_> = page.items.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![first, second]);

    let rest = backend.list_quizzes(2, 2).await.unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.items[0].id, third);
    assert!(!rest.has_more());
}

#[tokio::test]
async fn stats_group_completed_attempts_by_topic() {
    let backend = backend();
    backend.set_shuffle_options(false).unwrap();
    let rust = seed_quiz(&backend, "rust");
    let async_quiz = seed_quiz(&backend, "async");

    for (quiz_id, picks) in [
        (rust, vec![OptionLabel::A, OptionLabel::B, OptionLabel::C]),
        (rust, vec![OptionLabel::A, OptionLabel::A, OptionLabel::A]),
        (async_quiz, vec![OptionLabel::D]),
    ] {
        let attempt = backend.create_attempt(quiz_id).await.unwrap();
        for (index, pick) in picks.into_iter().enumerate() {
            backend
                .submit_answer(attempt.id(), answer(index, pick))
                .await
                .unwrap();
        }
        backend.advance_clock(Duration::minutes(1)).unwrap();
        backend.complete_attempt(attempt.id()).await.unwrap();
    }
    // Started but never finished: excluded from every aggregate.
    backend.create_attempt(rust).await.unwrap();

    let progress = backend.progress().await.unwrap();
    assert_eq!(progress.total_attempts, 3);
    assert_eq!(progress.avg_score_overall, 44.44);

    let topics: Vec<_> = progress
        .progress_by_topic
        .iter()
        .map(|t| (t.topic.as_str(), t.total_attempts, t.max_score, t.min_score))
        .collect();
    assert_eq!(topics, vec![("async", 1, 0.0, 0.0), ("rust", 2, 100.0, 33.33)]);

    let performance = backend.performance(2).await.unwrap();
    assert_eq!(performance.recent_attempts.len(), 2);
    assert_eq!(performance.recent_attempts[0].topic, "async");
    assert!(
        performance.recent_attempts[0].completed_at > performance.recent_attempts[1].completed_at
    );

    let summary = backend.summary().await.unwrap();
    assert_eq!(summary.total_quizzes, 2);
    assert_eq!(summary.total_completed_attempts, 3);
    assert_eq!(summary.best_score, 100.0);
    assert_eq!(summary.unique_topics_studied, 2);
}
