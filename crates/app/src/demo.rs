use api::{ApiError, InMemoryBackend, QuizFixture};
use forge_core::model::{DifficultyLevel, OptionLabel, QuizId};

/// In-memory backend seeded with one sample quiz.
///
/// # Errors
///
/// Returns `ApiError` if the sample quiz cannot be registered.
pub fn demo_backend() -> Result<(InMemoryBackend, QuizId), ApiError> {
    let backend = InMemoryBackend::new();
    let difficulty = DifficultyLevel::new(2).unwrap_or_default();
    let quiz = QuizFixture::new("Ownership and borrowing", "rust", difficulty)
        .question(
            "What happens to a `String` after it is moved into a function?",
            [
                "It is copied",
                "The caller can no longer use it",
                "It becomes a reference",
                "It is dropped immediately",
            ],
            OptionLabel::B,
            "Moving transfers ownership; the original binding is invalidated.",
        )
        .question(
            "How many mutable references to a value may exist at once?",
            ["Any number", "Two", "Exactly one", "None"],
            OptionLabel::C,
            "A mutable borrow is exclusive for as long as it lives.",
        )
        .question(
            "Which type is `Copy`?",
            ["Vec<u8>", "String", "Box<i32>", "u32"],
            OptionLabel::D,
            "Plain integers are `Copy`; heap-owning types are not.",
        )
        .question(
            "What does the borrow checker prevent?",
            [
                "Dangling references",
                "Integer overflow",
                "Infinite loops",
                "Slow compilation",
            ],
            OptionLabel::A,
            "References may not outlive the data they point to.",
        );
    let quiz_id = backend.insert_quiz(quiz)?;
    Ok((backend, quiz_id))
}
