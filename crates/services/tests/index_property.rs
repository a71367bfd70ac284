use forge_core::model::{
    AnswerFeedback, Attempt, AttemptId, DifficultyLevel, OptionLabel, OptionSet, Question, Quiz,
    QuizId, UserId,
};
use forge_core::time::fixed_now;
use proptest::prelude::*;
use services::{AttemptSession, Phase};

#[derive(Debug, Clone, Copy)]
enum Action {
    Select(usize),
    Submit { succeed: bool, correct: bool },
    Advance,
    Complete,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0usize..4).prop_map(Action::Select),
        (any::<bool>(), any::<bool>()).prop_map(|(succeed, correct)| Action::Submit { succeed, correct }),
        Just(Action::Advance),
        Just(Action::Complete),
    ]
}

fn session(questions: usize) -> AttemptSession {
    let questions = (0..questions)
        .map(|i| Question::new(format!("Q{i}"), OptionSet::new("w", "x", "y", "z")).unwrap())
        .collect();
    let quiz = Quiz::new(
        QuizId::random(),
        UserId::random(),
        "Property quiz",
        "testing",
        DifficultyLevel::default(),
        fixed_now(),
        questions,
    )
    .unwrap();
    let attempt = Attempt::started(AttemptId::random(), quiz.id(), quiz.user_id(), fixed_now());
    AttemptSession::new(quiz, attempt).unwrap()
}

fn apply(session: &mut AttemptSession, action: Action) {
    match action {
        Action::Select(index) => {
            let _ = session.select_option(OptionLabel::from_index(index).unwrap());
        }
        Action::Submit { succeed, correct } => {
            let Ok(pending) = session.begin_submission() else {
                return;
            };
            if succeed {
                let selected = pending.submission.selected_option;
                let feedback = AnswerFeedback {
                    is_correct: correct,
                    correct_option: selected,
                    explanation: String::new(),
                    selected_option: selected,
                    score_so_far: None,
                };
                session.apply_feedback(pending, feedback).unwrap();
            } else {
                session.abort_submission();
            }
        }
        Action::Advance => {
            let _ = session.advance();
        }
        Action::Complete => {
            if session.begin_completion().is_ok() {
                session.abort_completion();
            }
        }
    }
}

proptest! {
    #[test]
    fn index_is_monotonic_and_bounded(
        questions in 1usize..6,
        actions in prop::collection::vec(action(), 0..60),
    ) {
        let mut session = session(questions);
        let mut last_index = session.current_index();
        let mut last_answered = 0;

        for action in actions {
            let before = session.phase();
            apply(&mut session, action);
            let index = session.current_index();

            prop_assert!(index >= last_index);
            prop_assert!(index <= last_index + 1);
            prop_assert!(session.history().len() >= last_answered);
            prop_assert!(session.history().len() <= questions);
            if matches!(session.phase(), Phase::Answering | Phase::Answered) {
                prop_assert!(index < questions);
            }
            if before == Phase::Completing {
                prop_assert_eq!(session.phase(), Phase::Completing);
            }
            if session.phase() == Phase::Answering {
                prop_assert!(session.feedback().is_none());
            }
            prop_assert!(!session.is_in_flight());

            last_index = index;
            last_answered = session.history().len();
        }
    }

    #[test]
    fn answers_recorded_once_per_index(questions in 1usize..6) {
        let mut session = session(questions);
        let mut steps = 0;
        while session.phase() != Phase::Completing {
            session.select_option(OptionLabel::A).unwrap();
            let pending = session.begin_submission().unwrap();
            prop_assert_eq!(pending.submission.question_index, steps);
            let feedback = AnswerFeedback {
                is_correct: true,
                correct_option: OptionLabel::A,
                explanation: String::new(),
                selected_option: OptionLabel::A,
                score_so_far: None,
            };
            session.apply_feedback(pending, feedback).unwrap();
            prop_assert!(session.begin_submission().is_err());
            session.advance().unwrap();
            steps += 1;
        }
        prop_assert_eq!(steps, questions);
        prop_assert_eq!(session.history().len(), questions);
    }
}
