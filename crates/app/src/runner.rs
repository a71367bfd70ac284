use std::io::{self, Write};
use std::sync::Arc;

use api::{Backend, Credentials};
use forge_core::model::{AttemptId, OptionLabel, QuizId};
use services::{
    AttemptError, AttemptFlow, AttemptLoopService, AttemptSession, Phase, QuizCatalogService,
    StatsService, Step, Submitted,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::AppError;
use crate::render;

//
// ─── PROMPT ────────────────────────────────────────────────────────────────────
//

/// Line-oriented terminal I/O.
pub struct Prompt<R, W> {
    input: R,
    out: W,
}

impl<R, W> Prompt<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// # Errors
    ///
    /// Returns any error from writing to the output.
    pub fn say(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    /// Print `question` and read one trimmed line; `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from either side.
    pub async fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        self.say(question)?;
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

//
// ─── RUNNER ────────────────────────────────────────────────────────────────────
//

/// What the user typed at the answer prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnswerInput {
    Option(OptionLabel),
    Quit,
    Invalid,
}

fn parse_answer(raw: &str) -> AnswerInput {
    if raw.eq_ignore_ascii_case("q") || raw.eq_ignore_ascii_case("quit") {
        return AnswerInput::Quit;
    }
    raw.parse::<OptionLabel>()
        .map_or(AnswerInput::Invalid, AnswerInput::Option)
}

/// How an interactive attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeOutcome {
    Finished,
    Abandoned,
}

/// Executes CLI commands against a backend.
pub struct Runner<R, W> {
    catalog: QuizCatalogService,
    attempts: AttemptLoopService,
    stats: StatsService,
    prompt: Prompt<R, W>,
}

impl<R, W> Runner<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(
        backend: &Backend,
        credentials: Arc<dyn Credentials>,
        prompt: Prompt<R, W>,
    ) -> Self {
        Self {
            catalog: QuizCatalogService::new(
                Arc::clone(&backend.quizzes),
                Arc::clone(&credentials),
            ),
            attempts: AttemptLoopService::new(
                Arc::clone(&backend.quizzes),
                Arc::clone(&credentials),
            ),
            stats: StatsService::new(Arc::clone(&backend.stats), credentials),
            prompt,
        }
    }

    pub fn into_prompt(self) -> Prompt<R, W> {
        self.prompt
    }

    /// # Errors
    ///
    /// Returns `AppError` if the listing cannot be fetched or printed.
    pub async fn list(&mut self, skip: u64, limit: u64) -> Result<(), AppError> {
        let page = self.catalog.list(skip, limit).await?;
        self.prompt.say(&render::quiz_list(&page))?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AppError::InvalidArgument` for a malformed id, or the
    /// backend error.
    pub async fn results(&mut self, raw_id: &str) -> Result<(), AppError> {
        let attempt_id: AttemptId = raw_id.parse().map_err(|_| AppError::InvalidArgument {
            what: "attempt id",
            raw: raw_id.to_string(),
        })?;
        let results = self.attempts.fetch_results(attempt_id).await?;
        self.prompt.say(&render::results(&results))?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AppError` if any stats request fails.
    pub async fn stats(&mut self, limit: u32) -> Result<(), AppError> {
        let overview = self.stats.overview(limit).await?;
        self.prompt.say(&render::stats(&overview))?;
        Ok(())
    }

    /// Take a quiz interactively until results are shown or the user quits.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Attempt` for failures that end the attempt;
    /// transient errors during answering are reported and retried.
    pub async fn take(&mut self, quiz_id: QuizId) -> Result<TakeOutcome, AppError> {
        let mut flow = AttemptFlow::default();
        let session = flow.start(&self.attempts, quiz_id).await?;
        let quiz = session.quiz();
        let header = format!(
            "{} [{}] {} · {} questions\nType A-D to answer, q to quit.\n",
            quiz.title(),
            quiz.topic(),
            render::difficulty(quiz.difficulty()),
            session.total_questions()
        );
        self.prompt.say(&header)?;

        let mut shown = None;
        loop {
            let keep_going = match session.phase() {
                Phase::Answering => self.answer_step(session, &mut shown).await?,
                Phase::Answered => self.advance_step(session).await?,
                Phase::Completing => self.retry_completion(session).await?,
                Phase::Completed | Phase::ResultsReady => {
                    let results = self.attempts.load_results(session).await?;
                    self.prompt.say(&render::results(results))?;
                    let footer = format!("Attempt id: {}\n", session.attempt_id());
                    self.prompt.say(&footer)?;
                    return Ok(TakeOutcome::Finished);
                }
                Phase::Failed | Phase::NotStarted => {
                    return Ok(TakeOutcome::Finished);
                }
            };
            if !keep_going {
                self.prompt.say("Attempt abandoned.\n")?;
                return Ok(TakeOutcome::Abandoned);
            }
        }
    }

    async fn answer_step(
        &mut self,
        session: &mut AttemptSession,
        shown: &mut Option<usize>,
    ) -> Result<bool, AppError> {
        if *shown != Some(session.current_index()) {
            if let Some(question) = session.current_question() {
                let text = render::question(&session.progress(), question);
                self.prompt.say(&text)?;
            }
            *shown = Some(session.current_index());
        }

        let hint = match session.selected_option() {
            Some(label) => format!("Your answer [{label}]: "),
            None => "Your answer: ".to_string(),
        };
        let Some(raw) = self.prompt.ask(&hint).await? else {
            return Ok(false);
        };

        match (parse_answer(&raw), session.selected_option()) {
            (AnswerInput::Quit, _) => return Ok(false),
            (AnswerInput::Option(label), _) => {
                session.select_option(label).map_err(AttemptError::from)?;
            }
            // Enter keeps the pending selection after a failed submission.
            (AnswerInput::Invalid, Some(_)) if raw.is_empty() => {}
            (AnswerInput::Invalid, _) => {
                self.prompt.say("Please type A, B, C or D.\n")?;
                return Ok(true);
            }
        }

        match self.attempts.submit_answer(session).await {
            Ok(Submitted::Scored(feedback)) => {
                let text = render::feedback(&feedback, session.score_so_far());
                self.prompt.say(&text)?;
                Ok(true)
            }
            Ok(Submitted::Recorded) => {
                self.prompt
                    .say("Your earlier answer was already recorded. See the results at the end.\n")?;
                Ok(true)
            }
            Err(err) if err.is_retryable() => {
                self.prompt.say(&format!(
                    "{} Press Enter to retry.\n",
                    err.user_message()
                ))?;
                Ok(true)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn advance_step(&mut self, session: &mut AttemptSession) -> Result<bool, AppError> {
        let last = session.current_index() + 1 == session.total_questions();
        let label = if last {
            "Press Enter to finish: "
        } else {
            "Press Enter for the next question: "
        };
        if self.prompt.ask(label).await?.is_none() {
            return Ok(false);
        }
        let outcome = self.attempts.advance(session).await;
        self.finish_step(outcome)
    }

    async fn retry_completion(&mut self, session: &mut AttemptSession) -> Result<bool, AppError> {
        if self.prompt.ask("Press Enter to retry finishing: ").await?.is_none() {
            return Ok(false);
        }
        let outcome = self.attempts.complete(session).await.map(Step::Completed);
        self.finish_step(outcome)
    }

    fn finish_step(
        &mut self,
        outcome: Result<Step, AttemptError>,
    ) -> Result<bool, AppError> {
        match outcome {
            Ok(Step::Next(_)) => Ok(true),
            Ok(Step::Completed(score)) => {
                self.prompt
                    .say(&format!("Attempt completed: {}\n", render::score(score)))?;
                Ok(true)
            }
            Err(err) if err.is_retryable() => {
                self.prompt.say(&format!("{}\n", err.user_message()))?;
                Ok(true)
            }
            Err(err) => Err(err.into()),
        }
    }
}
