#![forbid(unsafe_code)]

mod cli;
mod config;
mod demo;
mod error;
mod logging;
mod render;
mod runner;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use api::{Backend, Credentials, HttpBackend, StaticCredentials};
use clap::Parser;
use colored::Colorize;
use forge_core::model::QuizId;
use tokio::io::{AsyncBufRead, BufReader};

use cli::{Cli, Command};
use config::{AppConfig, ConfigError};
use error::AppError;
use runner::{Prompt, Runner};

/// Backend for this invocation, plus the sample quiz id in demo mode.
fn connect(
    config: &AppConfig,
    credentials: Arc<dyn Credentials>,
) -> Result<(Backend, Option<QuizId>), AppError> {
    if config.demo {
        let (backend, quiz_id) = demo::demo_backend()?;
        tracing::debug!(quiz = %quiz_id, "using in-memory demo backend");
        return Ok((Backend::from_shared(backend), Some(quiz_id)));
    }
    let http = HttpBackend::new(config.api.clone(), credentials)?;
    tracing::debug!(base = %http.base_url(), "using http backend");
    Ok((Backend::from_shared(http), None))
}

fn resolve_quiz_id(raw: Option<&str>, demo_quiz: Option<QuizId>) -> Result<QuizId, AppError> {
    match (raw, demo_quiz) {
        (Some(raw), _) => raw.parse().map_err(|_| AppError::InvalidArgument {
            what: "quiz id",
            raw: raw.to_string(),
        }),
        (None, Some(id)) => Ok(id),
        (None, None) => Err(AppError::InvalidArgument {
            what: "quiz id",
            raw: String::new(),
        }),
    }
}

async fn login<R, W>(
    config: &AppConfig,
    mut prompt: Prompt<R, W>,
    email: Option<String>,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if config.demo {
        return Err(AppError::Unsupported("login is not available in demo mode"));
    }
    let file = config.token_file.clone().ok_or(ConfigError::NoConfigDir)?;

    let http = HttpBackend::new(config.api.clone(), Arc::new(StaticCredentials::anonymous()))?;
    let status = http.health().await?;
    tracing::debug!(%status, "backend reachable");

    let email = match email {
        Some(email) => email,
        None => prompt.ask("Email: ").await?.unwrap_or_default(),
    };
    let password = prompt.ask("Password: ").await?.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::InvalidArgument {
            what: "credentials",
            raw: email,
        });
    }

    let token = http.login(&email, &password).await?;
    file.store(&token.access_token)?;
    prompt.say(&format!("Logged in. Token saved to {}\n", file.path().display()))?;
    Ok(())
}

fn logout<R, W>(config: &AppConfig, mut prompt: Prompt<R, W>) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let file = config.token_file.clone().ok_or(ConfigError::NoConfigDir)?;
    file.clear()?;
    prompt.say("Logged out.\n")?;
    Ok(())
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::resolve(&cli, |key| std::env::var(key).ok(), dirs::config_dir())?;
    let prompt = Prompt::new(BufReader::new(tokio::io::stdin()), std::io::stdout());

    let command = match cli.command {
        Command::Login { email } => return login(&config, prompt, email).await,
        Command::Logout => return logout(&config, prompt),
        command => command,
    };

    let credentials = config.token.credentials();
    let (backend, demo_quiz) = connect(&config, Arc::clone(&credentials))?;
    let mut runner = Runner::new(&backend, credentials, prompt);

    match command {
        Command::Quizzes { skip, limit } => runner.list(skip, limit).await,
        Command::Take { quiz_id } => {
            let quiz_id = resolve_quiz_id(quiz_id.as_deref(), demo_quiz)?;
            runner.take(quiz_id).await.map(|_| ())
        }
        Command::Results { attempt_id } => runner.results(&attempt_id).await,
        Command::Stats { limit } => runner.stats(limit).await,
        Command::Login { .. } | Command::Logout => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = logging::filter_directive(std::env::var("RUST_LOG").ok(), cli.verbose);
    logging::init_tracing(&filter);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Printing once at the binary boundary.
            eprintln!("{} {err}", "error:".red().bold());
            if let Some(hint) = err.hint() {
                eprintln!("{hint}");
            }
            ExitCode::from(err.exit_code())
        }
    }
}
