use clap::{Parser, Subcommand};

/// Terminal client for StudyForge quizzes.
#[derive(Parser, Debug)]
#[command(name = "studyforge", version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides STUDYFORGE_API_BASE)
    #[arg(long, global = true, value_name = "URL")]
    pub api: Option<String>,

    /// Bearer token (overrides STUDYFORGE_TOKEN and the saved token)
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Run against a built-in sample quiz instead of a backend
    #[arg(long, global = true)]
    pub demo: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List your quizzes
    Quizzes {
        #[arg(long, default_value_t = 0)]
        skip: u64,
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
    /// Take a quiz, answering one question at a time
    Take {
        /// Quiz id; in demo mode this may be omitted
        quiz_id: Option<String>,
    },
    /// Show the breakdown of a completed attempt
    Results { attempt_id: String },
    /// Show progress and recent performance
    Stats {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Log in and save the access token
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the saved access token
    Logout,
}
