use std::path::PathBuf;
use std::sync::Arc;

use api::{API_BASE_ENV, ApiConfig, Credentials, StaticCredentials, TokenFile};
use thiserror::Error;

use crate::cli::Cli;

pub const TOKEN_ENV: &str = "STUDYFORGE_TOKEN";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid backend URL {raw:?}: {reason}")]
    InvalidApiBase { raw: String, reason: String },
    #[error("no configuration directory available for the token file")]
    NoConfigDir,
}

/// Where the bearer token comes from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// Given on the command line or in the environment; kept in memory only.
    Explicit(String),
    /// Saved by `login` under the platform config directory.
    File(TokenFile),
}

impl TokenSource {
    #[must_use]
    pub fn credentials(&self) -> Arc<dyn Credentials> {
        match self {
            Self::Explicit(token) => Arc::new(StaticCredentials::new(token.clone())),
            Self::File(file) => Arc::new(file.clone()),
        }
    }
}

/// Resolved settings: flags over environment over the saved token file.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub token: TokenSource,
    pub token_file: Option<TokenFile>,
    pub demo: bool,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidApiBase` for an unparsable backend URL
    /// and `ConfigError::NoConfigDir` when no token source exists at all.
    pub fn resolve(
        cli: &Cli,
        env: impl Fn(&str) -> Option<String>,
        config_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let lookup = |key: &str| {
            if key == API_BASE_ENV {
                cli.api.clone().or_else(|| env(key))
            } else {
                env(key)
            }
        };
        let api = ApiConfig::from_env_with(&lookup).map_err(|err| ConfigError::InvalidApiBase {
            raw: lookup(API_BASE_ENV).unwrap_or_default(),
            reason: err.to_string(),
        })?;

        let token_file = config_dir.map(|dir| TokenFile::new(token_path(dir)));
        let explicit = cli
            .token
            .clone()
            .or_else(|| env(TOKEN_ENV))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let token = match (explicit, &token_file) {
            (Some(token), _) => TokenSource::Explicit(token),
            (None, Some(file)) => TokenSource::File(file.clone()),
            (None, None) if cli.demo => TokenSource::Explicit(String::new()),
            (None, None) => return Err(ConfigError::NoConfigDir),
        };

        Ok(Self {
            api,
            token,
            token_file,
            demo: cli.demo,
        })
    }
}

fn token_path(config_dir: PathBuf) -> PathBuf {
    config_dir.join("studyforge").join("token")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["studyforge"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn flag_overrides_environment() {
        let cli = cli(&["--api", "https://flag.example.com", "quizzes"]);
        let config = AppConfig::resolve(
            &cli,
            |key| (key == API_BASE_ENV).then(|| "https://env.example.com".to_string()),
            Some(PathBuf::from("/tmp/cfg")),
        )
        .unwrap();
        assert_eq!(config.api.base_url.as_str(), "https://flag.example.com/");
    }

    #[test]
    fn environment_base_applies_without_flag() {
        let cli = cli(&["quizzes"]);
        let config = AppConfig::resolve(
            &cli,
            |key| (key == "STUDYFORGE_API_BASE").then(|| "https://env.example.com".to_string()),
            Some(PathBuf::from("/tmp/cfg")),
        )
        .unwrap();
        assert_eq!(config.api.base_url.as_str(), "https://env.example.com/");
    }

    #[test]
    fn env_token_beats_token_file() {
        let cli = cli(&["stats"]);
        let config = AppConfig::resolve(
            &cli,
            |key| (key == TOKEN_ENV).then(|| " abc ".to_string()),
            Some(PathBuf::from("/tmp/cfg")),
        )
        .unwrap();
        assert!(matches!(config.token, TokenSource::Explicit(ref t) if t == "abc"));
        assert_eq!(
            config.token_file.unwrap().path(),
            PathBuf::from("/tmp/cfg/studyforge/token")
        );
    }

    #[test]
    fn falls_back_to_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::resolve(&cli(&["stats"]), no_env, Some(dir.path().into())).unwrap();
        let TokenSource::File(file) = &config.token else {
            panic!("expected token file");
        };
        file.store("saved").unwrap();
        assert_eq!(config.token.credentials().token().as_deref(), Some("saved"));
    }

    #[test]
    fn invalid_base_is_reported() {
        let err = AppConfig::resolve(&cli(&["--api", "nope", "stats"]), no_env, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidApiBase { ref raw, .. } if raw == "nope"));
    }

    #[test]
    fn demo_needs_no_token_source() {
        let config = AppConfig::resolve(&cli(&["--demo", "take"]), no_env, None).unwrap();
        assert!(config.demo);
    }
}
