#![forbid(unsafe_code)]

pub mod auth;
pub mod backend;
pub mod error;
pub mod http;
pub mod memory;

pub use auth::{Credentials, StaticCredentials, TokenFile};
pub use backend::{Backend, QuizBackend, StatsBackend};
pub use error::ApiError;
pub use http::{API_BASE_ENV, AccessToken, ApiConfig, DEFAULT_BASE_URL, HttpBackend, TIMEOUT_ENV};
pub use memory::{InMemoryBackend, Operation, QuizFixture};
