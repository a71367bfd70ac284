#![forbid(unsafe_code)]

pub mod attempts;
pub mod catalog_service;
pub mod error;
pub mod stats_service;

pub use attempts::{
    Advance, AttemptFlow, AttemptLoopService, AttemptProgress, AttemptSession, PendingAnswer,
    Phase, Step, Submitted,
};
pub use catalog_service::QuizCatalogService;
pub use error::{AttemptError, ErrorKind, Redirect, ValidationError};
pub use stats_service::{StatsOverview, StatsService};
