mod flow;
mod progress;
mod session;
mod workflow;

// Public API of the attempt subsystem.
pub use crate::error::{AttemptError, ValidationError};
pub use flow::AttemptFlow;
pub use progress::AttemptProgress;
pub use session::{Advance, AttemptSession, PendingAnswer, Phase};
pub use workflow::{AttemptLoopService, Step, Submitted};
