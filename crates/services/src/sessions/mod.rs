mod autosave;
mod commands;
mod progress;
mod store;
mod workflow;

// Public API of the session subsystem.
pub use autosave::AutoSaveTimer;
pub use commands::{CommandOutcome, SurveyCommand, dispatch};
pub use progress::{
    ProgressPersistence, ProgressSnapshot, RepairReport, RestoredProgress, SessionIdentity,
};
pub use store::{Advance, ResponseStore, present_options};
pub use workflow::{SurveyLoopService, SurveySession};
