#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod loader;
pub mod media;
pub mod presentation;
pub mod sessions;
pub mod shuffle;
pub mod submission;

pub use survey_core::Clock;

pub use config::settings_from_json;
pub use error::{ConfigError, LoadError, SubmissionError, SurveyError};
pub use loader::{
    HttpQuestionSource, LoadedQuestionSet, PartitionApplied, QuestionSelection, QuestionSetLoader,
    QuestionSource, StaticQuestionSource,
};
pub use media::{MediaResolver, MediaSource, PlaybackAttempts};
pub use presentation::{PresentationSurface, QuestionView, RenderInstruction, SaveIndicator};
pub use sessions::{
    CommandOutcome, ProgressPersistence, ResponseStore, SessionIdentity, SurveyCommand,
    SurveyLoopService, SurveySession,
};
pub use submission::{HttpSubmissionSink, SubmissionPayload, SubmissionSink};
