mod evaluator;
mod ids;
mod options;
mod question;
mod refusal;
mod response;
mod settings;
mod statistics;
mod variant;

pub use evaluator::{EvaluatorError, EvaluatorIdentity};
pub use ids::{ParseIdError, QuestionId, SessionId};
pub use options::{OptionSetError, PresentedOptionSet};
pub use question::{FeedbackType, QuestionDraft, QuestionError, QuestionRecord};
pub use refusal::{RefusalReason, TransitionRefusal};
pub use response::{AnswerPhase, IssueFlag, OverallQuality, QualityFlags, ResponseRecord};
pub use settings::{
    DEFAULT_AUTO_SAVE_INTERVAL_SECS, MAX_AUTO_SAVE_INTERVAL_SECS, SelectionStrategy, SettingsError,
    SurveySettings, SurveySettingsDraft,
};
pub use statistics::{IssueBreakdown, Percentages, SubmissionStatistics, percent};
pub use variant::CompletionVariant;
