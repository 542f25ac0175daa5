//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use survey_core::model::{
    EvaluatorError, OptionSetError, QuestionError, SettingsError, TransitionRefusal,
};

/// Errors emitted while reading deployment settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("settings are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] SettingsError),
}

/// Errors emitted while fetching and selecting the question set.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("question source request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("question data is not a JSON array of records: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question record {index} is invalid: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: QuestionError,
    },
    #[error("no questions left after filtering (domain: {domain:?})")]
    Empty { domain: Option<String> },
    #[error(transparent)]
    OptionSet(#[from] OptionSetError),
}

/// Errors emitted while assembling or sending a submission.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("submission rejected with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("submission is incomplete: {missing} question(s) unanswered")]
    Incomplete { missing: usize },
    #[error("no stored submission to retry")]
    NothingToRetry,
    #[error("payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors emitted by the survey workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SurveyError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Refused(#[from] TransitionRefusal),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
