use thiserror::Error;

use crate::model::{
    EvaluatorError, OptionSetError, ParseIdError, QuestionError, SettingsError, TransitionRefusal,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    OptionSet(#[from] OptionSetError),
    #[error(transparent)]
    Refused(#[from] TransitionRefusal),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}
