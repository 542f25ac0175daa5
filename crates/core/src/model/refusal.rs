use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a command was not applied to a response.
///
/// The serialized form (`no-selection`, `not-confirmed`, ...) is the reason
/// code handed to the presentation layer so it can prompt for the missing step.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum RefusalReason {
    #[error("no option has been selected")]
    NoSelection,

    #[error("the selection has not been confirmed")]
    NotConfirmed,

    #[error("the quality assessment has not been submitted")]
    QualityNotSubmitted,

    #[error("the other-issue flag is set but no reason was given")]
    MissingFlagReason,

    #[error("overall quality has not been rated")]
    QualityNotRated,

    #[error("the selection is already confirmed")]
    AlreadyConfirmed,

    #[error("the quality assessment was already submitted")]
    AlreadyAssessed,

    #[error("option index is out of range")]
    OptionOutOfRange,

    #[error("this deployment has no quality assessment step")]
    AssessmentDisabled,

    #[error("already at the first question")]
    AtFirstQuestion,
}

impl RefusalReason {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            RefusalReason::NoSelection => "no-selection",
            RefusalReason::NotConfirmed => "not-confirmed",
            RefusalReason::QualityNotSubmitted => "quality-not-submitted",
            RefusalReason::MissingFlagReason => "missing-flag-reason",
            RefusalReason::QualityNotRated => "quality-not-rated",
            RefusalReason::AlreadyConfirmed => "already-confirmed",
            RefusalReason::AlreadyAssessed => "already-assessed",
            RefusalReason::OptionOutOfRange => "option-out-of-range",
            RefusalReason::AssessmentDisabled => "assessment-disabled",
            RefusalReason::AtFirstQuestion => "at-first-question",
        }
    }
}

/// A refused command together with the question it targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRefusal {
    pub question_index: usize,
    pub reason: RefusalReason,
}

impl TransitionRefusal {
    #[must_use]
    pub fn new(question_index: usize, reason: RefusalReason) -> Self {
        Self {
            question_index,
            reason,
        }
    }
}

impl fmt::Display for TransitionRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "question {}: {} ({})",
            self.question_index + 1,
            self.reason,
            self.reason.code()
        )
    }
}

impl std::error::Error for TransitionRefusal {}
