use serde::{Deserialize, Serialize};

use crate::model::response::AnswerPhase;

/// Which completion flow a deployment runs.
///
/// - `SinglePhase`: select, confirm, move on.
/// - `TwoPhase`: select, confirm, then submit a quality assessment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionVariant {
    SinglePhase,
    #[default]
    TwoPhase,
}

impl CompletionVariant {
    /// Phase at which a question counts as done.
    #[must_use]
    pub fn terminal_phase(self) -> AnswerPhase {
        match self {
            CompletionVariant::SinglePhase => AnswerPhase::Confirmed,
            CompletionVariant::TwoPhase => AnswerPhase::Assessed,
        }
    }

    #[must_use]
    pub fn has_assessment(self) -> bool {
        matches!(self, CompletionVariant::TwoPhase)
    }
}
