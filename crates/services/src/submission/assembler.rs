use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storage::keys::ProgressScope;
use survey_core::model::{
    CompletionVariant, EvaluatorIdentity, FeedbackType, PresentedOptionSet, QualityFlags,
    QuestionId, QuestionRecord, ResponseRecord, SessionId, SubmissionStatistics,
};

use crate::sessions::ResponseStore;

pub const NO_OPTION_SELECTED: &str = "No option selected";
pub const NO_FLAG_REASONS: &str = "No flag reasons provided";
pub const NO_COMMENTS: &str = "No comments provided";

/// Which questions are not yet at the terminal phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completeness {
    pub complete: bool,
    /// Zero-based question indices.
    pub missing: Vec<usize>,
}

#[must_use]
pub fn validate_completeness(
    responses: &[ResponseRecord],
    variant: CompletionVariant,
) -> Completeness {
    let missing: Vec<usize> = responses
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.is_complete(variant))
        .map(|(i, _)| i)
        .collect();
    Completeness {
        complete: missing.is_empty(),
        missing,
    }
}

//
// ─── WIRE SHAPE ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub domain: Option<String>,
    pub partition: Option<u32>,
    pub variant: CompletionVariant,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub questions_total: usize,
    pub questions_answered: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionInfo {
    /// "Option #n" (1-based) or the no-selection placeholder.
    pub selected_option: String,
    /// Literal text of the option as it was shown.
    pub selected_option_text: String,
    pub is_correct: bool,
    pub cannot_tell: bool,
}

impl SelectionInfo {
    fn describe(response: &ResponseRecord, options: &PresentedOptionSet) -> Self {
        let text = response
            .selected_option_index()
            .and_then(|index| options.option(index).map(|text| (index, text)));
        let (selected_option, selected_option_text) = match text {
            Some((index, text)) => (format!("Option #{}", index + 1), text.to_owned()),
            None => (NO_OPTION_SELECTED.to_owned(), NO_OPTION_SELECTED.to_owned()),
        };
        Self {
            selected_option,
            selected_option_text,
            is_correct: response.is_correct(),
            cannot_tell: response.cannot_tell(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEntry {
    pub question_id: QuestionId,
    pub domain: String,
    pub feedback_type: FeedbackType,
    pub selection_info: SelectionInfo,
    pub filter_flags: QualityFlags,
    pub flag_reasons: String,
    pub comments: String,
}

impl ResponseEntry {
    fn describe(
        question: &QuestionRecord,
        options: &PresentedOptionSet,
        response: &ResponseRecord,
    ) -> Self {
        Self {
            question_id: question.id().clone(),
            domain: question.domain().to_owned(),
            feedback_type: question.feedback_type(),
            selection_info: SelectionInfo::describe(response, options),
            filter_flags: *response.quality_flags(),
            flag_reasons: non_blank_or(response.flag_reasons(), NO_FLAG_REASONS),
            comments: non_blank_or(response.comments(), NO_COMMENTS),
        }
    }
}

/// Everything posted to the collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub evaluator: EvaluatorIdentity,
    pub session_info: SessionInfo,
    pub statistics: SubmissionStatistics,
    pub responses: Vec<ResponseEntry>,
}

fn non_blank_or(text: &str, placeholder: &str) -> String {
    if text.trim().is_empty() {
        placeholder.to_owned()
    } else {
        text.to_owned()
    }
}

/// Build the submission payload from the store's current state.
///
/// Incomplete stores are reshaped as they are; gating is up to the caller.
#[must_use]
pub fn assemble_submission(
    store: &ResponseStore,
    scope: &ProgressScope,
    evaluator: EvaluatorIdentity,
    submitted_at: DateTime<Utc>,
) -> SubmissionPayload {
    let statistics = SubmissionStatistics::from_responses(store.responses(), store.variant());
    let responses = store
        .questions()
        .iter()
        .zip(store.option_sets())
        .zip(store.responses())
        .map(|((question, options), response)| {
            ResponseEntry::describe(question, options, response)
        })
        .collect();

    SubmissionPayload {
        evaluator,
        session_info: SessionInfo {
            session_id: store.session_id(),
            domain: scope.domain.clone(),
            partition: scope.partition,
            variant: store.variant(),
            started_at: store.started_at(),
            submitted_at,
            questions_total: statistics.total_questions,
            questions_answered: statistics.answered_questions,
        },
        statistics,
        responses,
    }
}
