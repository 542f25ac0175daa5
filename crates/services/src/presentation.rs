//! What the survey asks a UI to show. No markup is produced here.

use chrono::{DateTime, Utc};

use survey_core::model::{
    AnswerPhase, FeedbackType, QualityFlags, QuestionId, SubmissionStatistics, TransitionRefusal,
};

use crate::media::media_id;
use crate::sessions::{RepairReport, ResponseStore};
use crate::submission::Completeness;

/// Everything needed to draw the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub question_id: QuestionId,
    pub domain: String,
    pub feedback_type: FeedbackType,
    pub scenario_text: Option<String>,
    /// Video file identifier; `None` for text-only questions.
    pub media_id: Option<String>,
    /// Literal option texts in presentation order.
    pub options: Vec<String>,
    pub cannot_tell_index: Option<usize>,
    pub selected_index: Option<usize>,
    pub phase: AnswerPhase,
    pub terminal_phase: AnswerPhase,
    pub quality_flags: QualityFlags,
    pub flag_reasons: String,
    pub comments: String,
    pub can_go_back: bool,
}

impl QuestionView {
    #[must_use]
    pub fn of(store: &ResponseStore) -> Self {
        let question = store.current_question();
        let options = store.current_options();
        let response = store.current_response();
        Self {
            index: store.current_index(),
            total: store.len(),
            question_id: question.id().clone(),
            domain: question.domain().to_owned(),
            feedback_type: question.feedback_type(),
            scenario_text: question.scenario_text().map(str::to_owned),
            media_id: media_id(question),
            options: options.options().to_vec(),
            cannot_tell_index: options.cannot_tell_index(),
            selected_index: response.selected_option_index(),
            phase: response.phase(),
            terminal_phase: store.terminal_phase(),
            quality_flags: *response.quality_flags(),
            flag_reasons: response.flag_reasons().to_owned(),
            comments: response.comments().to_owned(),
            can_go_back: store.current_index() > 0,
        }
    }
}

/// Non-fatal persistence status shown next to the survey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveIndicator {
    Saved { at: DateTime<Utc> },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderInstruction {
    LoadFailed {
        message: String,
    },
    ShowQuestion(QuestionView),
    ShowFeedback {
        question_index: usize,
        is_correct: bool,
        cannot_tell: bool,
        ground_truth_index: usize,
        ground_truth_text: String,
    },
    Refused(TransitionRefusal),
    SaveStatus(SaveIndicator),
    ProgressRestored {
        current_index: usize,
        answered: usize,
        repairs: RepairReport,
    },
    ShowSubmissionForm {
        completeness: Completeness,
        statistics: SubmissionStatistics,
    },
    SubmissionSucceeded,
    SubmissionFailed {
        message: String,
        /// The payload is kept and can be resent.
        retryable: bool,
    },
}

/// Receives render instructions; implemented by the host UI.
pub trait PresentationSurface: Send + Sync {
    fn render(&self, instruction: RenderInstruction);
}
