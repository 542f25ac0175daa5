use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question {id}: ground truth is missing or empty")]
    EmptyGroundTruth { id: String },

    #[error("question {id}: at least one negative option is required")]
    NoNegativeOptions { id: String },

    #[error("question {id}: negative option #{index} is empty")]
    EmptyNegativeOption { id: String, index: usize },
}

//
// ─── FEEDBACK TYPE ─────────────────────────────────────────────────────────────
//

/// Framing of a question's feedback options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeedbackType {
    #[serde(rename = "good execution")]
    GoodExecution,
    #[serde(rename = "tips for improvement")]
    TipsForImprovement,
}

impl FeedbackType {
    #[must_use]
    pub fn from_good_execution(is_good_execution: bool) -> Self {
        if is_good_execution {
            Self::GoodExecution
        } else {
            Self::TipsForImprovement
        }
    }

    /// Label used in submissions.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FeedbackType::GoodExecution => "good execution",
            FeedbackType::TipsForImprovement => "tips for improvement",
        }
    }
}

//
// ─── DRAFT (WIRE SHAPE) ────────────────────────────────────────────────────────
//

/// A question record exactly as it arrives from the data source.
///
/// Field names follow the published JSON files (`groundTruth`,
/// `negative_comments`, `is_ge`, ...). Everything is optional here;
/// [`QuestionDraft::validate`] decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, rename = "groundTruth")]
    pub ground_truth: Option<String>,
    #[serde(default, rename = "negative_comments", alias = "negativeOptions")]
    pub negative_options: Option<Vec<String>>,
    #[serde(default, rename = "is_ge", alias = "isGoodExecution")]
    pub is_good_execution: bool,
    #[serde(default, alias = "scenarioText")]
    pub scenario_text: Option<String>,
    #[serde(default, rename = "videoUrl")]
    pub video_url: Option<String>,
    /// Clip offset; the data files carry it as a string or a number.
    #[serde(default, deserialize_with = "text_or_number")]
    pub video_time: Option<String>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        domain: impl Into<String>,
        ground_truth: impl Into<String>,
        negative_options: Vec<String>,
        is_good_execution: bool,
    ) -> Self {
        Self {
            id: id.into(),
            domain: Some(domain.into()),
            ground_truth: Some(ground_truth.into()),
            negative_options: Some(negative_options),
            is_good_execution,
            scenario_text: None,
            video_url: None,
            video_time: None,
        }
    }

    /// Validate the raw record into an immutable [`QuestionRecord`].
    ///
    /// Option texts are kept verbatim; only emptiness is checked.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the id, ground truth or any negative option is blank,
    /// or when there are no negative options.
    pub fn validate(self) -> Result<QuestionRecord, QuestionError> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(QuestionError::EmptyId);
        }

        let ground_truth = self
            .ground_truth
            .filter(|gt| !gt.trim().is_empty())
            .ok_or_else(|| QuestionError::EmptyGroundTruth { id: id.clone() })?;

        let negative_options = self.negative_options.unwrap_or_default();
        if negative_options.is_empty() {
            return Err(QuestionError::NoNegativeOptions { id });
        }
        if let Some(index) = negative_options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyNegativeOption { id, index });
        }

        Ok(QuestionRecord {
            id: QuestionId::new(id),
            domain: self.domain.map(|d| d.trim().to_string()).unwrap_or_default(),
            ground_truth,
            negative_options,
            feedback_type: FeedbackType::from_good_execution(self.is_good_execution),
            scenario_text: self.scenario_text.filter(|s| !s.trim().is_empty()),
            video_url: self.video_url.filter(|s| !s.trim().is_empty()),
            video_time: self.video_time.filter(|s| !s.trim().is_empty()),
        })
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Int(n) => n.to_string(),
        Raw::Float(x) => x.to_string(),
    }))
}

//
// ─── QUESTION RECORD ───────────────────────────────────────────────────────────
//

/// Validated, immutable question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    id: QuestionId,
    domain: String,
    ground_truth: String,
    negative_options: Vec<String>,
    feedback_type: FeedbackType,
    scenario_text: Option<String>,
    video_url: Option<String>,
    video_time: Option<String>,
}

impl QuestionRecord {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    /// Domain label; empty when the source carries none.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[must_use]
    pub fn ground_truth(&self) -> &str {
        &self.ground_truth
    }

    #[must_use]
    pub fn negative_options(&self) -> &[String] {
        &self.negative_options
    }

    #[must_use]
    pub fn feedback_type(&self) -> FeedbackType {
        self.feedback_type
    }

    #[must_use]
    pub fn is_good_execution(&self) -> bool {
        self.feedback_type == FeedbackType::GoodExecution
    }

    #[must_use]
    pub fn scenario_text(&self) -> Option<&str> {
        self.scenario_text.as_deref()
    }

    #[must_use]
    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    #[must_use]
    pub fn video_time(&self) -> Option<&str> {
        self.video_time.as_deref()
    }

    /// Ground truth followed by the negative options, unshuffled.
    #[must_use]
    pub fn canonical_options(&self) -> Vec<&str> {
        std::iter::once(self.ground_truth.as_str())
            .chain(self.negative_options.iter().map(String::as_str))
            .collect()
    }

    /// Number of answer options before any abstain option is appended.
    #[must_use]
    pub fn option_count(&self) -> usize {
        self.negative_options.len() + 1
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
