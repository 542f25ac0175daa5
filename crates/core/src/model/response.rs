use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::options::PresentedOptionSet;
use crate::model::refusal::RefusalReason;
use crate::model::variant::CompletionVariant;

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Progress of a single response. Ordered: a response only ever moves up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerPhase {
    Unanswered,
    Selected,
    /// Selection locked and feedback shown.
    Confirmed,
    /// Quality assessment submitted.
    Assessed,
}

//
// ─── QUALITY FLAGS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallQuality {
    Good,
    Bad,
}

/// The named issue tags a respondent can raise about a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueFlag {
    /// The video does not clearly show what the ground truth describes.
    GroundTruthNotClear,
    /// A distractor is also supported by the sample.
    OtherOptionsSupported,
    LanguageIssues,
    /// Free-form issue; requires `flag_reasons` before the assessment is accepted.
    OtherIssues,
}

impl IssueFlag {
    pub const ALL: [IssueFlag; 4] = [
        IssueFlag::GroundTruthNotClear,
        IssueFlag::OtherOptionsSupported,
        IssueFlag::LanguageIssues,
        IssueFlag::OtherIssues,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityFlags {
    pub ground_truth_not_clear: bool,
    pub other_options_supported: bool,
    pub language_issues: bool,
    pub other_issues: bool,
    pub overall_quality: Option<OverallQuality>,
}

impl QualityFlags {
    #[must_use]
    pub fn get(&self, flag: IssueFlag) -> bool {
        match flag {
            IssueFlag::GroundTruthNotClear => self.ground_truth_not_clear,
            IssueFlag::OtherOptionsSupported => self.other_options_supported,
            IssueFlag::LanguageIssues => self.language_issues,
            IssueFlag::OtherIssues => self.other_issues,
        }
    }

    pub fn set(&mut self, flag: IssueFlag, on: bool) {
        let slot = match flag {
            IssueFlag::GroundTruthNotClear => &mut self.ground_truth_not_clear,
            IssueFlag::OtherOptionsSupported => &mut self.other_options_supported,
            IssueFlag::LanguageIssues => &mut self.language_issues,
            IssueFlag::OtherIssues => &mut self.other_issues,
        };
        *slot = on;
    }

    /// True if any issue tag is raised.
    #[must_use]
    pub fn any_issue(&self) -> bool {
        IssueFlag::ALL.iter().any(|flag| self.get(*flag))
    }
}

//
// ─── RESPONSE RECORD ───────────────────────────────────────────────────────────
//

/// One respondent's answer to one question.
///
/// The persisted JSON keeps the field names of earlier saves
/// (`selectedOption`, `filterFlags`, ...); absent fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseRecord {
    #[serde(rename = "selectedOption")]
    selected_option_index: Option<usize>,
    is_correct: bool,
    cannot_tell: bool,
    feedback_shown: bool,
    assessment_submitted: bool,
    #[serde(rename = "filterFlags")]
    quality_flags: QualityFlags,
    flag_reasons: String,
    comments: String,
    timestamp: DateTime<Utc>,
}

impl ResponseRecord {
    /// A fresh, unanswered response.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            timestamp: now,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn phase(&self) -> AnswerPhase {
        if self.assessment_submitted {
            AnswerPhase::Assessed
        } else if self.feedback_shown {
            AnswerPhase::Confirmed
        } else if self.selected_option_index.is_some() {
            AnswerPhase::Selected
        } else {
            AnswerPhase::Unanswered
        }
    }

    #[must_use]
    pub fn selected_option_index(&self) -> Option<usize> {
        self.selected_option_index
    }

    /// Only meaningful once confirmed.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn cannot_tell(&self) -> bool {
        self.cannot_tell
    }

    #[must_use]
    pub fn feedback_shown(&self) -> bool {
        self.feedback_shown
    }

    #[must_use]
    pub fn assessment_submitted(&self) -> bool {
        self.assessment_submitted
    }

    #[must_use]
    pub fn quality_flags(&self) -> &QualityFlags {
        &self.quality_flags
    }

    #[must_use]
    pub fn flag_reasons(&self) -> &str {
        &self.flag_reasons
    }

    #[must_use]
    pub fn comments(&self) -> &str {
        &self.comments
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Pick (or re-pick) an option.
    ///
    /// # Errors
    ///
    /// `AlreadyConfirmed` once the selection is locked, `OptionOutOfRange` for a bad index.
    pub fn select_option(
        &mut self,
        index: usize,
        option_count: usize,
        now: DateTime<Utc>,
    ) -> Result<(), RefusalReason> {
        if self.feedback_shown {
            return Err(RefusalReason::AlreadyConfirmed);
        }
        if index >= option_count {
            return Err(RefusalReason::OptionOutOfRange);
        }
        self.selected_option_index = Some(index);
        self.timestamp = now;
        Ok(())
    }

    /// Lock the selection and score it against `options`. Returns whether it was correct.
    ///
    /// # Errors
    ///
    /// `AlreadyConfirmed` on a second confirm, `NoSelection` without a selection,
    /// `OptionOutOfRange` if a restored selection no longer fits the option set.
    pub fn confirm(
        &mut self,
        options: &PresentedOptionSet,
        now: DateTime<Utc>,
    ) -> Result<bool, RefusalReason> {
        if self.feedback_shown {
            return Err(RefusalReason::AlreadyConfirmed);
        }
        let selected = self.selected_option_index.ok_or(RefusalReason::NoSelection)?;
        if selected >= options.len() {
            return Err(RefusalReason::OptionOutOfRange);
        }

        self.cannot_tell = options.is_cannot_tell(selected);
        self.is_correct = !self.cannot_tell && selected == options.ground_truth_index();
        self.feedback_shown = true;
        self.timestamp = now;
        Ok(self.is_correct)
    }

    /// # Errors
    ///
    /// `AlreadyAssessed` after the assessment was submitted.
    pub fn set_issue_flag(
        &mut self,
        flag: IssueFlag,
        on: bool,
        now: DateTime<Utc>,
    ) -> Result<(), RefusalReason> {
        self.ensure_editable()?;
        self.quality_flags.set(flag, on);
        self.timestamp = now;
        Ok(())
    }

    /// # Errors
    ///
    /// `AlreadyAssessed` after the assessment was submitted.
    pub fn set_overall_quality(
        &mut self,
        quality: OverallQuality,
        now: DateTime<Utc>,
    ) -> Result<(), RefusalReason> {
        self.ensure_editable()?;
        self.quality_flags.overall_quality = Some(quality);
        self.timestamp = now;
        Ok(())
    }

    /// # Errors
    ///
    /// `AlreadyAssessed` after the assessment was submitted.
    pub fn set_flag_reasons(
        &mut self,
        reasons: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), RefusalReason> {
        self.ensure_editable()?;
        self.flag_reasons = reasons.into();
        self.timestamp = now;
        Ok(())
    }

    /// # Errors
    ///
    /// `AlreadyAssessed` after the assessment was submitted.
    pub fn edit_comments(
        &mut self,
        comments: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), RefusalReason> {
        self.ensure_editable()?;
        self.comments = comments.into();
        self.timestamp = now;
        Ok(())
    }

    /// Submit the quality assessment, moving `Confirmed -> Assessed`.
    ///
    /// Reasons are dropped unless the other-issue tag is set.
    ///
    /// # Errors
    ///
    /// Returns the first unmet precondition.
    pub fn submit_assessment(
        &mut self,
        variant: CompletionVariant,
        now: DateTime<Utc>,
    ) -> Result<(), RefusalReason> {
        if !variant.has_assessment() {
            return Err(RefusalReason::AssessmentDisabled);
        }
        self.ensure_editable()?;
        if !self.feedback_shown {
            return Err(RefusalReason::NotConfirmed);
        }
        if self.quality_flags.overall_quality.is_none() {
            return Err(RefusalReason::QualityNotRated);
        }
        if self.missing_flag_reason() {
            return Err(RefusalReason::MissingFlagReason);
        }

        if !self.quality_flags.other_issues {
            self.flag_reasons.clear();
        }
        self.assessment_submitted = true;
        self.timestamp = now;
        Ok(())
    }

    /// Why this response cannot be left yet, if anything.
    ///
    /// # Errors
    ///
    /// Returns the reason code for the first missing step of `variant`.
    pub fn completion_check(&self, variant: CompletionVariant) -> Result<(), RefusalReason> {
        if self.phase() >= variant.terminal_phase() {
            return Ok(());
        }
        if self.selected_option_index.is_none() {
            return Err(RefusalReason::NoSelection);
        }
        if !self.feedback_shown {
            return Err(RefusalReason::NotConfirmed);
        }
        if self.missing_flag_reason() {
            return Err(RefusalReason::MissingFlagReason);
        }
        Err(RefusalReason::QualityNotSubmitted)
    }

    #[must_use]
    pub fn is_complete(&self, variant: CompletionVariant) -> bool {
        self.completion_check(variant).is_ok()
    }

    fn missing_flag_reason(&self) -> bool {
        self.quality_flags.other_issues && self.flag_reasons.trim().is_empty()
    }

    fn ensure_editable(&self) -> Result<(), RefusalReason> {
        if self.assessment_submitted {
            Err(RefusalReason::AlreadyAssessed)
        } else {
            Ok(())
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
