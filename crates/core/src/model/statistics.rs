use serde::{Deserialize, Serialize};

use crate::model::response::{IssueFlag, ResponseRecord};
use crate::model::variant::CompletionVariant;

/// Per-tag issue counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueBreakdown {
    pub ground_truth_issues: usize,
    pub other_options_issues: usize,
    pub language_issues: usize,
    pub other_issues: usize,
}

impl IssueBreakdown {
    #[must_use]
    pub fn count(&self, flag: IssueFlag) -> usize {
        match flag {
            IssueFlag::GroundTruthNotClear => self.ground_truth_issues,
            IssueFlag::OtherOptionsSupported => self.other_options_issues,
            IssueFlag::LanguageIssues => self.language_issues,
            IssueFlag::OtherIssues => self.other_issues,
        }
    }
}

/// Whole-number percentages. A zero denominator always yields 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Percentages {
    /// answered / total
    pub answered: u32,
    /// correct / (answered - cannot tell)
    pub correct: u32,
    /// flagged / total
    pub flagged: u32,
    /// each tag / flagged
    pub ground_truth_issues: u32,
    pub other_options_issues: u32,
    pub language_issues: u32,
    pub other_issues: u32,
}

/// Aggregate numbers attached to a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStatistics {
    pub total_questions: usize,
    pub answered_questions: usize,
    pub correct_answers: usize,
    pub cannot_tell_answers: usize,
    pub flagged_questions: usize,
    pub issue_breakdown: IssueBreakdown,
    pub percentages: Percentages,
}

impl SubmissionStatistics {
    /// Compute statistics over `responses`.
    ///
    /// "Answered" means the response reached `variant`'s terminal phase;
    /// correctness is only counted over answered responses that did not
    /// abstain. Issue counts cover every response.
    #[must_use]
    pub fn from_responses(responses: &[ResponseRecord], variant: CompletionVariant) -> Self {
        let mut stats = Self {
            total_questions: responses.len(),
            ..Self::default()
        };

        for response in responses {
            if response.is_complete(variant) {
                stats.answered_questions += 1;
                if response.cannot_tell() {
                    stats.cannot_tell_answers += 1;
                } else if response.is_correct() {
                    stats.correct_answers += 1;
                }
            }

            let flags = response.quality_flags();
            if flags.any_issue() {
                stats.flagged_questions += 1;
            }
            let breakdown = &mut stats.issue_breakdown;
            breakdown.ground_truth_issues += usize::from(flags.ground_truth_not_clear);
            breakdown.other_options_issues += usize::from(flags.other_options_supported);
            breakdown.language_issues += usize::from(flags.language_issues);
            breakdown.other_issues += usize::from(flags.other_issues);
        }

        let scored = stats.answered_questions - stats.cannot_tell_answers;
        let flagged = stats.flagged_questions;
        let breakdown = stats.issue_breakdown;
        stats.percentages = Percentages {
            answered: percent(stats.answered_questions, stats.total_questions),
            correct: percent(stats.correct_answers, scored),
            flagged: percent(flagged, stats.total_questions),
            ground_truth_issues: percent(breakdown.ground_truth_issues, flagged),
            other_options_issues: percent(breakdown.other_options_issues, flagged),
            language_issues: percent(breakdown.language_issues, flagged),
            other_issues: percent(breakdown.other_issues, flagged),
        };
        stats
    }
}

/// `part / whole` as a rounded percentage (half rounds up); 0 when `whole` is 0.
#[must_use]
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = part as u128;
    let whole = whole as u128;
    let rounded = (part * 200 + whole) / (whole * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::options::PresentedOptionSet;
    use crate::model::question::QuestionDraft;
    use crate::model::response::OverallQuality;
    use crate::time::fixed_now;

    fn option_set() -> PresentedOptionSet {
        let q = QuestionDraft::new("q", "piano", "gt", vec!["x".into(), "y".into()], true)
            .validate()
            .unwrap();
        PresentedOptionSet::arrange(&q, &[0, 1, 2], Some("Cannot tell")).unwrap()
    }

    fn assessed(selected: usize, flags: &[IssueFlag]) -> ResponseRecord {
        let set = option_set();
        let now = fixed_now();
        let mut r = ResponseRecord::new(now);
        r.select_option(selected, set.len(), now).unwrap();
        r.confirm(&set, now).unwrap();
        for flag in flags {
            r.set_issue_flag(*flag, true, now).unwrap();
        }
        if flags.contains(&IssueFlag::OtherIssues) {
            r.set_flag_reasons("see comments", now).unwrap();
        }
        r.set_overall_quality(OverallQuality::Good, now).unwrap();
        r.submit_assessment(CompletionVariant::TwoPhase, now).unwrap();
        r
    }

    #[test]
    fn empty_input_has_zero_percentages() {
        let stats = SubmissionStatistics::from_responses(&[], CompletionVariant::TwoPhase);
        assert_eq!(stats, SubmissionStatistics::default());
        assert_eq!(stats.percentages.correct, 0);
        assert_eq!(stats.percentages.answered, 0);
    }

    #[test]
    fn counts_only_terminal_responses_as_answered() {
        let set = option_set();
        let mut selected_only = ResponseRecord::new(fixed_now());
        selected_only.select_option(0, set.len(), fixed_now()).unwrap();

        let responses = vec![
            assessed(0, &[]),
            assessed(1, &[IssueFlag::LanguageIssues]),
            assessed(3, &[IssueFlag::OtherIssues, IssueFlag::LanguageIssues]),
            selected_only,
        ];
        let stats = SubmissionStatistics::from_responses(&responses, CompletionVariant::TwoPhase);

        assert_eq!(stats.total_questions, 4);
        assert_eq!(stats.answered_questions, 3);
        assert_eq!(stats.cannot_tell_answers, 1);
        assert_eq!(stats.correct_answers, 1);
        assert_eq!(stats.flagged_questions, 2);
        assert_eq!(stats.issue_breakdown.count(IssueFlag::LanguageIssues), 2);
        assert_eq!(stats.issue_breakdown.other_issues, 1);

        assert_eq!(stats.percentages.answered, 75);
        assert_eq!(stats.percentages.correct, 50);
        assert_eq!(stats.percentages.flagged, 50);
        assert_eq!(stats.percentages.language_issues, 100);
        assert_eq!(stats.percentages.ground_truth_issues, 0);
    }

    #[test]
    fn percent_rounds_half_up_and_never_divides_by_zero() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(5, 0), 0);
        assert_eq!(percent(0, 0), 0);
    }
}
