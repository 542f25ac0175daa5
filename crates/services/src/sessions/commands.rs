use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use survey_core::model::{IssueFlag, OverallQuality, TransitionRefusal};

use super::store::{Advance, ResponseStore};

/// Every user action the survey understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SurveyCommand {
    SelectOption { option_index: usize },
    Confirm,
    SubmitAssessment,
    Advance,
    GoBack,
    EditComment { text: String },
    SetIssueFlag { flag: IssueFlag, on: bool },
    SetOverallQuality { quality: OverallQuality },
    SetFlagReasons { text: String },
}

/// What an accepted command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Selected { option_index: usize },
    /// Feedback is due: show whether the pick matched the ground truth.
    Confirmed {
        is_correct: bool,
        cannot_tell: bool,
        ground_truth_index: usize,
    },
    Assessed,
    Moved { to: usize },
    /// The last question is done; show the submission form.
    Finished,
    /// A free-text or flag edit that does not change the phase.
    Updated,
}

impl CommandOutcome {
    /// Whether the position changed and a new question must be shown.
    #[must_use]
    pub fn changes_question(self) -> bool {
        matches!(self, CommandOutcome::Moved { .. })
    }
}

/// Apply `command` to `store`.
///
/// # Errors
///
/// Returns the `TransitionRefusal` of the current question when the command
/// is not allowed; the store is then unchanged.
pub fn dispatch(
    store: &mut ResponseStore,
    command: SurveyCommand,
    now: DateTime<Utc>,
) -> Result<CommandOutcome, TransitionRefusal> {
    match command {
        SurveyCommand::SelectOption { option_index } => {
            store.select_option(option_index, now)?;
            Ok(CommandOutcome::Selected { option_index })
        }
        SurveyCommand::Confirm => {
            let is_correct = store.confirm(now)?;
            Ok(CommandOutcome::Confirmed {
                is_correct,
                cannot_tell: store.current_response().cannot_tell(),
                ground_truth_index: store.current_options().ground_truth_index(),
            })
        }
        SurveyCommand::SubmitAssessment => {
            store.submit_assessment(now)?;
            Ok(CommandOutcome::Assessed)
        }
        SurveyCommand::Advance => Ok(match store.advance()? {
            Advance::Moved { to } => CommandOutcome::Moved { to },
            Advance::Finished => CommandOutcome::Finished,
        }),
        SurveyCommand::GoBack => {
            let to = store.go_back()?;
            Ok(CommandOutcome::Moved { to })
        }
        SurveyCommand::EditComment { text } => {
            store.edit_comment(text, now)?;
            Ok(CommandOutcome::Updated)
        }
        SurveyCommand::SetIssueFlag { flag, on } => {
            store.set_issue_flag(flag, on, now)?;
            Ok(CommandOutcome::Updated)
        }
        SurveyCommand::SetOverallQuality { quality } => {
            store.set_overall_quality(quality, now)?;
            Ok(CommandOutcome::Updated)
        }
        SurveyCommand::SetFlagReasons { text } => {
            store.set_flag_reasons(text, now)?;
            Ok(CommandOutcome::Updated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_core::model::{
        AnswerPhase, CompletionVariant, QuestionDraft, RefusalReason, SessionId,
    };
    use survey_core::time::fixed_now;

    fn store() -> ResponseStore {
        let questions = (1..=2)
            .map(|i| {
                QuestionDraft::new(format!("q{i}"), "dance", "gt", vec!["x".into()], true)
                    .validate()
                    .unwrap()
            })
            .collect();
        ResponseStore::new(
            SessionId::generate(),
            CompletionVariant::TwoPhase,
            questions,
            Some("Cannot tell"),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn commands_deserialize_from_tagged_json() {
        let cmd: SurveyCommand =
            serde_json::from_str(r#"{"type":"select-option","option_index":1}"#).unwrap();
        assert_eq!(cmd, SurveyCommand::SelectOption { option_index: 1 });

        let cmd: SurveyCommand =
            serde_json::from_str(r#"{"type":"set-issue-flag","flag":"other-issues","on":true}"#)
                .unwrap();
        assert_eq!(
            cmd,
            SurveyCommand::SetIssueFlag {
                flag: IssueFlag::OtherIssues,
                on: true
            }
        );
    }

    #[test]
    fn full_two_phase_walk_through() {
        let mut store = store();
        let now = fixed_now();
        let gt = store.current_options().ground_truth_index();

        let steps = [
            SurveyCommand::SelectOption { option_index: gt },
            SurveyCommand::Confirm,
            SurveyCommand::SetIssueFlag {
                flag: IssueFlag::OtherIssues,
                on: true,
            },
            SurveyCommand::SetFlagReasons {
                text: "audio is missing".into(),
            },
            SurveyCommand::SetOverallQuality {
                quality: OverallQuality::Bad,
            },
            SurveyCommand::EditComment {
                text: "hard to see".into(),
            },
            SurveyCommand::SubmitAssessment,
        ];
        let mut last_phase = AnswerPhase::Unanswered;
        for step in steps {
            dispatch(&mut store, step, now).unwrap();
            let phase = store.current_response().phase();
            assert!(phase >= last_phase);
            last_phase = phase;
        }
        assert_eq!(last_phase, AnswerPhase::Assessed);

        assert_eq!(
            dispatch(&mut store, SurveyCommand::Advance, now).unwrap(),
            CommandOutcome::Moved { to: 1 }
        );
        assert_eq!(
            dispatch(&mut store, SurveyCommand::GoBack, now).unwrap(),
            CommandOutcome::Moved { to: 0 }
        );
        let refusal = dispatch(
            &mut store,
            SurveyCommand::EditComment {
                text: "too late".into(),
            },
            now,
        )
        .unwrap_err();
        assert_eq!(refusal.reason, RefusalReason::AlreadyAssessed);
    }

    #[test]
    fn confirm_reports_feedback_details() {
        let mut store = store();
        let now = fixed_now();
        let abstain = store.current_options().cannot_tell_index().unwrap();

        dispatch(
            &mut store,
            SurveyCommand::SelectOption {
                option_index: abstain,
            },
            now,
        )
        .unwrap();
        let outcome = dispatch(&mut store, SurveyCommand::Confirm, now).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Confirmed {
                is_correct: false,
                cannot_tell: true,
                ground_truth_index: store.current_options().ground_truth_index(),
            }
        );
    }

    #[test]
    fn missing_flag_reason_blocks_assessment() {
        let mut store = store();
        let now = fixed_now();
        for step in [
            SurveyCommand::SelectOption { option_index: 0 },
            SurveyCommand::Confirm,
            SurveyCommand::SetIssueFlag {
                flag: IssueFlag::OtherIssues,
                on: true,
            },
            SurveyCommand::SetOverallQuality {
                quality: OverallQuality::Good,
            },
        ] {
            dispatch(&mut store, step, now).unwrap();
        }

        let refusal = dispatch(&mut store, SurveyCommand::SubmitAssessment, now).unwrap_err();
        assert_eq!(refusal.reason, RefusalReason::MissingFlagReason);
        let refusal = dispatch(&mut store, SurveyCommand::Advance, now).unwrap_err();
        assert_eq!(refusal.reason, RefusalReason::MissingFlagReason);
    }
}
