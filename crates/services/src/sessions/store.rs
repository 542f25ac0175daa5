use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use survey_core::model::{
    AnswerPhase, CompletionVariant, IssueFlag, OptionSetError, OverallQuality, PresentedOptionSet,
    QuestionRecord, RefusalReason, ResponseRecord, SessionId, TransitionRefusal,
};

use crate::error::LoadError;
use crate::shuffle::{seeded_permutation, stable_seed};

/// Present `question`'s options in the order this session always sees them.
///
/// # Errors
///
/// Returns `OptionSetError` only if the generated order is not a permutation.
pub fn present_options(
    question: &QuestionRecord,
    session_id: SessionId,
    cannot_tell: Option<&str>,
) -> Result<PresentedOptionSet, OptionSetError> {
    let seed = stable_seed(&[&session_id.to_string(), question.id().as_str()]);
    let order = seeded_permutation(question.option_count(), seed);
    PresentedOptionSet::arrange(question, &order, cannot_tell)
}

/// Result of a successful `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved { to: usize },
    /// The last question is done; the index stays where it is.
    Finished,
}

/// Owns the question sequence, the presented option sets and one
/// response per question, plus the current position.
///
/// All mutation goes through methods that either apply fully or return a
/// `TransitionRefusal` without touching anything.
#[derive(Debug, Clone)]
pub struct ResponseStore {
    session_id: SessionId,
    variant: CompletionVariant,
    questions: Vec<QuestionRecord>,
    option_sets: Vec<PresentedOptionSet>,
    responses: Vec<ResponseRecord>,
    current_index: usize,
    started_at: DateTime<Utc>,
}

impl ResponseStore {
    /// Fresh store: every response unanswered, positioned at the first question.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Empty` for an empty question list.
    pub fn new(
        session_id: SessionId,
        variant: CompletionVariant,
        questions: Vec<QuestionRecord>,
        cannot_tell: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, LoadError> {
        if questions.is_empty() {
            return Err(LoadError::Empty { domain: None });
        }
        let option_sets = questions
            .iter()
            .map(|q| present_options(q, session_id, cannot_tell))
            .collect::<Result<Vec<_>, _>>()?;
        let responses = vec![ResponseRecord::new(now); questions.len()];
        Ok(Self {
            session_id,
            variant,
            questions,
            option_sets,
            responses,
            current_index: 0,
            started_at: now,
        })
    }

    /// Replace responses and position with restored progress.
    ///
    /// `responses` is padded or truncated to the question count and the
    /// index is clamped, so callers may pass unrepaired data.
    pub fn restore(&mut self, mut responses: Vec<ResponseRecord>, current_index: usize) {
        responses.resize_with(self.questions.len(), || ResponseRecord::new(self.started_at));
        self.responses = responses;
        self.current_index = current_index.min(self.questions.len() - 1);
    }

    /// Show options in previously saved orders, keyed by question id.
    ///
    /// Orders that no longer fit their question are ignored and keep the
    /// seeded order. Returns how many orders were applied.
    pub fn restore_option_orders(&mut self, orders: &BTreeMap<String, Vec<usize>>) -> usize {
        let mut applied = 0;
        for (question, set) in self.questions.iter().zip(self.option_sets.iter_mut()) {
            let Some(order) = orders.get(question.id().as_str()) else {
                continue;
            };
            let cannot_tell = set
                .cannot_tell_index()
                .and_then(|index| set.option(index))
                .map(str::to_owned);
            if let Ok(arranged) =
                PresentedOptionSet::arrange(question, order, cannot_tell.as_deref())
            {
                *set = arranged;
                applied += 1;
            }
        }
        applied
    }

    /// Presented order of every question, keyed by question id.
    #[must_use]
    pub fn option_orders(&self) -> BTreeMap<&str, &[usize]> {
        self.questions
            .iter()
            .zip(&self.option_sets)
            .map(|(question, set)| (question.id().as_str(), set.order()))
            .collect()
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn variant(&self) -> CompletionVariant {
        self.variant
    }

    #[must_use]
    pub fn terminal_phase(&self) -> AnswerPhase {
        self.variant.terminal_phase()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; a store is never built without questions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current_index + 1 == self.questions.len()
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    #[must_use]
    pub fn option_sets(&self) -> &[PresentedOptionSet] {
        &self.option_sets
    }

    #[must_use]
    pub fn responses(&self) -> &[ResponseRecord] {
        &self.responses
    }

    #[must_use]
    pub fn current_question(&self) -> &QuestionRecord {
        &self.questions[self.current_index]
    }

    #[must_use]
    pub fn current_options(&self) -> &PresentedOptionSet {
        &self.option_sets[self.current_index]
    }

    #[must_use]
    pub fn current_response(&self) -> &ResponseRecord {
        &self.responses[self.current_index]
    }

    /// Responses that reached the terminal phase.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.responses
            .iter()
            .filter(|r| r.is_complete(self.variant))
            .count()
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// `already-confirmed` or `option-out-of-range`.
    pub fn select_option(
        &mut self,
        option_index: usize,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionRefusal> {
        let option_count = self.option_sets[self.current_index].len();
        self.with_current(|r| r.select_option(option_index, option_count, now))
    }

    /// Confirm the current selection. Returns whether it was correct.
    ///
    /// # Errors
    ///
    /// `no-selection`, `already-confirmed` or `option-out-of-range`.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<bool, TransitionRefusal> {
        let index = self.current_index;
        self.responses[index]
            .confirm(&self.option_sets[index], now)
            .map_err(|reason| TransitionRefusal::new(index, reason))
    }

    /// # Errors
    ///
    /// The first unmet precondition of the assessment.
    pub fn submit_assessment(&mut self, now: DateTime<Utc>) -> Result<(), TransitionRefusal> {
        let variant = self.variant;
        self.with_current(|r| r.submit_assessment(variant, now))
    }

    /// Move forward once the current question is done.
    ///
    /// # Errors
    ///
    /// The reason the current response is not yet at the terminal phase.
    pub fn advance(&mut self) -> Result<Advance, TransitionRefusal> {
        self.current_response()
            .completion_check(self.variant)
            .map_err(|reason| TransitionRefusal::new(self.current_index, reason))?;
        if self.is_last() {
            return Ok(Advance::Finished);
        }
        self.current_index += 1;
        Ok(Advance::Moved {
            to: self.current_index,
        })
    }

    /// Step back one question without touching any response.
    ///
    /// # Errors
    ///
    /// `at-first-question` on the first question.
    pub fn go_back(&mut self) -> Result<usize, TransitionRefusal> {
        if self.current_index == 0 {
            return Err(TransitionRefusal::new(0, RefusalReason::AtFirstQuestion));
        }
        self.current_index -= 1;
        Ok(self.current_index)
    }

    /// # Errors
    ///
    /// `already-assessed`.
    pub fn edit_comment(
        &mut self,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionRefusal> {
        let text = text.into();
        self.with_current(|r| r.edit_comments(text, now))
    }

    /// # Errors
    ///
    /// `already-assessed`.
    pub fn set_issue_flag(
        &mut self,
        flag: IssueFlag,
        on: bool,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionRefusal> {
        self.with_current(|r| r.set_issue_flag(flag, on, now))
    }

    /// # Errors
    ///
    /// `already-assessed`.
    pub fn set_overall_quality(
        &mut self,
        quality: OverallQuality,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionRefusal> {
        self.with_current(|r| r.set_overall_quality(quality, now))
    }

    /// # Errors
    ///
    /// `already-assessed`.
    pub fn set_flag_reasons(
        &mut self,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionRefusal> {
        let text = text.into();
        self.with_current(|r| r.set_flag_reasons(text, now))
    }

    fn with_current<T>(
        &mut self,
        apply: impl FnOnce(&mut ResponseRecord) -> Result<T, RefusalReason>,
    ) -> Result<T, TransitionRefusal> {
        let index = self.current_index;
        apply(&mut self.responses[index]).map_err(|reason| TransitionRefusal::new(index, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_core::model::QuestionDraft;
    use survey_core::time::fixed_now;

    fn questions(n: usize) -> Vec<QuestionRecord> {
        (1..=n)
            .map(|i| {
                QuestionDraft::new(
                    format!("q{i}"),
                    "cooking",
                    format!("right {i}"),
                    vec![format!("wrong a{i}"), format!("wrong b{i}")],
                    i % 2 == 0,
                )
                .validate()
                .unwrap()
            })
            .collect()
    }

    fn store(variant: CompletionVariant, n: usize) -> ResponseStore {
        ResponseStore::new(SessionId::generate(), variant, questions(n), None, fixed_now()).unwrap()
    }

    #[test]
    fn option_order_is_stable_per_session_and_question() {
        let session = SessionId::generate();
        let q = &questions(1)[0];
        let first = present_options(q, session, Some("Cannot tell")).unwrap();
        let second = present_options(q, session, Some("Cannot tell")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.option(first.ground_truth_index()), Some("right 1"));
        assert_eq!(first.cannot_tell_index(), Some(3));
    }

    #[test]
    fn advance_refuses_until_terminal_phase() {
        let mut store = store(CompletionVariant::TwoPhase, 2);
        let now = fixed_now();

        let refusal = store.advance().unwrap_err();
        assert_eq!(refusal.reason, RefusalReason::NoSelection);
        assert_eq!(refusal.question_index, 0);

        store.select_option(0, now).unwrap();
        assert_eq!(store.advance().unwrap_err().reason, RefusalReason::NotConfirmed);

        store.confirm(now).unwrap();
        assert_eq!(
            store.advance().unwrap_err().reason,
            RefusalReason::QualityNotSubmitted
        );

        store.set_overall_quality(OverallQuality::Good, now).unwrap();
        store.submit_assessment(now).unwrap();
        assert_eq!(store.advance().unwrap(), Advance::Moved { to: 1 });
        assert_eq!(store.current_index(), 1);
    }

    #[test]
    fn single_phase_advances_after_confirm_and_finishes_on_last() {
        let mut store = store(CompletionVariant::SinglePhase, 1);
        let now = fixed_now();
        store.select_option(1, now).unwrap();
        store.confirm(now).unwrap();

        assert_eq!(
            store.submit_assessment(now).unwrap_err().reason,
            RefusalReason::AssessmentDisabled
        );
        assert_eq!(store.advance().unwrap(), Advance::Finished);
        assert_eq!(store.current_index(), 0);
        assert_eq!(store.answered_count(), 1);
    }

    #[test]
    fn confirm_scores_against_presented_order() {
        let mut store = store(CompletionVariant::TwoPhase, 1);
        let gt = store.current_options().ground_truth_index();
        store.select_option(gt, fixed_now()).unwrap();
        assert!(store.confirm(fixed_now()).unwrap());
        assert!(store.current_response().is_correct());
    }

    #[test]
    fn refusals_leave_state_untouched() {
        let mut store = store(CompletionVariant::TwoPhase, 2);
        let before = store.responses().to_vec();

        assert_eq!(
            store.select_option(9, fixed_now()).unwrap_err().reason,
            RefusalReason::OptionOutOfRange
        );
        assert_eq!(
            store.go_back().unwrap_err().reason,
            RefusalReason::AtFirstQuestion
        );
        assert_eq!(store.responses(), before.as_slice());
        assert_eq!(store.current_index(), 0);
    }

    #[test]
    fn restore_pads_truncates_and_clamps() {
        let mut store = store(CompletionVariant::TwoPhase, 3);
        let mut answered = ResponseRecord::new(fixed_now());
        answered.select_option(0, 3, fixed_now()).unwrap();

        store.restore(vec![answered.clone()], 10);
        assert_eq!(store.responses().len(), 3);
        assert_eq!(store.responses()[0], answered);
        assert_eq!(store.current_index(), 2);

        store.restore(vec![answered; 5], 1);
        assert_eq!(store.responses().len(), 3);
        assert_eq!(store.current_index(), 1);
    }

    #[test]
    fn restored_option_orders_replace_valid_entries_only() {
        let mut store = store(CompletionVariant::SinglePhase, 2);
        let orders = BTreeMap::from([
            ("q1".to_owned(), vec![2, 0, 1]),
            ("q2".to_owned(), vec![0, 0, 1]),
            ("gone".to_owned(), vec![1, 2, 0]),
        ]);
        let q2_before = store.option_sets()[1].clone();

        assert_eq!(store.restore_option_orders(&orders), 1);
        let q1 = &store.option_sets()[0];
        assert_eq!(q1.order(), &[2, 0, 1]);
        assert_eq!(q1.options(), ["wrong b1", "right 1", "wrong a1"]);
        assert_eq!(q1.ground_truth_index(), 1);
        assert_eq!(store.option_sets()[1], q2_before);
        assert_eq!(store.option_orders()["q1"], &[2, 0, 1]);
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let err = ResponseStore::new(
            SessionId::generate(),
            CompletionVariant::TwoPhase,
            Vec::new(),
            None,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
    }
}
