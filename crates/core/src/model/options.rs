use thiserror::Error;

use crate::model::question::QuestionRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OptionSetError {
    #[error("ordering has {actual} entries, question has {expected} options")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("ordering is not a permutation (offending entry {entry})")]
    NotAPermutation { entry: usize },
}

/// The options of one question in the order they are shown.
///
/// Built from a permutation of `[ground truth, negatives...]`; the optional
/// abstain ("cannot tell") option is always appended last and never shuffled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedOptionSet {
    options: Vec<String>,
    order: Vec<usize>,
    ground_truth_index: usize,
    cannot_tell_index: Option<usize>,
}

impl PresentedOptionSet {
    /// Arrange `question`'s options according to `order`.
    ///
    /// `order[k]` is the canonical index (0 = ground truth) shown at position `k`.
    ///
    /// # Errors
    ///
    /// Returns `OptionSetError` if `order` is not a permutation of the question's options.
    pub fn arrange(
        question: &QuestionRecord,
        order: &[usize],
        cannot_tell: Option<&str>,
    ) -> Result<Self, OptionSetError> {
        let canonical = question.canonical_options();
        if order.len() != canonical.len() {
            return Err(OptionSetError::LengthMismatch {
                expected: canonical.len(),
                actual: order.len(),
            });
        }

        let mut seen = vec![false; canonical.len()];
        for &entry in order {
            match seen.get_mut(entry) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(OptionSetError::NotAPermutation { entry }),
            }
        }

        let mut options: Vec<String> = order.iter().map(|&i| canonical[i].to_owned()).collect();
        let ground_truth_index = order
            .iter()
            .position(|&i| i == 0)
            .ok_or(OptionSetError::NotAPermutation { entry: 0 })?;

        let cannot_tell_index = cannot_tell
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(|text| {
                options.push(text.to_owned());
                options.len() - 1
            });

        Ok(Self {
            options,
            order: order.to_vec(),
            ground_truth_index,
            cannot_tell_index,
        })
    }

    /// Options in source order, ground truth first.
    #[must_use]
    pub fn canonical(question: &QuestionRecord, cannot_tell: Option<&str>) -> Self {
        let options: Vec<String> = question
            .canonical_options()
            .into_iter()
            .map(str::to_owned)
            .chain(
                cannot_tell
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_owned),
            )
            .collect();
        let cannot_tell_index = (options.len() > question.option_count()).then(|| options.len() - 1);
        Self {
            options,
            order: (0..question.option_count()).collect(),
            ground_truth_index: 0,
            cannot_tell_index,
        }
    }

    /// Canonical index shown at each position; the abstain option is not part of it.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    #[must_use]
    pub fn ground_truth_index(&self) -> usize {
        self.ground_truth_index
    }

    #[must_use]
    pub fn cannot_tell_index(&self) -> Option<usize> {
        self.cannot_tell_index
    }

    #[must_use]
    pub fn is_cannot_tell(&self, index: usize) -> bool {
        self.cannot_tell_index == Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::QuestionDraft;

    fn question() -> QuestionRecord {
        QuestionDraft::new(
            "q1",
            "cooking",
            "Whisk the eggs longer",
            vec!["Add more salt".into(), "Use a bigger pan".into()],
            false,
        )
        .validate()
        .unwrap()
    }

    const PERMUTATIONS: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    #[test]
    fn ground_truth_index_points_at_ground_truth_for_every_order() {
        let q = question();
        for order in PERMUTATIONS {
            let set = PresentedOptionSet::arrange(&q, &order, None).unwrap();
            assert_eq!(set.option(set.ground_truth_index()), Some(q.ground_truth()));
            assert_eq!(set.len(), 3);
            assert_eq!(set.order(), order);
        }
    }

    #[test]
    fn ground_truth_survives_duplicate_distractor_text() {
        let q = QuestionDraft::new("dup", "dance", "same", vec!["same".into()], true)
            .validate()
            .unwrap();
        let set = PresentedOptionSet::arrange(&q, &[1, 0], None).unwrap();
        assert_eq!(set.ground_truth_index(), 1);
    }

    #[test]
    fn cannot_tell_is_appended_last() {
        let set = PresentedOptionSet::arrange(&question(), &[2, 0, 1], Some("Cannot tell")).unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.cannot_tell_index(), Some(3));
        assert_eq!(set.option(3), Some("Cannot tell"));
        assert!(set.is_cannot_tell(3));
        assert_eq!(set.ground_truth_index(), 1);
    }

    #[test]
    fn blank_cannot_tell_is_ignored() {
        let set = PresentedOptionSet::canonical(&question(), Some("  "));
        assert_eq!(set.cannot_tell_index(), None);
        assert_eq!(set.ground_truth_index(), 0);
    }

    #[test]
    fn rejects_non_permutations() {
        let q = question();
        assert_eq!(
            PresentedOptionSet::arrange(&q, &[0, 1], None).unwrap_err(),
            OptionSetError::LengthMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(
            PresentedOptionSet::arrange(&q, &[0, 1, 1], None).unwrap_err(),
            OptionSetError::NotAPermutation { entry: 1 }
        );
        assert_eq!(
            PresentedOptionSet::arrange(&q, &[0, 1, 7], None).unwrap_err(),
            OptionSetError::NotAPermutation { entry: 7 }
        );
    }
}
