use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{info, warn};

use survey_core::model::{
    QuestionDraft, QuestionRecord, SelectionStrategy, SessionId, SurveySettings,
};

use crate::error::LoadError;
use crate::shuffle::{shuffle_seeded, stable_seed};

//
// ─── SOURCES ───────────────────────────────────────────────────────────────────
//

/// Where raw question records come from.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch every raw record.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` when the data cannot be fetched or is not a JSON array of records.
    async fn fetch(&self) -> Result<Vec<QuestionDraft>, LoadError>;
}

/// Parse a JSON array of question records.
///
/// # Errors
///
/// Returns `LoadError::Parse` for anything that is not an array of record objects.
pub fn parse_question_json(text: &str) -> Result<Vec<QuestionDraft>, LoadError> {
    Ok(serde_json::from_str(text)?)
}

/// Question data already in memory, e.g. a bundled file.
#[derive(Clone, Debug)]
pub struct StaticQuestionSource {
    json: String,
}

impl StaticQuestionSource {
    #[must_use]
    pub fn from_json(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    async fn fetch(&self) -> Result<Vec<QuestionDraft>, LoadError> {
        parse_question_json(&self.json)
    }
}

/// Question data served over HTTP as a JSON array.
#[derive(Clone)]
pub struct HttpQuestionSource {
    client: Client,
    url: Url,
}

impl HttpQuestionSource {
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn fetch(&self) -> Result<Vec<QuestionDraft>, LoadError> {
        let response = self.client.get(self.url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(LoadError::HttpStatus(response.status()));
        }
        let body = response.text().await?;
        parse_question_json(&body)
    }
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// Which questions one survey run sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSelection {
    pub domain: Option<String>,
    pub strategy: SelectionStrategy,
}

impl QuestionSelection {
    #[must_use]
    pub fn all() -> Self {
        Self {
            domain: None,
            strategy: SelectionStrategy::All,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &SurveySettings) -> Self {
        Self {
            domain: settings.domain().map(str::to_owned),
            strategy: settings.selection_strategy(),
        }
    }
}

/// What the partition step actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionApplied {
    NotRequested,
    Slice {
        partition_number: u32,
        partition_count: u32,
        range: Range<usize>,
    },
    /// The requested number was outside `1..=partition_count`; the whole set was kept.
    Fallback {
        requested: u32,
        partition_count: u32,
    },
}

/// The question set a survey run works on.
#[derive(Debug, Clone)]
pub struct LoadedQuestionSet {
    pub questions: Vec<QuestionRecord>,
    /// Valid records before domain filtering.
    pub available: usize,
    /// Records left after domain filtering.
    pub filtered: usize,
    pub partition: PartitionApplied,
}

/// Slice `p` (1-based) of `count` near-equal contiguous slices over `total` items.
///
/// Returns `None` when `p` is outside `1..=count`.
#[must_use]
pub fn partition_range(total: usize, count: u32, number: u32) -> Option<Range<usize>> {
    if count == 0 || number == 0 || number > count {
        return None;
    }
    let count = usize::try_from(count).ok()?;
    let number = usize::try_from(number).ok()?;
    let size = total.div_ceil(count);
    let start = ((number - 1) * size).min(total);
    let end = (number * size).min(total);
    Some(start..end)
}

/// Equal quota per `(domain, feedback type)` group, interleaved.
///
/// Each group is shuffled with a seed of the session, domain and feedback type,
/// then cut to `samples_per_type`; the union is shuffled once more.
#[must_use]
pub fn balanced_sample(
    questions: Vec<QuestionRecord>,
    samples_per_type: usize,
    session_id: SessionId,
) -> Vec<QuestionRecord> {
    let session = session_id.to_string();
    let mut groups: BTreeMap<(String, bool), Vec<QuestionRecord>> = BTreeMap::new();
    for question in questions {
        groups
            .entry((question.domain().to_owned(), question.is_good_execution()))
            .or_default()
            .push(question);
    }

    let mut sampled = Vec::new();
    for ((domain, _), mut group) in groups {
        let label = group
            .first()
            .map(|q| q.feedback_type().label())
            .unwrap_or_default();
        shuffle_seeded(&mut group, stable_seed(&[&session, &domain, label]));
        group.truncate(samples_per_type);
        sampled.extend(group);
    }

    shuffle_seeded(&mut sampled, stable_seed(&[&session, "interleave"]));
    sampled
}

//
// ─── LOADER ────────────────────────────────────────────────────────────────────
//

/// Fetches, validates, filters and narrows the question set.
#[derive(Clone)]
pub struct QuestionSetLoader {
    source: Arc<dyn QuestionSource>,
}

impl QuestionSetLoader {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionSource>) -> Self {
        Self { source }
    }

    /// Load the questions `selection` picks for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` when fetching fails, any record is invalid, or nothing is left.
    pub async fn load(
        &self,
        selection: &QuestionSelection,
        session_id: SessionId,
    ) -> Result<LoadedQuestionSet, LoadError> {
        let drafts = self.source.fetch().await?;
        let questions = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                draft
                    .validate()
                    .map_err(|source| LoadError::InvalidRecord { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let available = questions.len();

        let questions: Vec<QuestionRecord> = match selection.domain.as_deref() {
            Some(domain) => questions
                .into_iter()
                .filter(|q| q.domain() == domain)
                .collect(),
            None => questions,
        };
        let filtered = questions.len();

        let (questions, partition) = match selection.strategy {
            SelectionStrategy::All => (questions, PartitionApplied::NotRequested),
            SelectionStrategy::Partitioned {
                partition_count,
                partition_number,
            } => match partition_range(filtered, partition_count, partition_number) {
                Some(range) => {
                    let slice = questions[range.clone()].to_vec();
                    (
                        slice,
                        PartitionApplied::Slice {
                            partition_number,
                            partition_count,
                            range,
                        },
                    )
                }
                None => {
                    warn!(
                        requested = partition_number,
                        partition_count, "partition out of range, using full question set"
                    );
                    (
                        questions,
                        PartitionApplied::Fallback {
                            requested: partition_number,
                            partition_count,
                        },
                    )
                }
            },
            SelectionStrategy::Balanced { samples_per_type } => (
                balanced_sample(questions, samples_per_type, session_id),
                PartitionApplied::NotRequested,
            ),
        };

        if questions.is_empty() {
            return Err(LoadError::Empty {
                domain: selection.domain.clone(),
            });
        }

        info!(
            available,
            filtered,
            selected = questions.len(),
            domain = selection.domain.as_deref().unwrap_or("*"),
            "question set loaded"
        );

        Ok(LoadedQuestionSet {
            questions,
            available,
            filtered,
            partition,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::str::FromStr;

    fn record(id: &str, domain: &str, is_ge: bool) -> QuestionDraft {
        QuestionDraft::new(id, domain, format!("gt {id}"), vec![format!("neg {id}")], is_ge)
    }

    fn ten_questions() -> String {
        let drafts: Vec<QuestionDraft> = (1..=10)
            .map(|i| record(&format!("q{i}"), "basketball", i % 2 == 0))
            .collect();
        serde_json::to_string(&drafts).unwrap()
    }

    fn session() -> SessionId {
        SessionId::from_str("0b0e7a52-7a0e-4f7c-8c51-3f1d3b6a9e10").unwrap()
    }

    fn loader(json: String) -> QuestionSetLoader {
        QuestionSetLoader::new(Arc::new(StaticQuestionSource::from_json(json)))
    }

    fn partitioned(number: u32) -> QuestionSelection {
        QuestionSelection {
            domain: Some("basketball".into()),
            strategy: SelectionStrategy::Partitioned {
                partition_count: 3,
                partition_number: number,
            },
        }
    }

    #[test]
    fn partition_ranges_cover_without_overlap() {
        assert_eq!(partition_range(10, 3, 1), Some(0..4));
        assert_eq!(partition_range(10, 3, 2), Some(4..8));
        assert_eq!(partition_range(10, 3, 3), Some(8..10));
        assert_eq!(partition_range(10, 3, 0), None);
        assert_eq!(partition_range(10, 3, 4), None);
        assert_eq!(partition_range(2, 3, 3), Some(2..2));
    }

    #[tokio::test]
    async fn ten_questions_in_three_partitions() {
        let loader = loader(ten_questions());
        let mut sizes = Vec::new();
        let mut seen = HashSet::new();
        for number in 1..=3 {
            let set = loader.load(&partitioned(number), session()).await.unwrap();
            sizes.push(set.questions.len());
            for q in &set.questions {
                assert!(seen.insert(q.id().clone()), "partitions overlap");
            }
        }
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(seen.len(), 10);
    }

    #[tokio::test]
    async fn out_of_range_partition_falls_back_to_full_set() {
        let loader = loader(ten_questions());
        for number in [0, 4] {
            let set = loader.load(&partitioned(number), session()).await.unwrap();
            assert_eq!(set.questions.len(), 10);
            assert_eq!(
                set.partition,
                PartitionApplied::Fallback {
                    requested: number,
                    partition_count: 3
                }
            );
        }
    }

    #[tokio::test]
    async fn balanced_sampling_takes_quota_per_type() {
        let mut drafts = Vec::new();
        for domain in ["dance", "cooking"] {
            for i in 0..5 {
                drafts.push(record(&format!("{domain}-ge-{i}"), domain, true));
                drafts.push(record(&format!("{domain}-tfi-{i}"), domain, false));
            }
        }
        let loader = loader(serde_json::to_string(&drafts).unwrap());
        let selection = QuestionSelection {
            domain: None,
            strategy: SelectionStrategy::Balanced {
                samples_per_type: 2,
            },
        };

        let set = loader.load(&selection, session()).await.unwrap();
        assert_eq!(set.questions.len(), 8);
        for domain in ["dance", "cooking"] {
            let in_domain: Vec<_> = set.questions.iter().filter(|q| q.domain() == domain).collect();
            assert_eq!(in_domain.len(), 4);
            assert_eq!(in_domain.iter().filter(|q| q.is_good_execution()).count(), 2);
        }

        let again = loader.load(&selection, session()).await.unwrap();
        let ids = |s: &LoadedQuestionSet| s.questions.iter().map(|q| q.id().clone()).collect::<Vec<_>>();
        assert_eq!(ids(&set), ids(&again));
    }

    #[tokio::test]
    async fn balanced_sampling_keeps_small_groups_whole() {
        let drafts = vec![record("a", "dance", true), record("b", "dance", false)];
        let sampled = balanced_sample(
            drafts.into_iter().map(|d| d.validate().unwrap()).collect(),
            5,
            session(),
        );
        assert_eq!(sampled.len(), 2);
    }

    #[tokio::test]
    async fn invalid_record_fails_the_load() {
        let json = r#"[
            {"id": "ok", "groundTruth": "gt", "negative_comments": ["n"], "is_ge": true},
            {"id": "bad", "groundTruth": "", "negative_comments": ["n"], "is_ge": true}
        ]"#;
        let err = loader(json.into())
            .load(&QuestionSelection::all(), session())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidRecord { index: 1, .. }));
    }

    #[tokio::test]
    async fn empty_result_and_bad_json_are_load_errors() {
        let selection = QuestionSelection {
            domain: Some("violin".into()),
            strategy: SelectionStrategy::All,
        };
        let err = loader(ten_questions()).load(&selection, session()).await.unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));

        let err = loader("{\"not\": \"an array\"}".into())
            .load(&QuestionSelection::all(), session())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }
}
