use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::variant::CompletionVariant;

/// Auto-save safety-net interval when none is configured.
pub const DEFAULT_AUTO_SAVE_INTERVAL_SECS: u64 = 30;

/// Longest accepted auto-save interval (one day).
pub const MAX_AUTO_SAVE_INTERVAL_SECS: u64 = 86_400;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("submission endpoint is required")]
    MissingSubmissionEndpoint,

    #[error("invalid submission endpoint URL")]
    InvalidSubmissionEndpoint,

    #[error("invalid question source URL")]
    InvalidQuestionSourceUrl,

    #[error("auto-save interval must be between 1 and {MAX_AUTO_SAVE_INTERVAL_SECS} seconds")]
    InvalidAutoSaveInterval,

    #[error("samples per type must be > 0")]
    InvalidSamplesPerType,

    #[error("partition count for domain {domain:?} must be > 0")]
    InvalidPartitionCount { domain: String },

    #[error("partitioning and balanced sampling cannot both be configured")]
    ConflictingSelection,
}

/// How the loader narrows the filtered question set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    All,
    /// One contiguous slice out of `partition_count`; `partition_number` is 1-based.
    Partitioned {
        partition_count: u32,
        partition_number: u32,
    },
    /// Equal quota per (domain, feedback type).
    Balanced { samples_per_type: usize },
}

/// Deployment configuration as written in JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurveySettingsDraft {
    pub domain: Option<String>,
    pub partition_number: Option<u32>,
    pub partition_counts: Option<BTreeMap<String, u32>>,
    pub samples_per_type: Option<usize>,
    pub variant: Option<CompletionVariant>,
    pub cannot_tell_option: Option<String>,
    pub submission_endpoint: Option<String>,
    pub question_source_url: Option<String>,
    pub auto_save_interval_secs: Option<u64>,
}

impl SurveySettingsDraft {
    #[must_use]
    pub fn new(submission_endpoint: impl Into<String>) -> Self {
        Self {
            submission_endpoint: Some(submission_endpoint.into()),
            ..Self::default()
        }
    }

    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for missing/invalid URLs, zero intervals or quotas,
    /// and for configuring partitioning together with balanced sampling.
    pub fn validate(self) -> Result<SurveySettings, SettingsError> {
        let endpoint = normalize_optional(self.submission_endpoint)
            .ok_or(SettingsError::MissingSubmissionEndpoint)?;
        let submission_endpoint =
            Url::parse(&endpoint).map_err(|_| SettingsError::InvalidSubmissionEndpoint)?;

        let question_source_url = normalize_optional(self.question_source_url)
            .map(|raw| Url::parse(&raw).map_err(|_| SettingsError::InvalidQuestionSourceUrl))
            .transpose()?;

        let auto_save_interval_secs = self
            .auto_save_interval_secs
            .unwrap_or(DEFAULT_AUTO_SAVE_INTERVAL_SECS);
        if !(1..=MAX_AUTO_SAVE_INTERVAL_SECS).contains(&auto_save_interval_secs) {
            return Err(SettingsError::InvalidAutoSaveInterval);
        }

        if self.samples_per_type == Some(0) {
            return Err(SettingsError::InvalidSamplesPerType);
        }
        if self.samples_per_type.is_some() && self.partition_number.is_some() {
            return Err(SettingsError::ConflictingSelection);
        }

        let partition_counts = self
            .partition_counts
            .unwrap_or_else(SurveySettings::default_partition_counts);
        if let Some((domain, _)) = partition_counts.iter().find(|(_, count)| **count == 0) {
            return Err(SettingsError::InvalidPartitionCount {
                domain: domain.clone(),
            });
        }

        Ok(SurveySettings {
            domain: normalize_optional(self.domain),
            partition_number: self.partition_number,
            partition_counts,
            samples_per_type: self.samples_per_type,
            variant: self.variant.unwrap_or_default(),
            cannot_tell_option: normalize_optional(self.cannot_tell_option),
            submission_endpoint,
            question_source_url,
            auto_save_interval_secs,
        })
    }
}

/// Validated deployment configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurveySettings {
    domain: Option<String>,
    partition_number: Option<u32>,
    partition_counts: BTreeMap<String, u32>,
    samples_per_type: Option<usize>,
    variant: CompletionVariant,
    cannot_tell_option: Option<String>,
    submission_endpoint: Url,
    question_source_url: Option<Url>,
    auto_save_interval_secs: u64,
}

impl SurveySettings {
    /// Partition counts of the multi-link deployment.
    #[must_use]
    pub fn default_partition_counts() -> BTreeMap<String, u32> {
        [("basketball", 3), ("bouldering", 2), ("cooking", 2), ("dance", 2)]
            .into_iter()
            .map(|(domain, count)| (domain.to_owned(), count))
            .collect()
    }

    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    #[must_use]
    pub fn partition_number(&self) -> Option<u32> {
        self.partition_number
    }

    /// Partitions configured for `domain`; 1 when the domain is not listed.
    #[must_use]
    pub fn partition_count_for(&self, domain: &str) -> u32 {
        self.partition_counts.get(domain).copied().unwrap_or(1)
    }

    #[must_use]
    pub fn variant(&self) -> CompletionVariant {
        self.variant
    }

    #[must_use]
    pub fn cannot_tell_option(&self) -> Option<&str> {
        self.cannot_tell_option.as_deref()
    }

    #[must_use]
    pub fn submission_endpoint(&self) -> &Url {
        &self.submission_endpoint
    }

    #[must_use]
    pub fn question_source_url(&self) -> Option<&Url> {
        self.question_source_url.as_ref()
    }

    #[must_use]
    pub fn auto_save_interval(&self) -> Duration {
        let secs = self.auto_save_interval_secs.min(MAX_AUTO_SAVE_INTERVAL_SECS);
        Duration::seconds(i64::try_from(secs).unwrap_or(0))
    }

    #[must_use]
    pub fn selection_strategy(&self) -> SelectionStrategy {
        if let Some(samples_per_type) = self.samples_per_type {
            return SelectionStrategy::Balanced { samples_per_type };
        }
        match self.partition_number {
            Some(partition_number) => SelectionStrategy::Partitioned {
                partition_count: self.partition_count_for(self.domain().unwrap_or_default()),
                partition_number,
            },
            None => SelectionStrategy::All,
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "https://forms.example.org/f/survey";

    #[test]
    fn defaults_apply() {
        let settings = SurveySettingsDraft::new(ENDPOINT).validate().unwrap();
        assert_eq!(settings.variant(), CompletionVariant::TwoPhase);
        assert_eq!(settings.auto_save_interval(), Duration::seconds(30));
        assert_eq!(settings.selection_strategy(), SelectionStrategy::All);
        assert_eq!(settings.partition_count_for("basketball"), 3);
        assert_eq!(settings.partition_count_for("violin"), 1);
        assert_eq!(settings.domain(), None);
    }

    #[test]
    fn parses_camel_case_json() {
        let json = r#"{
            "domain": " basketball ",
            "partitionNumber": 2,
            "variant": "single-phase",
            "cannotTellOption": "Cannot tell",
            "submissionEndpoint": "https://forms.example.org/f/abc",
            "autoSaveIntervalSecs": 10
        }"#;
        let draft: SurveySettingsDraft = serde_json::from_str(json).unwrap();
        let settings = draft.validate().unwrap();

        assert_eq!(settings.domain(), Some("basketball"));
        assert_eq!(settings.variant(), CompletionVariant::SinglePhase);
        assert_eq!(settings.cannot_tell_option(), Some("Cannot tell"));
        assert_eq!(
            settings.selection_strategy(),
            SelectionStrategy::Partitioned {
                partition_count: 3,
                partition_number: 2
            }
        );
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(
            SurveySettingsDraft::default().validate().unwrap_err(),
            SettingsError::MissingSubmissionEndpoint
        );
        assert_eq!(
            SurveySettingsDraft::new("not a url").validate().unwrap_err(),
            SettingsError::InvalidSubmissionEndpoint
        );

        for secs in [0, MAX_AUTO_SAVE_INTERVAL_SECS + 1, 10_000_000_000_000, u64::MAX] {
            let mut draft = SurveySettingsDraft::new(ENDPOINT);
            draft.auto_save_interval_secs = Some(secs);
            assert_eq!(
                draft.validate().unwrap_err(),
                SettingsError::InvalidAutoSaveInterval
            );
        }

        let mut draft = SurveySettingsDraft::new(ENDPOINT);
        draft.auto_save_interval_secs = Some(MAX_AUTO_SAVE_INTERVAL_SECS);
        assert_eq!(
            draft.validate().unwrap().auto_save_interval(),
            Duration::days(1)
        );

        let mut draft = SurveySettingsDraft::new(ENDPOINT);
        draft.samples_per_type = Some(2);
        draft.partition_number = Some(1);
        assert_eq!(
            draft.validate().unwrap_err(),
            SettingsError::ConflictingSelection
        );

        let mut draft = SurveySettingsDraft::new(ENDPOINT);
        draft.partition_counts = Some(BTreeMap::from([("dance".to_string(), 0)]));
        assert!(matches!(
            draft.validate().unwrap_err(),
            SettingsError::InvalidPartitionCount { .. }
        ));
    }

    #[test]
    fn balanced_sampling_mode() {
        let mut draft = SurveySettingsDraft::new(ENDPOINT);
        draft.samples_per_type = Some(2);
        let settings = draft.validate().unwrap();
        assert_eq!(
            settings.selection_strategy(),
            SelectionStrategy::Balanced {
                samples_per_type: 2
            }
        );
    }
}
