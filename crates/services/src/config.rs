//! Deployment settings from JSON.

use survey_core::model::{SurveySettings, SurveySettingsDraft};

use crate::error::ConfigError;

/// Parse and validate a settings document (camelCase JSON).
///
/// # Errors
///
/// Returns `ConfigError::Parse` for malformed JSON and `ConfigError::Invalid`
/// when validation fails.
pub fn settings_from_json(text: &str) -> Result<SurveySettings, ConfigError> {
    let draft: SurveySettingsDraft = serde_json::from_str(text)?;
    Ok(draft.validate()?)
}
