use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvaluatorError {
    #[error("evaluator name cannot be empty")]
    EmptyName,

    #[error("evaluator email is missing or malformed")]
    InvalidEmail,
}

/// Who filled in the survey; the first block of every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorIdentity {
    name: String,
    email: String,
    additional_comments: String,
}

impl EvaluatorIdentity {
    /// Trim and validate the evaluator fields.
    ///
    /// # Errors
    ///
    /// Returns `EvaluatorError` for a blank name or an email without a local part and domain.
    pub fn new(
        name: impl AsRef<str>,
        email: impl AsRef<str>,
        additional_comments: impl AsRef<str>,
    ) -> Result<Self, EvaluatorError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(EvaluatorError::EmptyName);
        }

        let email = email.as_ref().trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(EvaluatorError::InvalidEmail),
        }

        Ok(Self {
            name: name.to_owned(),
            email: email.to_owned(),
            additional_comments: additional_comments.as_ref().trim().to_owned(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn additional_comments(&self) -> &str {
        &self.additional_comments
    }
}
