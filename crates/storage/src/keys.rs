use std::fmt;

use serde::{Deserialize, Serialize};
use survey_core::model::SessionId;

/// Key under which the browser-wide session id is kept.
pub const SESSION_ID_KEY: &str = "survey:session-id";

const RESPONSES_PREFIX: &str = "survey:responses";
const POSITION_PREFIX: &str = "survey:position";
const SUBMISSION_PREFIX: &str = "survey:submission";
const OPTIONS_PREFIX: &str = "survey:options";

/// The slice of durable storage one survey run owns.
///
/// Two scopes that differ in any field never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressScope {
    pub domain: Option<String>,
    pub partition: Option<u32>,
    pub session_id: SessionId,
}

impl ProgressScope {
    #[must_use]
    pub fn new(domain: Option<&str>, partition: Option<u32>, session_id: SessionId) -> Self {
        Self {
            domain: domain
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_owned),
            partition,
            session_id,
        }
    }

    /// Key of the serialized response record array.
    #[must_use]
    pub fn responses_key(&self) -> String {
        format!("{RESPONSES_PREFIX}:{self}")
    }

    /// Key of the decimal current-question index.
    #[must_use]
    pub fn position_key(&self) -> String {
        format!("{POSITION_PREFIX}:{self}")
    }

    /// Key of the presented option orders, by question id.
    #[must_use]
    pub fn options_key(&self) -> String {
        format!("{OPTIONS_PREFIX}:{self}")
    }

    /// Key of the last submission payload of this scope.
    #[must_use]
    pub fn submission_key(&self) -> String {
        format!("{SUBMISSION_PREFIX}:{self}")
    }
}

impl fmt::Display for ProgressScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let domain = domain_segment(self.domain.as_deref());
        match self.partition {
            Some(n) => write!(f, "{domain}:part{n}:{}", self.session_id),
            None => write!(f, "{domain}:all:{}", self.session_id),
        }
    }
}

// Colons would make distinct scopes collide.
fn domain_segment(domain: Option<&str>) -> String {
    match domain {
        Some(d) => d.replace(':', "_"),
        None => "_".to_owned(),
    }
}
