use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use storage::keys::{ProgressScope, SESSION_ID_KEY};
use storage::repository::{KeyValueStore, StorageError};
use survey_core::model::{ResponseRecord, SessionId};

use super::store::ResponseStore;

/// Borrowed view of what gets persisted.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot<'a> {
    pub responses: &'a [ResponseRecord],
    pub current_index: usize,
    /// Presented option order per question id.
    pub option_orders: BTreeMap<&'a str, &'a [usize]>,
}

impl<'a> ProgressSnapshot<'a> {
    #[must_use]
    pub fn of(store: &'a ResponseStore) -> Self {
        Self {
            responses: store.responses(),
            current_index: store.current_index(),
            option_orders: store.option_orders(),
        }
    }
}

/// What `load` had to fix to fit the current question set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Fresh records appended because the question set grew.
    pub padded: usize,
    /// Records dropped because the question set shrank.
    pub truncated: usize,
    /// The saved position was missing, unreadable or out of range.
    pub position_reset: bool,
}

impl RepairReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Saved progress, already fitted to the question count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredProgress {
    pub responses: Vec<ResponseRecord>,
    pub current_index: usize,
    /// Saved option orders; empty when none were saved or they were unreadable.
    pub option_orders: BTreeMap<String, Vec<usize>>,
    pub repairs: RepairReport,
}

/// Reads and writes survey progress in the durable key space.
#[derive(Clone)]
pub struct ProgressPersistence {
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressPersistence {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Write the response array, the position and the option orders for `scope`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any write fails; in-memory state stays authoritative.
    pub async fn save(
        &self,
        scope: &ProgressScope,
        snapshot: ProgressSnapshot<'_>,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(snapshot.responses)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.kv.set(&scope.responses_key(), &json).await?;
        self.kv
            .set(&scope.position_key(), &snapshot.current_index.to_string())
            .await?;
        let orders = serde_json::to_string(&snapshot.option_orders)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.kv.set(&scope.options_key(), &orders).await?;
        debug!(scope = %scope, index = snapshot.current_index, "progress saved");
        Ok(())
    }

    /// Restore progress for `scope`, fitted to `question_count` questions.
    ///
    /// Unreadable saved data is logged and treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backend itself cannot be read.
    pub async fn load(
        &self,
        scope: &ProgressScope,
        question_count: usize,
        now: DateTime<Utc>,
    ) -> Result<Option<RestoredProgress>, StorageError> {
        if question_count == 0 {
            return Ok(None);
        }
        let Some(raw) = self.kv.get(&scope.responses_key()).await? else {
            return Ok(None);
        };
        let mut responses: Vec<ResponseRecord> = match serde_json::from_str(&raw) {
            Ok(responses) => responses,
            Err(err) => {
                warn!(scope = %scope, error = %err, "saved responses unreadable, starting fresh");
                return Ok(None);
            }
        };

        let mut repairs = RepairReport::default();
        if responses.len() < question_count {
            repairs.padded = question_count - responses.len();
            responses.resize_with(question_count, || ResponseRecord::new(now));
        } else if responses.len() > question_count {
            repairs.truncated = responses.len() - question_count;
            responses.truncate(question_count);
        }

        let saved_index = self
            .kv
            .get(&scope.position_key())
            .await?
            .and_then(|raw| raw.trim().parse::<usize>().ok());
        let current_index = match saved_index {
            Some(index) if index < question_count => index,
            _ => {
                repairs.position_reset = true;
                saved_index.map_or(0, |_| question_count - 1)
            }
        };

        let option_orders = match self.kv.get(&scope.options_key()).await? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(scope = %scope, error = %err, "saved option orders unreadable, reshuffling");
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };

        if repairs.is_clean() {
            info!(scope = %scope, index = current_index, "progress restored");
        } else {
            warn!(scope = %scope, ?repairs, "progress restored with repairs");
        }

        Ok(Some(RestoredProgress {
            responses,
            current_index,
            option_orders,
            repairs,
        }))
    }

    /// Delete the saved progress of `scope`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a key cannot be removed.
    pub async fn clear(&self, scope: &ProgressScope) -> Result<(), StorageError> {
        self.kv.remove(&scope.responses_key()).await?;
        self.kv.remove(&scope.position_key()).await?;
        self.kv.remove(&scope.options_key()).await?;
        info!(scope = %scope, "progress cleared");
        Ok(())
    }

    /// Keep a copy of an outgoing submission payload.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn store_submission(
        &self,
        scope: &ProgressScope,
        payload_json: &str,
    ) -> Result<(), StorageError> {
        self.kv.set(&scope.submission_key(), payload_json).await
    }

    /// The last stored submission payload, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub async fn stored_submission(
        &self,
        scope: &ProgressScope,
    ) -> Result<Option<String>, StorageError> {
        self.kv.get(&scope.submission_key()).await
    }
}

/// The browser-wide session id.
pub struct SessionIdentity;

impl SessionIdentity {
    /// Reuse the stored session id or create and store a new one.
    ///
    /// Storage failures are logged; the survey then runs with an id that only
    /// lives in memory.
    pub async fn get_or_create(kv: &dyn KeyValueStore) -> SessionId {
        match kv.get(SESSION_ID_KEY).await {
            Ok(Some(raw)) => match raw.parse::<SessionId>() {
                Ok(id) => return id,
                Err(err) => warn!(error = %err, "stored session id unreadable, replacing it"),
            },
            Ok(None) => {}
            Err(err) => warn!(error = %err, "session id could not be read"),
        }

        let id = SessionId::generate();
        if let Err(err) = kv.set(SESSION_ID_KEY, &id.to_string()).await {
            warn!(error = %err, "session id could not be stored");
        }
        info!(session = %id, "new session id");
        id
    }
}
