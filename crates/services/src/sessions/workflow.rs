use std::sync::Arc;

use tracing::{info, warn};

use storage::keys::ProgressScope;
use storage::repository::{KeyValueStore, Storage};
use survey_core::model::{
    EvaluatorIdentity, SubmissionStatistics, SurveySettings, TransitionRefusal,
};

use super::autosave::AutoSaveTimer;
use super::commands::{CommandOutcome, SurveyCommand, dispatch};
use super::progress::{ProgressPersistence, ProgressSnapshot, SessionIdentity};
use super::store::ResponseStore;
use crate::Clock;
use crate::error::{SubmissionError, SurveyError};
use crate::loader::{PartitionApplied, QuestionSelection, QuestionSetLoader, QuestionSource};
use crate::presentation::{PresentationSurface, QuestionView, RenderInstruction, SaveIndicator};
use crate::submission::{
    Completeness, SubmissionPayload, SubmissionSink, assemble_submission, validate_completeness,
};

/// One running survey: the store plus where and when it is saved.
#[derive(Debug, Clone)]
pub struct SurveySession {
    store: ResponseStore,
    scope: ProgressScope,
    partition: PartitionApplied,
    autosave: AutoSaveTimer,
    submitted: bool,
    pending_retry: Option<SubmissionPayload>,
}

impl SurveySession {
    #[must_use]
    pub fn store(&self) -> &ResponseStore {
        &self.store
    }

    #[must_use]
    pub fn scope(&self) -> &ProgressScope {
        &self.scope
    }

    #[must_use]
    pub fn partition(&self) -> &PartitionApplied {
        &self.partition
    }

    #[must_use]
    pub fn autosave(&self) -> &AutoSaveTimer {
        &self.autosave
    }

    /// True once a submission was accepted; progress is no longer saved.
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// True while a rejected submission of this session awaits a retry.
    #[must_use]
    pub fn has_pending_retry(&self) -> bool {
        self.pending_retry.is_some()
    }
}

/// Orchestrates load, commands, persistence and submission for one survey.
#[derive(Clone)]
pub struct SurveyLoopService {
    clock: Clock,
    settings: SurveySettings,
    loader: QuestionSetLoader,
    kv: Arc<dyn KeyValueStore>,
    persistence: ProgressPersistence,
    sink: Arc<dyn SubmissionSink>,
    surface: Arc<dyn PresentationSurface>,
}

impl SurveyLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: SurveySettings,
        source: Arc<dyn QuestionSource>,
        storage: Storage,
        sink: Arc<dyn SubmissionSink>,
        surface: Arc<dyn PresentationSurface>,
    ) -> Self {
        Self {
            clock,
            settings,
            loader: QuestionSetLoader::new(source),
            persistence: ProgressPersistence::new(Arc::clone(&storage.kv)),
            kv: storage.kv,
            sink,
            surface,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &SurveySettings {
        &self.settings
    }

    /// Load the question set and restore or create progress.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::Load` when no usable question set exists; the
    /// surface has then been told `LoadFailed` and no session exists.
    pub async fn start(&self) -> Result<SurveySession, SurveyError> {
        let now = self.clock.now();
        let session_id = SessionIdentity::get_or_create(self.kv.as_ref()).await;
        let selection = QuestionSelection::from_settings(&self.settings);

        let loaded = self
            .loader
            .load(&selection, session_id)
            .await
            .and_then(|set| {
                let store = ResponseStore::new(
                    session_id,
                    self.settings.variant(),
                    set.questions,
                    self.settings.cannot_tell_option(),
                    now,
                )?;
                Ok((store, set.partition))
            });
        let (mut store, partition) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(error = %err, "question set could not be loaded");
                self.surface.render(RenderInstruction::LoadFailed {
                    message: err.to_string(),
                });
                return Err(err.into());
            }
        };

        let scope = ProgressScope::new(
            self.settings.domain(),
            self.settings.partition_number(),
            session_id,
        );
        match self.persistence.load(&scope, store.len(), now).await {
            Ok(Some(restored)) => {
                store.restore_option_orders(&restored.option_orders);
                store.restore(restored.responses, restored.current_index);
                self.surface.render(RenderInstruction::ProgressRestored {
                    current_index: store.current_index(),
                    answered: store.answered_count(),
                    repairs: restored.repairs,
                });
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "saved progress could not be read, starting fresh"),
        }

        let mut autosave = AutoSaveTimer::new(self.settings.auto_save_interval());
        autosave.reschedule(now);
        self.surface
            .render(RenderInstruction::ShowQuestion(QuestionView::of(&store)));

        Ok(SurveySession {
            store,
            scope,
            partition,
            autosave,
            submitted: false,
            pending_retry: None,
        })
    }

    /// Apply one user command, render the result and save.
    ///
    /// # Errors
    ///
    /// Returns the `TransitionRefusal` when the command is not allowed; nothing
    /// changes and the surface receives `Refused`.
    pub async fn apply(
        &self,
        session: &mut SurveySession,
        command: SurveyCommand,
    ) -> Result<CommandOutcome, TransitionRefusal> {
        let now = self.clock.now();
        let outcome = match dispatch(&mut session.store, command, now) {
            Ok(outcome) => outcome,
            Err(refusal) => {
                self.surface.render(RenderInstruction::Refused(refusal));
                return Err(refusal);
            }
        };

        let instruction = match outcome {
            CommandOutcome::Confirmed {
                is_correct,
                cannot_tell,
                ground_truth_index,
            } => RenderInstruction::ShowFeedback {
                question_index: session.store.current_index(),
                is_correct,
                cannot_tell,
                ground_truth_index,
                ground_truth_text: session.store.current_question().ground_truth().to_owned(),
            },
            CommandOutcome::Finished => RenderInstruction::ShowSubmissionForm {
                completeness: self.completeness(session),
                statistics: self.statistics(session),
            },
            _ => RenderInstruction::ShowQuestion(QuestionView::of(&session.store)),
        };
        self.surface.render(instruction);

        if !session.submitted {
            self.save(session).await;
        }
        Ok(outcome)
    }

    /// Persist the session now and reschedule the auto-save.
    ///
    /// Failures are reported to the surface, never returned.
    pub async fn save(&self, session: &mut SurveySession) -> SaveIndicator {
        let now = self.clock.now();
        let indicator = match self
            .persistence
            .save(&session.scope, ProgressSnapshot::of(&session.store))
            .await
        {
            Ok(()) => SaveIndicator::Saved { at: now },
            Err(err) => {
                warn!(scope = %session.scope, error = %err, "progress save failed");
                SaveIndicator::Failed {
                    reason: err.to_string(),
                }
            }
        };
        session.autosave.reschedule(now);
        self.surface
            .render(RenderInstruction::SaveStatus(indicator.clone()));
        indicator
    }

    /// Run the auto-save if its deadline has passed.
    pub async fn tick(&self, session: &mut SurveySession) -> Option<SaveIndicator> {
        if session.submitted || !session.autosave.is_due(self.clock.now()) {
            return None;
        }
        Some(self.save(session).await)
    }

    /// Best-effort save when the host is going away.
    pub async fn flush_on_unload(&self, session: &mut SurveySession) {
        if session.submitted {
            return;
        }
        self.save(session).await;
        session.autosave.cancel();
    }

    #[must_use]
    pub fn completeness(&self, session: &SurveySession) -> Completeness {
        validate_completeness(session.store.responses(), session.store.variant())
    }

    #[must_use]
    pub fn statistics(&self, session: &SurveySession) -> SubmissionStatistics {
        SubmissionStatistics::from_responses(session.store.responses(), session.store.variant())
    }

    /// Assemble, back up and send the submission.
    ///
    /// Incomplete sessions are refused unless `allow_incomplete` is set.
    /// Progress is cleared only after the sink accepted the payload; the
    /// backup copy is kept either way.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::Submission` when the session is incomplete or
    /// the sink rejects the payload.
    pub async fn submit(
        &self,
        session: &mut SurveySession,
        evaluator: EvaluatorIdentity,
        allow_incomplete: bool,
    ) -> Result<SubmissionPayload, SurveyError> {
        let completeness = self.completeness(session);
        if !completeness.complete && !allow_incomplete {
            let err = SubmissionError::Incomplete {
                missing: completeness.missing.len(),
            };
            self.surface.render(RenderInstruction::SubmissionFailed {
                message: err.to_string(),
                retryable: false,
            });
            return Err(err.into());
        }

        let payload =
            assemble_submission(&session.store, &session.scope, evaluator, self.clock.now());
        match serde_json::to_string(&payload) {
            Ok(json) => {
                if let Err(err) = self.persistence.store_submission(&session.scope, &json).await {
                    warn!(error = %err, "submission backup could not be stored");
                }
            }
            Err(err) => warn!(error = %err, "submission backup could not be encoded"),
        }

        self.deliver(session, payload).await
    }

    /// Resend the payload this session failed to deliver.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::NothingToRetry` unless a submission of this
    /// session was rejected and not yet accepted, or the sink's error.
    pub async fn retry_submission(
        &self,
        session: &mut SurveySession,
    ) -> Result<SubmissionPayload, SurveyError> {
        let payload = session
            .pending_retry
            .take()
            .ok_or(SubmissionError::NothingToRetry)?;
        self.deliver(session, payload).await
    }

    async fn deliver(
        &self,
        session: &mut SurveySession,
        payload: SubmissionPayload,
    ) -> Result<SubmissionPayload, SurveyError> {
        if let Err(err) = self.sink.submit(&payload).await {
            warn!(error = %err, "submission failed, payload kept for retry");
            session.pending_retry = Some(payload);
            self.surface.render(RenderInstruction::SubmissionFailed {
                message: err.to_string(),
                retryable: true,
            });
            return Err(err.into());
        }

        info!(
            session = %session.scope.session_id,
            answered = payload.session_info.questions_answered,
            total = payload.session_info.questions_total,
            "submission accepted"
        );
        if let Err(err) = self.persistence.clear(&session.scope).await {
            warn!(error = %err, "progress could not be cleared after submission");
        }
        session.submitted = true;
        session.autosave.cancel();
        self.surface.render(RenderInstruction::SubmissionSucceeded);
        Ok(payload)
    }
}
