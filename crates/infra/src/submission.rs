//! Submission pipeline: validate, persist, then notify once.
//!
//! The pipeline borrows the payload, so on any failure the caller still holds
//! the exact state it tried to submit. Nothing here retries.

use serde::Serialize;
use thiserror::Error;

use pdi_inspection::{InspectionId, InspectionPayload, SubmissionTarget, ValidationError};

use crate::inspection_store::{InspectionStore, InspectionStoreError};
use crate::notifier::{ReportNotifier, ReportReady, SubmissionMode};

/// Whether update submissions notify the customer again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyPolicy {
    pub notify_on_update: bool,
}

impl Default for NotifyPolicy {
    fn default() -> Self {
        Self { notify_on_update: true }
    }
}

impl NotifyPolicy {
    pub fn should_notify(&self, mode: SubmissionMode) -> bool {
        match mode {
            SubmissionMode::Create => true,
            SubmissionMode::Update => self.notify_on_update,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// Required fields missing; nothing was sent to the store.
    #[error("submission rejected: {0}")]
    Rejected(ValidationError),
    #[error("inspection {0} not found")]
    NotFound(InspectionId),
    #[error("conflicting submission: {0}")]
    Conflict(String),
    /// The store refused the payload; resubmitting it unchanged cannot succeed.
    #[error("submission refused by store: {0}")]
    Invalid(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl SubmissionError {
    /// Whether resubmitting the same payload unchanged can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmissionError::Storage(_))
    }
}

impl From<InspectionStoreError> for SubmissionError {
    fn from(value: InspectionStoreError) -> Self {
        match value {
            InspectionStoreError::NotFound(id) => SubmissionError::NotFound(id),
            InspectionStoreError::Conflict(msg) => SubmissionError::Conflict(msg),
            InspectionStoreError::Invalid(msg) => SubmissionError::Invalid(msg),
            InspectionStoreError::Storage(msg) => SubmissionError::Storage(msg),
        }
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub inspection_id: InspectionId,
    pub mode: SubmissionMode,
    /// `false` when the policy skipped the notice or the notifier failed.
    pub notified: bool,
}

#[derive(Debug)]
pub struct SubmissionPipeline<S, N> {
    store: S,
    notifier: N,
    policy: NotifyPolicy,
}

impl<S, N> SubmissionPipeline<S, N>
where
    S: InspectionStore,
    N: ReportNotifier,
{
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            policy: NotifyPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: NotifyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> NotifyPolicy {
        self.policy
    }

    /// Create a new inspection record.
    pub async fn submit(&self, payload: &InspectionPayload) -> Result<SubmissionReceipt, SubmissionError> {
        payload.validate().map_err(SubmissionError::Rejected)?;

        let id = self.store.create(payload).await.map_err(|e| {
            tracing::warn!(error = %e, "inspection create failed");
            SubmissionError::from(e)
        })?;
        tracing::info!(inspection_id = %id, "inspection created");

        Ok(self.finish(id, SubmissionMode::Create, payload).await)
    }

    /// Overwrite the record stored under `inspection_id`.
    pub async fn submit_update(
        &self,
        payload: &InspectionPayload,
        inspection_id: InspectionId,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        payload.validate().map_err(SubmissionError::Rejected)?;

        self.store.update(inspection_id, payload).await.map_err(|e| {
            tracing::warn!(inspection_id = %inspection_id, error = %e, "inspection update failed");
            SubmissionError::from(e)
        })?;
        tracing::info!(inspection_id = %inspection_id, "inspection updated");

        Ok(self.finish(inspection_id, SubmissionMode::Update, payload).await)
    }

    /// Dispatch on what an editing session asks for.
    pub async fn submit_to(
        &self,
        target: SubmissionTarget,
        payload: &InspectionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        match target {
            SubmissionTarget::Create => self.submit(payload).await,
            SubmissionTarget::Update(id) => self.submit_update(payload, id).await,
        }
    }

    async fn finish(
        &self,
        inspection_id: InspectionId,
        mode: SubmissionMode,
        payload: &InspectionPayload,
    ) -> SubmissionReceipt {
        let notified = if self.policy.should_notify(mode) {
            let notice = ReportReady {
                inspection_id,
                mode,
                customer_name: payload.form.customer_name.clone(),
                customer_email: payload.form.customer_email.clone(),
            };
            match self.notifier.report_ready(&notice).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(inspection_id = %inspection_id, error = %e, "report notification failed");
                    false
                }
            }
        } else {
            tracing::debug!(inspection_id = %inspection_id, "report notification skipped by policy");
            false
        };

        SubmissionReceipt {
            inspection_id,
            mode,
            notified,
        }
    }
}
