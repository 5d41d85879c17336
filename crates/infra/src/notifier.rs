//! Report-ready notification boundary.
//!
//! Delivery (e-mail, templating) is owned by an external collaborator; the
//! pipeline only hands over a `ReportReady` after a successful persist.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use pdi_inspection::InspectionId;

/// Whether the notification follows a create or an update submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportReady {
    pub inspection_id: InspectionId,
    pub mode: SubmissionMode,
    pub customer_name: String,
    pub customer_email: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notifier unavailable: {0}")]
    Unavailable(String),
    #[error("notification rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait ReportNotifier: Send + Sync {
    async fn report_ready(&self, notice: &ReportReady) -> Result<(), NotifyError>;
}

#[async_trait]
impl<N> ReportNotifier for std::sync::Arc<N>
where
    N: ReportNotifier + ?Sized,
{
    async fn report_ready(&self, notice: &ReportReady) -> Result<(), NotifyError> {
        (**self).report_ready(notice).await
    }
}

/// Emits one log line per notice; used by the server when no mailer is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReportNotifier;

#[async_trait]
impl ReportNotifier for LoggingReportNotifier {
    async fn report_ready(&self, notice: &ReportReady) -> Result<(), NotifyError> {
        tracing::info!(
            inspection_id = %notice.inspection_id,
            mode = ?notice.mode,
            has_email = notice.customer_email.is_some(),
            "inspection report ready"
        );
        Ok(())
    }
}

/// Keeps every notice in memory. Can be told to fail to exercise error paths.
#[derive(Debug, Default)]
pub struct RecordingReportNotifier {
    sent: Mutex<Vec<ReportReady>>,
    fail_with: Mutex<Option<NotifyError>>,
}

impl RecordingReportNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls fail with `error` (`None` restores success).
    pub fn fail_with(&self, error: Option<NotifyError>) {
        if let Ok(mut slot) = self.fail_with.lock() {
            *slot = error;
        }
    }

    pub fn sent(&self) -> Vec<ReportReady> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReportNotifier for RecordingReportNotifier {
    async fn report_ready(&self, notice: &ReportReady) -> Result<(), NotifyError> {
        let failure = self.fail_with.lock().ok().and_then(|f| f.clone());
        if let Some(err) = failure {
            return Err(err);
        }
        self.sent
            .lock()
            .map_err(|_| NotifyError::Unavailable("recorder lock poisoned".to_string()))?
            .push(notice.clone());
        Ok(())
    }
}
