use chrono::{DateTime, Utc};
use serde::Serialize;

use pdi_infra::{SubmissionMode, SubmissionReceipt};
use pdi_inspection::{Inspection, InspectionId, InspectionPayload, InspectionStatus, PayloadTally};

// -------------------------
// Response DTOs
// -------------------------

/// Body of a successful `POST`/`PUT` on `/pdi/inspections`.
#[derive(Debug, Serialize)]
pub struct SubmittedResponse {
    pub id: InspectionId,
    pub mode: SubmissionMode,
    pub notified: bool,
}

impl From<SubmissionReceipt> for SubmittedResponse {
    fn from(receipt: SubmissionReceipt) -> Self {
        Self {
            id: receipt.inspection_id,
            mode: receipt.mode,
            notified: receipt.notified,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionView {
    pub id: InspectionId,
    pub status: InspectionStatus,
    pub revision: u32,
    pub submitted_at: Option<DateTime<Utc>>,
    pub revised_at: Option<DateTime<Utc>>,
    pub tally: PayloadTally,
    pub payload: InspectionPayload,
}

impl InspectionView {
    /// `None` for an aggregate that was never created.
    pub fn from_inspection(inspection: Inspection) -> Option<Self> {
        let id = inspection.id_typed();
        let status = inspection.status();
        let revision = inspection.revision();
        let submitted_at = inspection.submitted_at();
        let revised_at = inspection.revised_at();
        let payload = inspection.into_payload()?;
        Some(Self {
            id,
            status,
            revision,
            submitted_at,
            revised_at,
            tally: PayloadTally::from_payload(&payload),
            payload,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}

impl<T> ItemsResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}
