use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use pdi_core::AggregateId;
use pdi_events::EventEnvelope;
use pdi_inspection::{INSPECTION_AGGREGATE_TYPE, InspectionEvent, InspectionId, PayloadTally};

use crate::read_model::ReadStore;

/// One row per submitted inspection, as listed by reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionReportRow {
    pub inspection_id: InspectionId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub vehicle: String,
    pub vin: String,
    pub inspected_by: Option<String>,
    pub revision: u32,
    pub tally: PayloadTally,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum InspectionReportProjectionError {
    #[error("failed to deserialize inspection event: {0}")]
    Deserialize(String),

    #[error("event inspection_id does not match envelope aggregate_id")]
    StreamMismatch,

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Report listing projection.
///
/// Consumes published envelopes and keeps the latest revision of each inspection.
/// Envelopes of other aggregate types are ignored; replays at or below the
/// per-stream cursor are ignored too.
#[derive(Debug)]
pub struct InspectionReportProjection<S>
where
    S: ReadStore<InspectionId, InspectionReportRow>,
{
    store: S,
    cursors: RwLock<HashMap<AggregateId, u64>>,
}

impl<S> InspectionReportProjection<S>
where
    S: ReadStore<InspectionId, InspectionReportRow>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    fn cursor(&self, aggregate_id: AggregateId) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => *cursors.get(&aggregate_id).unwrap_or(&0),
            Err(_) => 0,
        }
    }

    fn advance_cursor(&self, aggregate_id: AggregateId, sequence_number: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(aggregate_id, sequence_number);
        }
    }

    pub fn get(&self, inspection_id: &InspectionId) -> Option<InspectionReportRow> {
        self.store.get(inspection_id)
    }

    /// All rows, most recently updated first.
    pub fn list(&self) -> Vec<InspectionReportRow> {
        let mut rows = self.store.list();
        rows.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.inspection_id.cmp(&b.inspection_id))
        });
        rows
    }

    /// Rows with a fail, warn, found leak or damage marker.
    pub fn with_findings(&self) -> Vec<InspectionReportRow> {
        self.list()
            .into_iter()
            .filter(|r| r.tally.has_findings())
            .collect()
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), InspectionReportProjectionError> {
        if envelope.aggregate_type() != INSPECTION_AGGREGATE_TYPE {
            return Ok(());
        }

        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();
        let last = self.cursor(aggregate_id);

        if seq == 0 {
            return Err(InspectionReportProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(());
        }
        if seq != last + 1 && last != 0 {
            return Err(InspectionReportProjectionError::NonMonotonicSequence { last, found: seq });
        }

        let event: InspectionEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| InspectionReportProjectionError::Deserialize(e.to_string()))?;

        if event.inspection_id().aggregate_id() != aggregate_id {
            return Err(InspectionReportProjectionError::StreamMismatch);
        }

        match event {
            InspectionEvent::InspectionCreated(e) => {
                let form = &e.payload.form;
                self.store.upsert(
                    e.inspection_id,
                    InspectionReportRow {
                        inspection_id: e.inspection_id,
                        customer_name: form.customer_name.clone(),
                        customer_email: form.customer_email.clone(),
                        vehicle: vehicle_label(&e.payload),
                        vin: form.vin.clone(),
                        inspected_by: form.inspected_by.clone(),
                        revision: 0,
                        tally: PayloadTally::from_payload(&e.payload),
                        submitted_at: e.occurred_at,
                        updated_at: e.occurred_at,
                    },
                );
            }
            InspectionEvent::InspectionRevised(e) => {
                let form = &e.payload.form;
                let submitted_at = self
                    .store
                    .get(&e.inspection_id)
                    .map(|r| r.submitted_at)
                    .unwrap_or(e.occurred_at);
                self.store.upsert(
                    e.inspection_id,
                    InspectionReportRow {
                        inspection_id: e.inspection_id,
                        customer_name: form.customer_name.clone(),
                        customer_email: form.customer_email.clone(),
                        vehicle: vehicle_label(&e.payload),
                        vin: form.vin.clone(),
                        inspected_by: form.inspected_by.clone(),
                        revision: e.revision,
                        tally: PayloadTally::from_payload(&e.payload),
                        submitted_at,
                        updated_at: e.occurred_at,
                    },
                );
            }
        }

        self.advance_cursor(aggregate_id, seq);
        Ok(())
    }

    /// Clear and replay in deterministic (aggregate, sequence) order.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), InspectionReportProjectionError> {
        let mut envs: Vec<_> = envelopes.into_iter().collect();

        self.store.clear();
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.clear();
        }

        envs.sort_by_key(|e| (e.aggregate_id(), e.sequence_number()));
        for env in &envs {
            self.apply_envelope(env)?;
        }

        Ok(())
    }
}

fn vehicle_label(payload: &pdi_inspection::InspectionPayload) -> String {
    let form = &payload.form;
    format!("{} {} {}", form.vehicle_year, form.vehicle_make, form.vehicle_model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pdi_inspection::{
        ChecklistItemId, DamageMarkerBoard, DamageType, DiagramView, InspectionCreated,
        InspectionForm, InspectionPayload, InspectionRevised, ItemStatus, ResponseStore,
        Severity, VehicleDamageData, assemble,
    };
    use uuid::Uuid;

    use crate::read_model::InMemoryReadStore;

    fn test_payload(customer: &str, status: ItemStatus) -> InspectionPayload {
        let form = InspectionForm {
            customer_name: customer.into(),
            customer_phone: "1".into(),
            customer_email: Some(format!("{}@example.com", customer.to_lowercase())),
            vehicle_make: "Honda".into(),
            vehicle_model: "Civic".into(),
            vehicle_color: "Silver".into(),
            vehicle_year: "2025".into(),
            engine_number: "K20".into(),
            vin: "SHH000".into(),
            odometer: "9".into(),
            ..InspectionForm::default()
        };
        let mut responses = ResponseStore::new();
        responses.set_checklist_response(ChecklistItemId(1), status, "");
        assemble(&form, &responses, &VehicleDamageData::default()).unwrap()
    }

    fn envelope(id: InspectionId, seq: u64, event: &InspectionEvent) -> EventEnvelope<JsonValue> {
        use pdi_events::Event;
        EventEnvelope::new(
            Uuid::now_v7(),
            id.aggregate_id(),
            INSPECTION_AGGREGATE_TYPE,
            event.event_type(),
            seq,
            serde_json::to_value(event).unwrap(),
        )
    }

    fn created(id: InspectionId, customer: &str) -> InspectionEvent {
        InspectionEvent::InspectionCreated(InspectionCreated {
            inspection_id: id,
            payload: test_payload(customer, ItemStatus::Pass),
            occurred_at: Utc::now(),
        })
    }

    fn revised(id: InspectionId, customer: &str, revision: u32) -> InspectionEvent {
        InspectionEvent::InspectionRevised(InspectionRevised {
            inspection_id: id,
            payload: test_payload(customer, ItemStatus::Fail),
            revision,
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn created_then_revised_keeps_latest_payload() {
        let projection = InspectionReportProjection::new(Arc::new(InMemoryReadStore::new()));
        let id = InspectionId::generate();

        projection.apply_envelope(&envelope(id, 1, &created(id, "Ada"))).unwrap();
        let first = projection.get(&id).unwrap();
        assert_eq!(first.customer_name, "Ada");
        assert_eq!(first.vehicle, "2025 Honda Civic");
        assert_eq!(first.revision, 0);
        assert!(projection.with_findings().is_empty());

        projection.apply_envelope(&envelope(id, 2, &revised(id, "Grace", 1))).unwrap();
        let row = projection.get(&id).unwrap();
        assert_eq!(row.customer_name, "Grace");
        assert_eq!(row.revision, 1);
        assert_eq!(row.submitted_at, first.submitted_at);
        assert_eq!(row.tally.fail_count, 1);
        assert_eq!(projection.with_findings().len(), 1);
    }

    #[test]
    fn damage_markers_count_as_findings() {
        let projection = InspectionReportProjection::new(InMemoryReadStore::new());
        let id = InspectionId::generate();
        let mut payload = test_payload("Ada", ItemStatus::Pass);
        let mut board = DamageMarkerBoard::new();
        board
            .add_marker(DiagramView::Side, 55.0, 40.0, DamageType::Dent, Severity::Moderate)
            .unwrap();
        payload.vehicle_damage_data = pdi_inspection::DamageBlob::encode(&board.to_damage_data()).unwrap();
        let event = InspectionEvent::InspectionCreated(InspectionCreated {
            inspection_id: id,
            payload,
            occurred_at: Utc::now(),
        });

        projection.apply_envelope(&envelope(id, 1, &event)).unwrap();

        let rows = projection.with_findings();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tally.marker_count, Some(1));
    }

    #[test]
    fn duplicates_are_ignored_and_gaps_rejected() {
        let projection = InspectionReportProjection::new(InMemoryReadStore::new());
        let id = InspectionId::generate();
        let env = envelope(id, 1, &created(id, "Ada"));

        projection.apply_envelope(&env).unwrap();
        projection.apply_envelope(&env).unwrap();
        assert_eq!(projection.list().len(), 1);

        match projection
            .apply_envelope(&envelope(id, 3, &revised(id, "Ada", 2)))
            .unwrap_err()
        {
            InspectionReportProjectionError::NonMonotonicSequence { last: 1, found: 3 } => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn other_aggregate_types_are_ignored() {
        let projection = InspectionReportProjection::new(InMemoryReadStore::new());
        let env = EventEnvelope::new(
            Uuid::now_v7(),
            AggregateId::new(),
            "something.else",
            "something.happened",
            1,
            serde_json::json!({}),
        );
        projection.apply_envelope(&env).unwrap();
        assert!(projection.list().is_empty());
    }

    #[test]
    fn mismatched_stream_is_rejected() {
        let projection = InspectionReportProjection::new(InMemoryReadStore::new());
        let id = InspectionId::generate();
        let other = InspectionId::generate();
        let err = projection
            .apply_envelope(&envelope(other, 1, &created(id, "Ada")))
            .unwrap_err();
        assert!(matches!(err, InspectionReportProjectionError::StreamMismatch));
    }

    #[test]
    fn rebuild_replays_in_order() {
        let projection = InspectionReportProjection::new(InMemoryReadStore::new());
        let a = InspectionId::generate();
        let b = InspectionId::generate();

        let envs = vec![
            envelope(a, 2, &revised(a, "Ada", 1)),
            envelope(b, 1, &created(b, "Bo")),
            envelope(a, 1, &created(a, "Ada")),
        ];
        projection.rebuild_from_scratch(envs.clone()).unwrap();
        assert_eq!(projection.list().len(), 2);
        assert_eq!(projection.get(&a).unwrap().revision, 1);

        projection.rebuild_from_scratch(envs).unwrap();
        assert_eq!(projection.list().len(), 2);
    }
}
