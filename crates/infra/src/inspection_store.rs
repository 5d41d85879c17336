//! Persistence boundary for submitted inspections.
//!
//! Writes are atomic per inspection id: a create appends the first event of a
//! new stream, an update appends a revision to an existing one. The last update
//! wins; nothing is merged.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use thiserror::Error;

use pdi_events::{EventBus, EventEnvelope};
use pdi_inspection::{
    CreateInspection, INSPECTION_AGGREGATE_TYPE, Inspection, InspectionCommand, InspectionId,
    InspectionPayload, ReviseInspection,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::EventStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InspectionStoreError {
    #[error("inspection {0} not found")]
    NotFound(InspectionId),
    #[error("conflicting write: {0}")]
    Conflict(String),
    /// The store refused the payload itself.
    #[error("rejected by store: {0}")]
    Invalid(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl InspectionStoreError {
    fn from_dispatch(id: InspectionId, err: DispatchError) -> Self {
        match err {
            DispatchError::NotFound => Self::NotFound(id),
            DispatchError::Concurrency(msg) => Self::Conflict(msg),
            DispatchError::Validation(msg) | DispatchError::InvariantViolation(msg) => Self::Invalid(msg),
            other => Self::Storage(other.to_string()),
        }
    }
}

#[async_trait]
pub trait InspectionStore: Send + Sync {
    /// Persist a new inspection and return its freshly assigned id.
    async fn create(&self, payload: &InspectionPayload) -> Result<InspectionId, InspectionStoreError>;

    /// Replace the payload of an existing inspection.
    async fn update(&self, id: InspectionId, payload: &InspectionPayload) -> Result<(), InspectionStoreError>;

    async fn load(&self, id: InspectionId) -> Result<Option<Inspection>, InspectionStoreError>;
}

#[async_trait]
impl<T> InspectionStore for std::sync::Arc<T>
where
    T: InspectionStore + ?Sized,
{
    async fn create(&self, payload: &InspectionPayload) -> Result<InspectionId, InspectionStoreError> {
        (**self).create(payload).await
    }

    async fn update(&self, id: InspectionId, payload: &InspectionPayload) -> Result<(), InspectionStoreError> {
        (**self).update(id, payload).await
    }

    async fn load(&self, id: InspectionId) -> Result<Option<Inspection>, InspectionStoreError> {
        (**self).load(id).await
    }
}

/// Inspection store backed by the event store, publishing to the bus on commit.
#[derive(Debug)]
pub struct EventSourcedInspectionStore<S, B> {
    dispatcher: CommandDispatcher<S, B>,
}

impl<S, B> EventSourcedInspectionStore<S, B> {
    pub fn new(dispatcher: CommandDispatcher<S, B>) -> Self {
        Self { dispatcher }
    }
}

impl<S, B> EventSourcedInspectionStore<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    fn dispatch(&self, id: InspectionId, command: InspectionCommand) -> Result<(), InspectionStoreError> {
        self.dispatcher
            .dispatch(id.aggregate_id(), INSPECTION_AGGREGATE_TYPE, command, |aid| {
                Inspection::empty(InspectionId::new(aid))
            })
            .map(|_| ())
            .map_err(|e| InspectionStoreError::from_dispatch(id, e))
    }
}

#[async_trait]
impl<S, B> InspectionStore for EventSourcedInspectionStore<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    async fn create(&self, payload: &InspectionPayload) -> Result<InspectionId, InspectionStoreError> {
        let id = InspectionId::generate();
        self.dispatch(
            id,
            InspectionCommand::CreateInspection(CreateInspection {
                inspection_id: id,
                payload: payload.clone(),
                occurred_at: Utc::now(),
            }),
        )?;
        Ok(id)
    }

    async fn update(&self, id: InspectionId, payload: &InspectionPayload) -> Result<(), InspectionStoreError> {
        self.dispatch(
            id,
            InspectionCommand::ReviseInspection(ReviseInspection {
                inspection_id: id,
                payload: payload.clone(),
                occurred_at: Utc::now(),
            }),
        )
    }

    async fn load(&self, id: InspectionId) -> Result<Option<Inspection>, InspectionStoreError> {
        self.dispatcher
            .load(id.aggregate_id(), |aid| Inspection::empty(InspectionId::new(aid)))
            .map_err(|e| InspectionStoreError::from_dispatch(id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pdi_events::InMemoryEventBus;
    use pdi_inspection::{InspectionForm, InspectionStatus, ResponseStore, VehicleDamageData, assemble};

    use crate::event_store::InMemoryEventStore;

    type TestStore =
        EventSourcedInspectionStore<Arc<InMemoryEventStore>, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

    fn setup() -> (TestStore, Arc<InMemoryEventStore>) {
        let events = Arc::new(InMemoryEventStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        (
            EventSourcedInspectionStore::new(CommandDispatcher::new(events.clone(), bus)),
            events,
        )
    }

    fn test_payload(vin: &str) -> InspectionPayload {
        let form = InspectionForm {
            customer_name: "Noor".into(),
            customer_phone: "777".into(),
            vehicle_make: "VW".into(),
            vehicle_model: "Golf".into(),
            vehicle_color: "White".into(),
            vehicle_year: "2023".into(),
            engine_number: "EA888".into(),
            vin: vin.into(),
            odometer: "14".into(),
            ..InspectionForm::default()
        };
        assemble(&form, &ResponseStore::new(), &VehicleDamageData::default()).unwrap()
    }

    #[tokio::test]
    async fn create_then_load_round_trips_payload() {
        let (store, _) = setup();
        let payload = test_payload("VIN-1");

        let id = store.create(&payload).await.unwrap();
        let loaded = store.load(id).await.unwrap().unwrap();

        assert_eq!(loaded.status(), InspectionStatus::Final);
        assert_eq!(loaded.payload(), Some(&payload));
    }

    #[tokio::test]
    async fn update_overwrites_under_the_same_id() {
        let (store, events) = setup();
        let id = store.create(&test_payload("VIN-1")).await.unwrap();

        store.update(id, &test_payload("VIN-2")).await.unwrap();

        let loaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.payload().unwrap().form.vin, "VIN-2");
        assert_eq!(loaded.revision(), 1);
        assert_eq!(events.stream_count(), 1);
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let (store, events) = setup();
        let id = InspectionId::generate();
        assert_eq!(
            store.update(id, &test_payload("VIN-1")).await.unwrap_err(),
            InspectionStoreError::NotFound(id)
        );
        assert_eq!(events.stream_count(), 0);
    }

    #[tokio::test]
    async fn invalid_payload_is_refused_by_the_store() {
        let (store, _) = setup();
        let mut payload = test_payload("VIN-1");
        payload.form.customer_phone = String::new();
        assert!(matches!(
            store.create(&payload).await.unwrap_err(),
            InspectionStoreError::Invalid(_)
        ));
    }

    #[tokio::test]
    async fn load_of_unknown_id_is_none() {
        let (store, _) = setup();
        assert!(store.load(InspectionId::generate()).await.unwrap().is_none());
    }
}
