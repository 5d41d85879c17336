//! Persisted inspection record (event-sourced aggregate).
//!
//! The record is created by the first successful submission and revised by every
//! later update submission. Revisions replace the whole payload: the last submit
//! wins and nothing is merged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pdi_core::{Aggregate, AggregateId, AggregateRoot, DomainError};
use pdi_events::Event;

use crate::assembly::InspectionPayload;

/// Aggregate type name used for event streams.
pub const INSPECTION_AGGREGATE_TYPE: &str = "pdi.inspection";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InspectionId(pub AggregateId);

impl InspectionId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }

    pub fn aggregate_id(self) -> AggregateId {
        self.0
    }
}

impl core::fmt::Display for InspectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for InspectionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<AggregateId>().map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectionStatus {
    /// Nothing has been persisted under this id yet.
    Draft,
    /// Submitted at least once; the stored payload is the current report.
    Final,
}

/// Aggregate root: one submitted PDI report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    id: InspectionId,
    status: InspectionStatus,
    payload: Option<InspectionPayload>,
    revision: u32,
    submitted_at: Option<DateTime<Utc>>,
    revised_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Inspection {
    /// Create an empty, not-yet-submitted instance for rehydration.
    pub fn empty(id: InspectionId) -> Self {
        Self {
            id,
            status: InspectionStatus::Draft,
            payload: None,
            revision: 0,
            submitted_at: None,
            revised_at: None,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> InspectionId {
        self.id
    }

    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    pub fn payload(&self) -> Option<&InspectionPayload> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<InspectionPayload> {
        self.payload
    }

    /// Number of update submissions applied after the first one.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn revised_at(&self) -> Option<DateTime<Utc>> {
        self.revised_at
    }

    pub fn exists(&self) -> bool {
        self.status == InspectionStatus::Final
    }
}

impl AggregateRoot for Inspection {
    type Id = InspectionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: first submission of an inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInspection {
    pub inspection_id: InspectionId,
    pub payload: InspectionPayload,
    pub occurred_at: DateTime<Utc>,
}

/// Command: resubmission of an existing inspection (edit mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviseInspection {
    pub inspection_id: InspectionId,
    pub payload: InspectionPayload,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionCommand {
    CreateInspection(CreateInspection),
    ReviseInspection(ReviseInspection),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionCreated {
    pub inspection_id: InspectionId,
    pub payload: InspectionPayload,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRevised {
    pub inspection_id: InspectionId,
    pub payload: InspectionPayload,
    pub revision: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionEvent {
    InspectionCreated(InspectionCreated),
    InspectionRevised(InspectionRevised),
}

impl InspectionEvent {
    pub fn inspection_id(&self) -> InspectionId {
        match self {
            InspectionEvent::InspectionCreated(e) => e.inspection_id,
            InspectionEvent::InspectionRevised(e) => e.inspection_id,
        }
    }

    pub fn payload(&self) -> &InspectionPayload {
        match self {
            InspectionEvent::InspectionCreated(e) => &e.payload,
            InspectionEvent::InspectionRevised(e) => &e.payload,
        }
    }
}

impl Event for InspectionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InspectionEvent::InspectionCreated(_) => "pdi.inspection.created",
            InspectionEvent::InspectionRevised(_) => "pdi.inspection.revised",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InspectionEvent::InspectionCreated(e) => e.occurred_at,
            InspectionEvent::InspectionRevised(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Inspection {
    type Command = InspectionCommand;
    type Event = InspectionEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InspectionEvent::InspectionCreated(e) => {
                self.id = e.inspection_id;
                self.status = InspectionStatus::Final;
                self.payload = Some(e.payload.clone());
                self.submitted_at = Some(e.occurred_at);
            }
            InspectionEvent::InspectionRevised(e) => {
                self.payload = Some(e.payload.clone());
                self.revision = e.revision;
                self.revised_at = Some(e.occurred_at);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InspectionCommand::CreateInspection(cmd) => self.handle_create(cmd),
            InspectionCommand::ReviseInspection(cmd) => self.handle_revise(cmd),
        }
    }
}

impl Inspection {
    fn ensure_inspection_id(&self, inspection_id: InspectionId) -> Result<(), DomainError> {
        if self.id != inspection_id {
            return Err(DomainError::invariant("inspection_id mismatch"));
        }
        Ok(())
    }

    fn ensure_valid(payload: &InspectionPayload) -> Result<(), DomainError> {
        payload
            .validate()
            .map_err(|e| DomainError::validation(e.to_string()))
    }

    fn handle_create(&self, cmd: &CreateInspection) -> Result<Vec<InspectionEvent>, DomainError> {
        if self.exists() {
            return Err(DomainError::conflict("inspection already exists"));
        }
        self.ensure_inspection_id(cmd.inspection_id)?;
        Self::ensure_valid(&cmd.payload)?;

        Ok(vec![InspectionEvent::InspectionCreated(InspectionCreated {
            inspection_id: cmd.inspection_id,
            payload: cmd.payload.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revise(&self, cmd: &ReviseInspection) -> Result<Vec<InspectionEvent>, DomainError> {
        if !self.exists() {
            return Err(DomainError::not_found());
        }
        self.ensure_inspection_id(cmd.inspection_id)?;
        Self::ensure_valid(&cmd.payload)?;

        Ok(vec![InspectionEvent::InspectionRevised(InspectionRevised {
            inspection_id: cmd.inspection_id,
            payload: cmd.payload.clone(),
            revision: self.revision + 1,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{InspectionForm, assemble};
    use crate::catalog::ChecklistItemId;
    use crate::damage::VehicleDamageData;
    use crate::responses::{ItemStatus, ResponseStore};

    fn test_inspection_id() -> InspectionId {
        InspectionId::generate()
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_payload(customer: &str) -> InspectionPayload {
        let form = InspectionForm {
            customer_name: customer.into(),
            customer_phone: "0800".into(),
            vehicle_make: "Mazda".into(),
            vehicle_model: "CX-5".into(),
            vehicle_color: "Grey".into(),
            vehicle_year: "2024".into(),
            engine_number: "PY-1".into(),
            vin: "JM3KF000000000001".into(),
            odometer: "8".into(),
            ..InspectionForm::default()
        };
        let mut responses = ResponseStore::new();
        responses.set_checklist_response(ChecklistItemId(1), ItemStatus::Pass, "");
        assemble(&form, &responses, &VehicleDamageData::default()).unwrap()
    }

    fn created(id: InspectionId) -> Inspection {
        let mut inspection = Inspection::empty(id);
        let events = inspection
            .handle(&InspectionCommand::CreateInspection(CreateInspection {
                inspection_id: id,
                payload: test_payload("First"),
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &events {
            inspection.apply(e);
        }
        inspection
    }

    #[test]
    fn create_emits_created_event_and_finalizes() {
        let id = test_inspection_id();
        let inspection = created(id);

        assert_eq!(inspection.status(), InspectionStatus::Final);
        assert_eq!(inspection.version(), 1);
        assert_eq!(inspection.revision(), 0);
        assert_eq!(inspection.payload().unwrap().form.customer_name, "First");
    }

    #[test]
    fn create_twice_is_a_conflict() {
        let id = test_inspection_id();
        let inspection = created(id);

        let err = inspection
            .handle(&InspectionCommand::CreateInspection(CreateInspection {
                inspection_id: id,
                payload: test_payload("Again"),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn revise_replaces_payload_and_bumps_revision() {
        let id = test_inspection_id();
        let mut inspection = created(id);

        let events = inspection
            .handle(&InspectionCommand::ReviseInspection(ReviseInspection {
                inspection_id: id,
                payload: test_payload("Second"),
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &events {
            inspection.apply(e);
        }

        assert_eq!(inspection.revision(), 1);
        assert_eq!(inspection.version(), 2);
        assert_eq!(inspection.payload().unwrap().form.customer_name, "Second");
        assert!(inspection.revised_at().is_some());
    }

    #[test]
    fn revise_of_unknown_inspection_is_not_found() {
        let id = test_inspection_id();
        let err = Inspection::empty(id)
            .handle(&InspectionCommand::ReviseInspection(ReviseInspection {
                inspection_id: id,
                payload: test_payload("Nobody"),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn invalid_payload_is_rejected_server_side() {
        let id = test_inspection_id();
        let mut payload = test_payload("Someone");
        payload.form.vin = String::new();

        let err = Inspection::empty(id)
            .handle(&InspectionCommand::CreateInspection(CreateInspection {
                inspection_id: id,
                payload,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("vin")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let id = test_inspection_id();
        let inspection = created(id);
        let before = inspection.clone();

        let cmd = InspectionCommand::ReviseInspection(ReviseInspection {
            inspection_id: id,
            payload: test_payload("Draft change"),
            occurred_at: test_time(),
        });
        let first = inspection.handle(&cmd).unwrap();
        let second = inspection.handle(&cmd).unwrap();

        assert_eq!(first, second);
        assert_eq!(inspection, before);
    }

    #[test]
    fn event_types_are_stable() {
        let id = test_inspection_id();
        let event = InspectionEvent::InspectionCreated(InspectionCreated {
            inspection_id: id,
            payload: test_payload("X"),
            occurred_at: test_time(),
        });
        assert_eq!(event.event_type(), "pdi.inspection.created");
        assert_eq!(event.inspection_id(), id);
    }
}
