//! `pdi-inspection`: the pre-delivery inspection domain.
//!
//! Catalog snapshot, answer store, damage marker board, progress tallies, form
//! validation and payload assembly, plus the event-sourced `Inspection` record.
//! No IO lives here; loading catalogs and persisting submissions is done by
//! `pdi-infra`.

pub mod assembly;
pub mod catalog;
pub mod damage;
pub mod inspection;
pub mod progress;
pub mod responses;
pub mod session;
pub mod summary;

pub use assembly::{
    AssemblyError, DamageBlob, InspectionForm, InspectionPayload, RequiredField, ValidationError,
    assemble,
};
pub use catalog::{
    Catalog, ChecklistItem, ChecklistItemId, ChecklistSection, LeakageItem, LeakageItemId,
    SectionId, SectionType,
};
pub use damage::{
    DamageCode, DamageError, DamageMarker, DamageMarkerBoard, DamageType, DiagramBounds,
    DiagramView, MarkerPosition, Severity, SeverityCounts, VehicleDamageData,
};
pub use inspection::{
    CreateInspection, INSPECTION_AGGREGATE_TYPE, Inspection, InspectionCommand, InspectionCreated,
    InspectionEvent, InspectionId, InspectionRevised, InspectionStatus, ReviseInspection,
};
pub use progress::{
    LeakageProgress, Progress, SectionProgress, leakage_progress, overall_progress,
    section_progress,
};
pub use responses::{AllResponses, ItemResponse, ItemStatus, LeakageResponse, ResponseStore};
pub use session::{InspectionSession, SessionMode, SubmissionTarget};
pub use summary::{InspectionSummary, PayloadTally};
