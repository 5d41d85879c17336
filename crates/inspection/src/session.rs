//! Single-inspector editing session.
//!
//! Owns all uncommitted state of one inspection: the form, the answers and the
//! damage board, bound to one catalog snapshot for its whole life. Dropping the
//! session discards everything that was not submitted.

use std::sync::Arc;

use pdi_core::{DomainError, DomainResult, MarkerId};

use crate::assembly::{AssemblyError, InspectionForm, InspectionPayload, assemble};
use crate::catalog::{Catalog, ChecklistItemId, LeakageItemId, SectionId};
use crate::damage::{DamageError, DamageMarkerBoard, DamageType, DiagramBounds, DiagramView, Severity};
use crate::inspection::InspectionId;
use crate::progress::{
    LeakageProgress, Progress, SectionProgress, leakage_progress, overall_progress, section_progress,
};
use crate::responses::{ItemStatus, ResponseStore};
use crate::summary::InspectionSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// New inspection, never persisted.
    Draft,
    /// Reopened (or already submitted) inspection; submissions update this id.
    Editing(InspectionId),
}

/// Which submission the pipeline should perform for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionTarget {
    Create,
    Update(InspectionId),
}

#[derive(Debug, Clone)]
pub struct InspectionSession {
    catalog: Arc<Catalog>,
    mode: SessionMode,
    form: InspectionForm,
    responses: ResponseStore,
    board: DamageMarkerBoard,
}

impl InspectionSession {
    /// Start a new draft: empty form, no answers, no markers.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            mode: SessionMode::Draft,
            form: InspectionForm::default(),
            responses: ResponseStore::new(),
            board: DamageMarkerBoard::new(),
        }
    }

    /// Rehydrate a submitted inspection for editing.
    ///
    /// Answers for items the current catalog no longer contains are kept, so a
    /// resubmission never drops data the inspector did not touch.
    pub fn reopen(
        catalog: Arc<Catalog>,
        inspection_id: InspectionId,
        payload: &InspectionPayload,
    ) -> DomainResult<Self> {
        let damage = payload
            .damage_data()
            .map_err(|e| DomainError::validation(format!("stored damage data is unreadable: {e}")))?;

        let responses = payload.to_response_store();
        let orphaned = responses
            .checklist()
            .keys()
            .filter(|id| !catalog.contains_checklist_item(**id))
            .count()
            + responses
                .leakage()
                .keys()
                .filter(|id| !catalog.contains_leakage_item(**id))
                .count();
        if orphaned > 0 {
            tracing::warn!(
                inspection_id = %inspection_id,
                orphaned,
                "reopened inspection has answers for items missing from the catalog"
            );
        }

        tracing::info!(inspection_id = %inspection_id, "inspection reopened for edit");

        Ok(Self {
            catalog,
            mode: SessionMode::Editing(inspection_id),
            form: payload.form.clone(),
            responses,
            board: DamageMarkerBoard::from_damage_data(damage),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn form(&self) -> &InspectionForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut InspectionForm {
        &mut self.form
    }

    pub fn responses(&self) -> &ResponseStore {
        &self.responses
    }

    pub fn board(&self) -> &DamageMarkerBoard {
        &self.board
    }

    pub fn set_checklist_response(
        &mut self,
        item_id: ChecklistItemId,
        status: ItemStatus,
        notes: impl Into<String>,
    ) -> DomainResult<()> {
        if !self.catalog.contains_checklist_item(item_id) {
            return Err(DomainError::validation(format!("unknown checklist item {item_id}")));
        }
        self.responses.set_checklist_response(item_id, status, notes);
        Ok(())
    }

    pub fn set_leakage_response(
        &mut self,
        item_id: LeakageItemId,
        found: bool,
        notes: Option<String>,
    ) -> DomainResult<()> {
        if !self.catalog.contains_leakage_item(item_id) {
            return Err(DomainError::validation(format!("unknown leakage item {item_id}")));
        }
        self.responses.set_leakage_response(item_id, found, notes);
        Ok(())
    }

    pub fn add_marker(
        &mut self,
        view: DiagramView,
        x: f64,
        y: f64,
        damage_type: DamageType,
        severity: Severity,
    ) -> Result<MarkerId, DamageError> {
        self.board.add_marker(view, x, y, damage_type, severity)
    }

    pub fn place_marker(
        &mut self,
        view: DiagramView,
        bounds: &DiagramBounds,
        pointer_x: f64,
        pointer_y: f64,
        damage_type: DamageType,
        severity: Severity,
    ) -> Result<MarkerId, DamageError> {
        self.board
            .place_marker(view, bounds, pointer_x, pointer_y, damage_type, severity)
    }

    pub fn remove_marker(&mut self, id: MarkerId) -> bool {
        self.board.remove_marker(id).is_some()
    }

    pub fn update_marker_description(&mut self, id: MarkerId, text: impl Into<String>) -> bool {
        self.board.update_description(id, text)
    }

    pub fn set_damage_notes(&mut self, notes: Option<String>) {
        self.board.set_notes(notes);
    }

    pub fn checklist_progress(&self) -> Progress {
        overall_progress(self.catalog.sections(), self.responses.checklist())
    }

    pub fn section_progress(&self, section_id: SectionId) -> Option<SectionProgress> {
        self.catalog
            .section(section_id)
            .map(|s| section_progress(s, self.responses.checklist()))
    }

    pub fn leakage_progress(&self) -> LeakageProgress {
        leakage_progress(self.catalog.leakage_items(), self.responses.leakage())
    }

    pub fn summary(&self) -> InspectionSummary {
        InspectionSummary::compute(&self.catalog, &self.responses, &self.board)
    }

    /// Validate and build the payload from the current state. State is untouched.
    pub fn assemble(&self) -> Result<InspectionPayload, AssemblyError> {
        assemble(&self.form, &self.responses, &self.board.to_damage_data())
    }

    pub fn submission_target(&self) -> SubmissionTarget {
        match self.mode {
            SessionMode::Draft => SubmissionTarget::Create,
            SessionMode::Editing(id) => SubmissionTarget::Update(id),
        }
    }

    /// Record a successful submission: further submits update `inspection_id`.
    pub fn mark_submitted(&mut self, inspection_id: InspectionId) {
        self.mode = SessionMode::Editing(inspection_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::RequiredField;
    use crate::catalog::{ChecklistItem, ChecklistSection, LeakageItem, SectionType};

    fn test_catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::new(
                vec![ChecklistSection {
                    id: SectionId(1),
                    name: "Under bonnet".into(),
                    order: 1,
                    section_type: SectionType::Checklist,
                    items: vec![
                        ChecklistItem { id: ChecklistItemId(1), label: "Battery".into(), order: 1 },
                        ChecklistItem { id: ChecklistItemId(2), label: "Belts".into(), order: 2 },
                    ],
                }],
                vec![LeakageItem { id: LeakageItemId(1), label: "Radiator".into(), order: 1 }],
            )
            .unwrap(),
        )
    }

    fn fill_form(session: &mut InspectionSession) {
        let form = session.form_mut();
        form.customer_name = "Jo".into();
        form.customer_phone = "12345".into();
        form.vehicle_make = "Ford".into();
        form.vehicle_model = "Ranger".into();
        form.vehicle_color = "Blue".into();
        form.vehicle_year = "2022".into();
        form.engine_number = "ENG".into();
        form.vin = "VIN".into();
        form.odometer = "30".into();
        form.inspected_by = Some("Inspector Gadget".into());
    }

    #[test]
    fn new_session_is_an_empty_draft() {
        let session = InspectionSession::new(test_catalog());
        assert_eq!(session.mode(), SessionMode::Draft);
        assert_eq!(session.submission_target(), SubmissionTarget::Create);
        assert_eq!(session.checklist_progress(), Progress { answered: 0, total: 2 });
        assert!(session.responses().is_empty());
        assert!(session.board().is_empty());
    }

    #[test]
    fn unknown_items_are_refused() {
        let mut session = InspectionSession::new(test_catalog());
        let err = session
            .set_checklist_response(ChecklistItemId(42), ItemStatus::Pass, "")
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(session.set_leakage_response(LeakageItemId(9), true, None).is_err());
        assert!(session.responses().is_empty());
    }

    #[test]
    fn progress_follows_answers() {
        let mut session = InspectionSession::new(test_catalog());
        session
            .set_checklist_response(ChecklistItemId(2), ItemStatus::Fail, "cracked")
            .unwrap();
        session.set_leakage_response(LeakageItemId(1), false, None).unwrap();

        assert_eq!(session.checklist_progress(), Progress { answered: 1, total: 2 });
        let section = session.section_progress(SectionId(1)).unwrap();
        assert_eq!(section.fail_count, 1);
        assert_eq!(session.leakage_progress().answered, 1);
        assert!(session.section_progress(SectionId(9)).is_none());
    }

    #[test]
    fn assemble_reports_missing_fields() {
        let session = InspectionSession::new(test_catalog());
        match session.assemble().unwrap_err() {
            AssemblyError::Validation(v) => assert!(v.contains(RequiredField::CustomerName)),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn reopen_rehydrates_everything_and_targets_update() {
        let mut session = InspectionSession::new(test_catalog());
        fill_form(&mut session);
        session
            .set_checklist_response(ChecklistItemId(1), ItemStatus::Warn, "low charge")
            .unwrap();
        session
            .set_leakage_response(LeakageItemId(1), true, Some("weeping hose".into()))
            .unwrap();
        let marker = session
            .add_marker(DiagramView::Interior, 20.0, 30.0, DamageType::Stain, Severity::Minor)
            .unwrap();
        assert!(session.update_marker_description(marker, "coffee"));
        session.set_damage_notes(Some("checked in daylight".into()));

        let payload = session.assemble().unwrap();
        let id = InspectionId::generate();
        let reopened = InspectionSession::reopen(test_catalog(), id, &payload).unwrap();

        assert_eq!(reopened.mode(), SessionMode::Editing(id));
        assert_eq!(reopened.submission_target(), SubmissionTarget::Update(id));
        assert_eq!(reopened.form(), session.form());
        assert_eq!(reopened.responses(), session.responses());
        assert_eq!(reopened.board(), session.board());
        assert_eq!(reopened.board().notes(), Some("checked in daylight"));
    }

    #[test]
    fn reopen_keeps_answers_for_retired_items() {
        let mut session = InspectionSession::new(test_catalog());
        fill_form(&mut session);
        let mut payload = session.assemble().unwrap();
        payload.responses.push(crate::responses::ItemResponse {
            item_id: ChecklistItemId(77),
            status: ItemStatus::Pass,
            notes: String::new(),
        });

        let reopened = InspectionSession::reopen(test_catalog(), InspectionId::generate(), &payload).unwrap();
        assert!(reopened.responses().checklist_response(ChecklistItemId(77)).is_some());
        assert_eq!(reopened.checklist_progress().answered, 0);
    }

    #[test]
    fn mark_submitted_switches_to_update_mode() {
        let mut session = InspectionSession::new(test_catalog());
        let id = InspectionId::generate();
        session.mark_submitted(id);
        assert_eq!(session.submission_target(), SubmissionTarget::Update(id));
    }

    #[test]
    fn stale_marker_operations_are_no_ops() {
        let mut session = InspectionSession::new(test_catalog());
        assert!(!session.remove_marker(MarkerId::new()));
        assert!(!session.update_marker_description(MarkerId::new(), "gone"));
        assert!(session.board().is_empty());
    }
}
