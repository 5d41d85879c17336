//! Report-oriented roll-ups of an inspection.

use serde::Serialize;

use crate::assembly::InspectionPayload;
use crate::catalog::Catalog;
use crate::damage::{DamageMarkerBoard, SeverityCounts};
use crate::progress::{
    LeakageProgress, Progress, SectionProgress, leakage_progress, overall_progress, section_progress,
};
use crate::responses::{ItemStatus, ResponseStore};

/// Live summary of an inspection against the session catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionSummary {
    pub checklist: Progress,
    /// One entry per catalog section, in catalog order.
    pub sections: Vec<SectionProgress>,
    pub leakage: LeakageProgress,
    pub fail_count: usize,
    pub warn_count: usize,
    pub damage: SeverityCounts,
}

impl InspectionSummary {
    pub fn compute(catalog: &Catalog, responses: &ResponseStore, board: &DamageMarkerBoard) -> Self {
        let sections: Vec<_> = catalog
            .sections()
            .iter()
            .map(|s| section_progress(s, responses.checklist()))
            .collect();

        Self {
            checklist: overall_progress(catalog.sections(), responses.checklist()),
            fail_count: sections.iter().map(|s| s.fail_count).sum(),
            warn_count: sections.iter().map(|s| s.warn_count).sum(),
            sections,
            leakage: leakage_progress(catalog.leakage_items(), responses.leakage()),
            damage: board.counts_by_severity(),
        }
    }

    /// Anything the customer should be told about before handover.
    ///
    /// Same rule as [`PayloadTally::has_findings`].
    pub fn has_findings(&self) -> bool {
        self.fail_count > 0
            || self.warn_count > 0
            || self.leakage.found_count > 0
            || self.damage.total() > 0
    }
}

/// Catalog-free tallies of a submitted payload, as seen by downstream reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadTally {
    pub answered: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub warn_count: usize,
    pub leakage_answered: usize,
    pub leaks_found: usize,
    /// `None` when the damage blob could not be decoded.
    pub marker_count: Option<usize>,
}

impl PayloadTally {
    pub fn from_payload(payload: &InspectionPayload) -> Self {
        let mut tally = Self {
            answered: payload.responses.len(),
            leakage_answered: payload.leakage_responses.len(),
            leaks_found: payload.leakage_responses.iter().filter(|r| r.found).count(),
            marker_count: payload.damage_data().ok().map(|d| d.markers.len()),
            ..Self::default()
        };
        for response in &payload.responses {
            match response.status {
                ItemStatus::Pass => tally.pass_count += 1,
                ItemStatus::Fail => tally.fail_count += 1,
                ItemStatus::Warn => tally.warn_count += 1,
            }
        }
        tally
    }

    /// A fail, warn, found leak or any damage marker.
    pub fn has_findings(&self) -> bool {
        self.fail_count > 0
            || self.warn_count > 0
            || self.leaks_found > 0
            || self.marker_count.unwrap_or(0) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{DamageBlob, InspectionForm, assemble};
    use crate::catalog::{
        ChecklistItem, ChecklistItemId, ChecklistSection, LeakageItem, LeakageItemId, SectionId,
        SectionType,
    };
    use crate::damage::{DamageType, DiagramView, Severity, VehicleDamageData};

    fn test_catalog() -> Catalog {
        Catalog::new(
            vec![
                ChecklistSection {
                    id: SectionId(1),
                    name: "Exterior".into(),
                    order: 1,
                    section_type: SectionType::Checklist,
                    items: vec![
                        ChecklistItem { id: ChecklistItemId(1), label: "Paint".into(), order: 1 },
                        ChecklistItem { id: ChecklistItemId(2), label: "Glass".into(), order: 2 },
                    ],
                },
                ChecklistSection {
                    id: SectionId(2),
                    name: "Comfort".into(),
                    order: 2,
                    section_type: SectionType::Convenience,
                    items: vec![ChecklistItem { id: ChecklistItemId(3), label: "A/C".into(), order: 1 }],
                },
            ],
            vec![LeakageItem { id: LeakageItemId(1), label: "Engine oil".into(), order: 1 }],
        )
        .unwrap()
    }

    #[test]
    fn summary_rolls_up_sections_leaks_and_damage() {
        let catalog = test_catalog();
        let mut responses = ResponseStore::new();
        responses.set_checklist_response(ChecklistItemId(1), ItemStatus::Fail, "swirl marks");
        responses.set_checklist_response(ChecklistItemId(3), ItemStatus::Warn, "weak airflow");
        responses.set_leakage_response(LeakageItemId(1), true, None);
        let mut board = DamageMarkerBoard::new();
        board
            .add_marker(DiagramView::Side, 40.0, 60.0, DamageType::Dent, Severity::Moderate)
            .unwrap();

        let summary = InspectionSummary::compute(&catalog, &responses, &board);

        assert_eq!(summary.checklist, Progress { answered: 2, total: 3 });
        assert_eq!(summary.sections.len(), 2);
        assert_eq!(summary.sections[0].section_id, SectionId(1));
        assert_eq!(summary.fail_count, 1);
        assert_eq!(summary.warn_count, 1);
        assert_eq!(summary.leakage.found_count, 1);
        assert_eq!(summary.damage.moderate, 1);
        assert!(summary.has_findings());
    }

    #[test]
    fn clean_inspection_has_no_findings() {
        let catalog = test_catalog();
        let mut responses = ResponseStore::new();
        responses.set_checklist_response(ChecklistItemId(2), ItemStatus::Pass, "");
        responses.set_leakage_response(LeakageItemId(1), false, None);

        let summary = InspectionSummary::compute(&catalog, &responses, &DamageMarkerBoard::new());
        assert!(!summary.has_findings());
    }

    #[test]
    fn damage_alone_is_a_finding_for_both_summaries() {
        let catalog = test_catalog();
        let mut responses = ResponseStore::new();
        responses.set_checklist_response(ChecklistItemId(1), ItemStatus::Pass, "");
        let mut board = DamageMarkerBoard::new();
        board
            .add_marker(DiagramView::Top, 10.0, 10.0, DamageType::Scratch, Severity::Minor)
            .unwrap();
        let form = InspectionForm {
            customer_name: "A".into(),
            customer_phone: "1".into(),
            vehicle_make: "M".into(),
            vehicle_model: "M".into(),
            vehicle_color: "C".into(),
            vehicle_year: "2020".into(),
            engine_number: "E".into(),
            vin: "V".into(),
            odometer: "0".into(),
            ..InspectionForm::default()
        };
        let payload = assemble(&form, &responses, &board.to_damage_data()).unwrap();

        assert!(InspectionSummary::compute(&catalog, &responses, &board).has_findings());
        assert!(PayloadTally::from_payload(&payload).has_findings());

        let clean = assemble(&form, &responses, &DamageMarkerBoard::new().to_damage_data()).unwrap();
        assert!(!PayloadTally::from_payload(&clean).has_findings());
    }

    #[test]
    fn payload_tally_counts_statuses_and_markers() {
        let form = InspectionForm {
            customer_name: "A".into(),
            customer_phone: "1".into(),
            vehicle_make: "M".into(),
            vehicle_model: "M".into(),
            vehicle_color: "C".into(),
            vehicle_year: "2020".into(),
            engine_number: "E".into(),
            vin: "V".into(),
            odometer: "0".into(),
            ..InspectionForm::default()
        };
        let mut responses = ResponseStore::new();
        responses.set_checklist_response(ChecklistItemId(1), ItemStatus::Pass, "");
        responses.set_checklist_response(ChecklistItemId(2), ItemStatus::Fail, "");
        responses.set_leakage_response(LeakageItemId(1), true, None);
        let mut board = DamageMarkerBoard::new();
        board
            .add_marker(DiagramView::Top, 1.0, 1.0, DamageType::Chip, Severity::Minor)
            .unwrap();

        let mut payload = assemble(&form, &responses, &board.to_damage_data()).unwrap();
        let tally = PayloadTally::from_payload(&payload);
        assert_eq!(tally.answered, 2);
        assert_eq!(tally.fail_count, 1);
        assert_eq!(tally.leaks_found, 1);
        assert_eq!(tally.marker_count, Some(1));

        payload.vehicle_damage_data = DamageBlob::from_raw("{not json");
        assert_eq!(PayloadTally::from_payload(&payload).marker_count, None);

        payload.vehicle_damage_data = DamageBlob::encode(&VehicleDamageData::default()).unwrap();
        assert_eq!(PayloadTally::from_payload(&payload).marker_count, Some(0));
    }
}
