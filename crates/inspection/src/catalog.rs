//! Checklist taxonomy: sections, checklist items and leakage items.
//!
//! The taxonomy is reference data shared by every inspection. A [`Catalog`] is an
//! immutable snapshot of it, loaded once at session start and handed to every
//! component that needs it, so progress is always computed against one taxonomy.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use pdi_core::{DomainError, DomainResult};

macro_rules! impl_catalog_id {
    ($t:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(pub u32);

        impl $t {
            pub fn new(raw: u32) -> Self {
                Self(raw)
            }

            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

impl_catalog_id!(SectionId, "Identifier of a checklist section.");
impl_catalog_id!(
    ChecklistItemId,
    "Identifier of a pass/fail/warn checklist item (stable across inspections)."
);
impl_catalog_id!(
    LeakageItemId,
    "Identifier of a leakage point. Never compared with checklist item ids."
);

/// How a section is rendered and answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionType {
    Checklist,
    Leakage,
    Convenience,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub label: String,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistSection {
    pub id: SectionId,
    pub name: String,
    pub order: i32,
    pub section_type: SectionType,
    pub items: Vec<ChecklistItem>,
}

impl ChecklistSection {
    pub fn item_ids(&self) -> impl Iterator<Item = ChecklistItemId> + '_ {
        self.items.iter().map(|i| i.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakageItem {
    pub id: LeakageItemId,
    pub label: String,
    pub order: i32,
}

/// Immutable taxonomy snapshot.
///
/// Sections, the items inside each section, and leakage items are sorted by their
/// explicit `order` field (ties broken by id), never by the order they arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    sections: Vec<ChecklistSection>,
    leakage_items: Vec<LeakageItem>,
    item_sections: HashMap<ChecklistItemId, SectionId>,
}

impl Catalog {
    /// Build a snapshot, ordering everything and checking identity invariants.
    ///
    /// Fails when a section id repeats, when a checklist item id appears more than
    /// once (an item belongs to exactly one section), or when a leakage item id repeats.
    pub fn new(
        mut sections: Vec<ChecklistSection>,
        mut leakage_items: Vec<LeakageItem>,
    ) -> DomainResult<Self> {
        let mut section_ids = HashSet::new();
        let mut item_sections = HashMap::new();

        for section in &mut sections {
            if !section_ids.insert(section.id) {
                return Err(DomainError::invariant(format!(
                    "duplicate section id {}",
                    section.id
                )));
            }
            for item in &section.items {
                if let Some(other) = item_sections.insert(item.id, section.id) {
                    return Err(DomainError::invariant(format!(
                        "checklist item {} appears in sections {} and {}",
                        item.id, other, section.id
                    )));
                }
            }
            section.items.sort_by_key(|i| (i.order, i.id));
        }
        sections.sort_by_key(|s| (s.order, s.id));

        let mut leakage_ids = HashSet::new();
        for item in &leakage_items {
            if !leakage_ids.insert(item.id) {
                return Err(DomainError::invariant(format!(
                    "duplicate leakage item id {}",
                    item.id
                )));
            }
        }
        leakage_items.sort_by_key(|i| (i.order, i.id));

        Ok(Self {
            sections,
            leakage_items,
            item_sections,
        })
    }

    pub fn sections(&self) -> &[ChecklistSection] {
        &self.sections
    }

    pub fn leakage_items(&self) -> &[LeakageItem] {
        &self.leakage_items
    }

    pub fn section(&self, id: SectionId) -> Option<&ChecklistSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Sections of one type, in catalog order.
    pub fn sections_of_type(&self, section_type: SectionType) -> impl Iterator<Item = &ChecklistSection> {
        self.sections
            .iter()
            .filter(move |s| s.section_type == section_type)
    }

    /// Section owning a checklist item.
    pub fn section_of(&self, item_id: ChecklistItemId) -> Option<SectionId> {
        self.item_sections.get(&item_id).copied()
    }

    pub fn checklist_item(&self, id: ChecklistItemId) -> Option<&ChecklistItem> {
        let section = self.section(self.section_of(id)?)?;
        section.items.iter().find(|i| i.id == id)
    }

    pub fn leakage_item(&self, id: LeakageItemId) -> Option<&LeakageItem> {
        self.leakage_items.iter().find(|i| i.id == id)
    }

    pub fn contains_checklist_item(&self, id: ChecklistItemId) -> bool {
        self.item_sections.contains_key(&id)
    }

    pub fn contains_leakage_item(&self, id: LeakageItemId) -> bool {
        self.leakage_items.iter().any(|i| i.id == id)
    }

    pub fn total_checklist_items(&self) -> usize {
        self.item_sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.leakage_items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u32, order: i32) -> ChecklistItem {
        ChecklistItem {
            id: ChecklistItemId(id),
            label: format!("item {id}"),
            order,
        }
    }

    fn section(id: u32, order: i32, items: Vec<ChecklistItem>) -> ChecklistSection {
        ChecklistSection {
            id: SectionId(id),
            name: format!("section {id}"),
            order,
            section_type: SectionType::Checklist,
            items,
        }
    }

    #[test]
    fn sections_and_items_are_ordered_by_order_field() {
        let catalog = Catalog::new(
            vec![
                section(1, 20, vec![item(10, 2), item(11, 1)]),
                section(2, 10, vec![item(20, 1)]),
            ],
            vec![
                LeakageItem {
                    id: LeakageItemId(2),
                    label: "gearbox".into(),
                    order: 1,
                },
                LeakageItem {
                    id: LeakageItemId(1),
                    label: "engine".into(),
                    order: 2,
                },
            ],
        )
        .unwrap();

        let ids: Vec<_> = catalog.sections().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SectionId(2), SectionId(1)]);

        let first = catalog.section(SectionId(1)).unwrap();
        let items: Vec<_> = first.item_ids().collect();
        assert_eq!(items, vec![ChecklistItemId(11), ChecklistItemId(10)]);

        let leaks: Vec<_> = catalog.leakage_items().iter().map(|l| l.id).collect();
        assert_eq!(leaks, vec![LeakageItemId(2), LeakageItemId(1)]);
    }

    #[test]
    fn equal_order_falls_back_to_id() {
        let catalog = Catalog::new(
            vec![section(5, 1, vec![]), section(3, 1, vec![])],
            vec![],
        )
        .unwrap();
        let ids: Vec<_> = catalog.sections().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SectionId(3), SectionId(5)]);
    }

    #[test]
    fn item_in_two_sections_is_rejected() {
        let err = Catalog::new(
            vec![section(1, 1, vec![item(7, 1)]), section(2, 2, vec![item(7, 1)])],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn duplicate_section_id_is_rejected() {
        let err = Catalog::new(vec![section(1, 1, vec![]), section(1, 2, vec![])], vec![])
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn lookups_resolve_owning_section() {
        let catalog = Catalog::new(
            vec![section(1, 1, vec![item(10, 1)]), section(2, 2, vec![item(20, 1), item(21, 2)])],
            vec![],
        )
        .unwrap();

        assert_eq!(catalog.section_of(ChecklistItemId(21)), Some(SectionId(2)));
        assert_eq!(catalog.checklist_item(ChecklistItemId(10)).unwrap().label, "item 10");
        assert!(catalog.checklist_item(ChecklistItemId(99)).is_none());
        assert_eq!(catalog.total_checklist_items(), 3);
    }

    #[test]
    fn section_type_uses_upper_case_wire_names() {
        let json = serde_json::to_string(&SectionType::Convenience).unwrap();
        assert_eq!(json, "\"CONVENIENCE\"");
    }
}
