//! Inspector answers for the checklist and the leakage checklist.
//!
//! Absence of an entry means "unanswered"; there is no fourth status. The two
//! checklists live in separate maps keyed by their own id types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{ChecklistItemId, LeakageItemId};

/// Tri-state outcome of a checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Pass,
    Fail,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub item_id: ChecklistItemId,
    pub status: ItemStatus,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakageResponse {
    pub leakage_item_id: LeakageItemId,
    pub found: bool,
    pub notes: Option<String>,
}

/// Borrowed view over both answer maps.
#[derive(Debug, Clone, Copy)]
pub struct AllResponses<'a> {
    pub checklist: &'a HashMap<ChecklistItemId, ItemResponse>,
    pub leakage: &'a HashMap<LeakageItemId, LeakageResponse>,
}

/// In-memory answer store for one inspection.
///
/// Every setter is an upsert keyed by item id. Iteration order of the maps is
/// unspecified; render order comes from the [`Catalog`](crate::Catalog).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseStore {
    checklist: HashMap<ChecklistItemId, ItemResponse>,
    leakage: HashMap<LeakageItemId, LeakageResponse>,
}

impl ResponseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from previously serialized answers. Later duplicates win.
    pub fn from_parts(
        checklist: impl IntoIterator<Item = ItemResponse>,
        leakage: impl IntoIterator<Item = LeakageResponse>,
    ) -> Self {
        Self {
            checklist: checklist.into_iter().map(|r| (r.item_id, r)).collect(),
            leakage: leakage
                .into_iter()
                .map(|r| (r.leakage_item_id, r))
                .collect(),
        }
    }

    /// Record (or overwrite) the answer for a checklist item.
    ///
    /// Returns the answer that was replaced, if any.
    pub fn set_checklist_response(
        &mut self,
        item_id: ChecklistItemId,
        status: ItemStatus,
        notes: impl Into<String>,
    ) -> Option<ItemResponse> {
        tracing::debug!(item_id = %item_id, ?status, "checklist response set");
        self.checklist.insert(
            item_id,
            ItemResponse {
                item_id,
                status,
                notes: notes.into(),
            },
        )
    }

    /// Record (or overwrite) the answer for a leakage point.
    pub fn set_leakage_response(
        &mut self,
        item_id: LeakageItemId,
        found: bool,
        notes: Option<String>,
    ) -> Option<LeakageResponse> {
        tracing::debug!(leakage_item_id = %item_id, found, "leakage response set");
        self.leakage.insert(
            item_id,
            LeakageResponse {
                leakage_item_id: item_id,
                found,
                notes,
            },
        )
    }

    pub fn checklist_response(&self, item_id: ChecklistItemId) -> Option<&ItemResponse> {
        self.checklist.get(&item_id)
    }

    pub fn leakage_response(&self, item_id: LeakageItemId) -> Option<&LeakageResponse> {
        self.leakage.get(&item_id)
    }

    pub fn checklist(&self) -> &HashMap<ChecklistItemId, ItemResponse> {
        &self.checklist
    }

    pub fn leakage(&self) -> &HashMap<LeakageItemId, LeakageResponse> {
        &self.leakage
    }

    pub fn get_all(&self) -> AllResponses<'_> {
        AllResponses {
            checklist: &self.checklist,
            leakage: &self.leakage,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.checklist.is_empty() && self.leakage.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unanswered_items_have_no_entry() {
        let store = ResponseStore::new();
        assert!(store.checklist_response(ChecklistItemId(1)).is_none());
        assert!(store.leakage_response(LeakageItemId(1)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn second_set_overwrites_first() {
        let mut store = ResponseStore::new();
        assert!(
            store
                .set_checklist_response(ChecklistItemId(4), ItemStatus::Pass, "ok")
                .is_none()
        );
        let previous = store
            .set_checklist_response(ChecklistItemId(4), ItemStatus::Fail, "cracked lens")
            .unwrap();

        assert_eq!(previous.status, ItemStatus::Pass);
        assert_eq!(store.checklist().len(), 1);
        let current = store.checklist_response(ChecklistItemId(4)).unwrap();
        assert_eq!(current.status, ItemStatus::Fail);
        assert_eq!(current.notes, "cracked lens");
    }

    #[test]
    fn checklist_and_leakage_ids_do_not_collide() {
        let mut store = ResponseStore::new();
        store.set_checklist_response(ChecklistItemId(1), ItemStatus::Warn, "");
        store.set_leakage_response(LeakageItemId(1), true, Some("oil drip".into()));

        let all = store.get_all();
        assert_eq!(all.checklist.len(), 1);
        assert_eq!(all.leakage.len(), 1);
        assert_eq!(
            store.leakage_response(LeakageItemId(1)).unwrap().notes.as_deref(),
            Some("oil drip")
        );
    }

    #[test]
    fn empty_notes_are_an_answer() {
        let mut store = ResponseStore::new();
        store.set_checklist_response(ChecklistItemId(2), ItemStatus::Pass, "");
        let r = store.checklist_response(ChecklistItemId(2)).unwrap();
        assert_eq!(r.notes, "");
    }

    #[test]
    fn item_status_uses_upper_case_wire_names() {
        let r = ItemResponse {
            item_id: ChecklistItemId(3),
            status: ItemStatus::Warn,
            notes: "n".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, serde_json::json!({ "itemId": 3, "status": "WARN", "notes": "n" }));
    }

    fn status_strategy() -> impl Strategy<Value = ItemStatus> {
        prop_oneof![
            Just(ItemStatus::Pass),
            Just(ItemStatus::Fail),
            Just(ItemStatus::Warn)
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: setting the same item twice leaves one entry holding the second values.
        #[test]
        fn upsert_keeps_one_entry_and_last_write_wins(
            id in 0u32..500,
            first in status_strategy(),
            second in status_strategy(),
            first_notes in ".{0,12}",
            second_notes in ".{0,12}",
        ) {
            let mut store = ResponseStore::new();
            store.set_checklist_response(ChecklistItemId(id), first, first_notes);
            store.set_checklist_response(ChecklistItemId(id), second, second_notes.clone());

            prop_assert_eq!(store.checklist().len(), 1);
            let r = store.checklist_response(ChecklistItemId(id)).unwrap();
            prop_assert_eq!(r.status, second);
            prop_assert_eq!(&r.notes, &second_notes);
        }
    }
}
