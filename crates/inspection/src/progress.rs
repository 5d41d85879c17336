//! Completion tallies derived from the catalog and the current answers.
//!
//! Pure functions: they run on every interaction to drive live indicators, so they
//! neither log nor mutate. An item counts as answered when a response exists for
//! its id, whatever the value.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::{ChecklistItemId, ChecklistSection, LeakageItem, LeakageItemId, SectionId};
use crate::responses::{ItemResponse, ItemStatus, LeakageResponse};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

impl Progress {
    /// Completion in percent; an empty item set is 0%.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.answered as f64 / self.total as f64 * 100.0
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.answered == self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionProgress {
    pub section_id: SectionId,
    pub answered: usize,
    pub total: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub warn_count: usize,
}

impl SectionProgress {
    pub fn progress(&self) -> Progress {
        Progress {
            answered: self.answered,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakageProgress {
    pub answered: usize,
    pub total: usize,
    pub found_count: usize,
}

impl LeakageProgress {
    pub fn progress(&self) -> Progress {
        Progress {
            answered: self.answered,
            total: self.total,
        }
    }
}

pub fn section_progress(
    section: &ChecklistSection,
    responses: &HashMap<ChecklistItemId, ItemResponse>,
) -> SectionProgress {
    let mut tally = SectionProgress {
        section_id: section.id,
        answered: 0,
        total: section.items.len(),
        pass_count: 0,
        fail_count: 0,
        warn_count: 0,
    };

    for item in &section.items {
        let Some(response) = responses.get(&item.id) else {
            continue;
        };
        tally.answered += 1;
        match response.status {
            ItemStatus::Pass => tally.pass_count += 1,
            ItemStatus::Fail => tally.fail_count += 1,
            ItemStatus::Warn => tally.warn_count += 1,
        }
    }

    tally
}

/// Answered vs total across all given sections.
///
/// Responses for ids outside these sections are ignored, so `answered <= total`.
pub fn overall_progress(
    sections: &[ChecklistSection],
    responses: &HashMap<ChecklistItemId, ItemResponse>,
) -> Progress {
    sections
        .iter()
        .map(|s| section_progress(s, responses))
        .fold(Progress::default(), |acc, s| Progress {
            answered: acc.answered + s.answered,
            total: acc.total + s.total,
        })
}

pub fn leakage_progress(
    items: &[LeakageItem],
    responses: &HashMap<LeakageItemId, LeakageResponse>,
) -> LeakageProgress {
    let mut tally = LeakageProgress {
        total: items.len(),
        ..LeakageProgress::default()
    };
    for response in items.iter().filter_map(|i| responses.get(&i.id)) {
        tally.answered += 1;
        if response.found {
            tally.found_count += 1;
        }
    }
    tally
}
