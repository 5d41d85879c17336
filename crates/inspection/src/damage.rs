//! Damage marker board: spatial annotations on fixed vehicle diagram views.
//!
//! Coordinates are percentages (0–100) of the diagram that was active when the
//! marker was placed, so markers render the same at any size. A marker belongs to
//! the view it was created on for its whole life.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pdi_core::MarkerId;

/// Fixed diagram perspectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramView {
    Top,
    Side,
    Interior,
    Boot,
}

impl DiagramView {
    pub const ALL: [DiagramView; 4] = [
        DiagramView::Top,
        DiagramView::Side,
        DiagramView::Interior,
        DiagramView::Boot,
    ];

    /// Interior and boot diagrams show trim and upholstery rather than bodywork.
    pub fn is_cabin(self) -> bool {
        matches!(self, DiagramView::Interior | DiagramView::Boot)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiagramView::Top => "top",
            DiagramView::Side => "side",
            DiagramView::Interior => "interior",
            DiagramView::Boot => "boot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
}

/// Damage category chosen by the inspector.
///
/// Serialized as its kebab-case token. Tokens this build does not know are kept
/// verbatim in `Other`, so stored markers round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DamageType {
    Dent,
    Scratch,
    PaintDamage,
    Crack,
    Chip,
    Rust,
    BrokenPart,
    MissingPart,
    Tear,
    Stain,
    Burn,
    Other(String),
}

impl DamageType {
    pub const KNOWN: [DamageType; 11] = [
        DamageType::Dent,
        DamageType::Scratch,
        DamageType::PaintDamage,
        DamageType::Crack,
        DamageType::Chip,
        DamageType::Rust,
        DamageType::BrokenPart,
        DamageType::MissingPart,
        DamageType::Tear,
        DamageType::Stain,
        DamageType::Burn,
    ];

    pub fn from_token(token: &str) -> Self {
        match token {
            "dent" => DamageType::Dent,
            "scratch" => DamageType::Scratch,
            "paint-damage" => DamageType::PaintDamage,
            "crack" => DamageType::Crack,
            "chip" => DamageType::Chip,
            "rust" => DamageType::Rust,
            "broken-part" => DamageType::BrokenPart,
            "missing-part" => DamageType::MissingPart,
            "tear" => DamageType::Tear,
            "stain" => DamageType::Stain,
            "burn" => DamageType::Burn,
            other => DamageType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DamageType::Dent => "dent",
            DamageType::Scratch => "scratch",
            DamageType::PaintDamage => "paint-damage",
            DamageType::Crack => "crack",
            DamageType::Chip => "chip",
            DamageType::Rust => "rust",
            DamageType::BrokenPart => "broken-part",
            DamageType::MissingPart => "missing-part",
            DamageType::Tear => "tear",
            DamageType::Stain => "stain",
            DamageType::Burn => "burn",
            DamageType::Other(raw) => raw,
        }
    }

    /// Short classification token. Total, not invertible (scratch and paint damage share `S`).
    pub fn code(&self) -> DamageCode {
        let code = match self {
            DamageType::Dent => "D",
            DamageType::Scratch | DamageType::PaintDamage => "S",
            DamageType::Crack => "CR",
            DamageType::Chip => "CH",
            DamageType::Rust => "R",
            DamageType::BrokenPart => "BR",
            DamageType::MissingPart => "M",
            DamageType::Tear => "TR",
            DamageType::Stain => "ST",
            DamageType::Burn => "B",
            DamageType::Other(_) => "O",
        };
        DamageCode(code.to_string())
    }

    /// Upholstery damage only makes sense on the interior and boot diagrams.
    pub fn is_cabin_only(&self) -> bool {
        matches!(self, DamageType::Tear | DamageType::Stain | DamageType::Burn)
    }

    pub fn allowed_on(&self, view: DiagramView) -> bool {
        !self.is_cabin_only() || view.is_cabin()
    }
}

impl Serialize for DamageType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DamageType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(DamageType::from_token(&token))
    }
}

/// Classification token stored on a marker at creation time.
///
/// Kept as data rather than recomputed, so later changes to the type table never
/// rewrite markers that already exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DamageCode(String);

impl DamageCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for DamageCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DamageError {
    #[error("marker position ({x}, {y}) is outside the 0-100 diagram range")]
    OutOfBounds { x: f64, y: f64 },

    #[error("damage type {damage_type:?} cannot be placed on the {view:?} view")]
    ViewNotAllowed {
        damage_type: DamageType,
        view: DiagramView,
    },

    #[error("diagram bounds {width}x{height} cannot be used for placement")]
    DegenerateDiagram { width: f64, height: f64 },

    #[error("pointer position is not a finite number")]
    InvalidPointer,
}

/// Percentage position on a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerPosition {
    pub x: f64,
    pub y: f64,
}

impl MarkerPosition {
    pub fn new(x: f64, y: f64) -> Result<Self, DamageError> {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if in_range(x) && in_range(y) {
            Ok(Self { x, y })
        } else {
            Err(DamageError::OutOfBounds { x, y })
        }
    }
}

/// Bounding box of the active diagram in pointer coordinates (e.g. CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagramBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl DiagramBounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Diagram anchored at the origin.
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Convert a pointer position into diagram percentages.
    ///
    /// Positions just outside the box (pointer on the border) clamp to the edge.
    pub fn normalize(&self, pointer_x: f64, pointer_y: f64) -> Result<MarkerPosition, DamageError> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(self.width) || !usable(self.height) || !self.left.is_finite() || !self.top.is_finite() {
            return Err(DamageError::DegenerateDiagram {
                width: self.width,
                height: self.height,
            });
        }
        if !pointer_x.is_finite() || !pointer_y.is_finite() {
            return Err(DamageError::InvalidPointer);
        }

        let x = ((pointer_x - self.left) / self.width * 100.0).clamp(0.0, 100.0);
        let y = ((pointer_y - self.top) / self.height * 100.0).clamp(0.0, 100.0);
        Ok(MarkerPosition { x, y })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageMarker {
    pub id: MarkerId,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub damage_type: DamageType,
    pub code: DamageCode,
    pub severity: Severity,
    /// `None` = never edited, `Some("")` = explicitly cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub view: DiagramView,
}

impl DamageMarker {
    pub fn position(&self) -> MarkerPosition {
        MarkerPosition {
            x: self.x,
            y: self.y,
        }
    }
}

/// Everything persisted about vehicle damage for one inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDamageData {
    pub markers: Vec<DamageMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub minor: usize,
    pub moderate: usize,
    pub major: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.minor + self.moderate + self.major
    }
}

/// Per-inspection collection of damage markers across all views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DamageMarkerBoard {
    markers: BTreeMap<MarkerId, DamageMarker>,
    notes: Option<String>,
}

impl DamageMarkerBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a board from persisted data, keeping each stored code as-is.
    pub fn from_damage_data(data: VehicleDamageData) -> Self {
        let markers = data.markers.into_iter().map(|m| (m.id, m)).collect();
        Self {
            markers,
            notes: data.notes,
        }
    }

    pub fn to_damage_data(&self) -> VehicleDamageData {
        VehicleDamageData {
            markers: self.markers.values().cloned().collect(),
            notes: self.notes.clone(),
        }
    }

    /// Add a marker at percentage coordinates on `view`.
    pub fn add_marker(
        &mut self,
        view: DiagramView,
        x: f64,
        y: f64,
        damage_type: DamageType,
        severity: Severity,
    ) -> Result<MarkerId, DamageError> {
        let position = MarkerPosition::new(x, y)?;
        self.insert(view, position, damage_type, severity)
    }

    /// Add a marker from a pointer position inside the active diagram's bounds.
    pub fn place_marker(
        &mut self,
        view: DiagramView,
        bounds: &DiagramBounds,
        pointer_x: f64,
        pointer_y: f64,
        damage_type: DamageType,
        severity: Severity,
    ) -> Result<MarkerId, DamageError> {
        let position = bounds.normalize(pointer_x, pointer_y)?;
        self.insert(view, position, damage_type, severity)
    }

    fn insert(
        &mut self,
        view: DiagramView,
        position: MarkerPosition,
        damage_type: DamageType,
        severity: Severity,
    ) -> Result<MarkerId, DamageError> {
        if !damage_type.allowed_on(view) {
            return Err(DamageError::ViewNotAllowed { damage_type, view });
        }

        let id = MarkerId::new();
        let code = damage_type.code();
        let marker = DamageMarker {
            id,
            x: position.x,
            y: position.y,
            damage_type,
            code,
            severity,
            description: None,
            view,
        };
        tracing::debug!(marker_id = %id, view = view.as_str(), code = %marker.code, "damage marker added");
        self.markers.insert(id, marker);
        Ok(id)
    }

    /// Delete a marker outright. Unknown ids are a logged no-op.
    pub fn remove_marker(&mut self, id: MarkerId) -> Option<DamageMarker> {
        let removed = self.markers.remove(&id);
        if removed.is_none() {
            tracing::warn!(marker_id = %id, operation = "remove", "damage marker not found; ignoring");
        }
        removed
    }

    /// Set a marker's description. Returns `false` (and logs) for unknown ids.
    pub fn update_description(&mut self, id: MarkerId, text: impl Into<String>) -> bool {
        match self.markers.get_mut(&id) {
            Some(marker) => {
                marker.description = Some(text.into());
                true
            }
            None => {
                tracing::warn!(
                    marker_id = %id,
                    operation = "update_description",
                    "damage marker not found; ignoring"
                );
                false
            }
        }
    }

    pub fn marker(&self, id: MarkerId) -> Option<&DamageMarker> {
        self.markers.get(&id)
    }

    pub fn markers(&self) -> impl Iterator<Item = &DamageMarker> {
        self.markers.values()
    }

    pub fn markers_for_view(&self, view: DiagramView) -> Vec<&DamageMarker> {
        self.markers.values().filter(|m| m.view == view).collect()
    }

    pub fn counts_by_severity(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for marker in self.markers.values() {
            match marker.severity {
                Severity::Minor => counts.minor += 1,
                Severity::Moderate => counts.moderate += 1,
                Severity::Major => counts.major += 1,
            }
        }
        counts
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
