//! Inspection assembly: validate the form and build the persistable wire payload.
//!
//! Tabular answers travel as ordered arrays (they get aggregated downstream);
//! damage markers travel as an opaque JSON blob (display-only).

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pdi_core::UserId;

use crate::catalog::{ChecklistItemId, LeakageItemId};
use crate::damage::VehicleDamageData;
use crate::responses::{ItemResponse, LeakageResponse, ResponseStore};

/// Customer and vehicle fields typed by the inspector, plus sign-off text.
///
/// Signatures are plain strings (typed names), not cryptographic material.
///
/// Absent keys deserialize as empty so they are reported by `validate` like
/// blank ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InspectionForm {
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_color: String,
    pub vehicle_year: String,
    pub engine_number: String,
    pub vin: String,
    pub odometer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspected_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_date: Option<NaiveDate>,

    /// Link to an existing customer account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

/// Scalar fields that must be non-blank before an inspection can be assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredField {
    CustomerName,
    CustomerPhone,
    VehicleMake,
    VehicleModel,
    VehicleColor,
    VehicleYear,
    EngineNumber,
    Vin,
    Odometer,
}

impl RequiredField {
    pub const ALL: [RequiredField; 9] = [
        RequiredField::CustomerName,
        RequiredField::CustomerPhone,
        RequiredField::VehicleMake,
        RequiredField::VehicleModel,
        RequiredField::VehicleColor,
        RequiredField::VehicleYear,
        RequiredField::EngineNumber,
        RequiredField::Vin,
        RequiredField::Odometer,
    ];

    /// Name of the field in the wire payload.
    pub fn wire_name(self) -> &'static str {
        match self {
            RequiredField::CustomerName => "customerName",
            RequiredField::CustomerPhone => "customerPhone",
            RequiredField::VehicleMake => "vehicleMake",
            RequiredField::VehicleModel => "vehicleModel",
            RequiredField::VehicleColor => "vehicleColor",
            RequiredField::VehicleYear => "vehicleYear",
            RequiredField::EngineNumber => "engineNumber",
            RequiredField::Vin => "vin",
            RequiredField::Odometer => "odometer",
        }
    }

    fn value(self, form: &InspectionForm) -> &str {
        match self {
            RequiredField::CustomerName => &form.customer_name,
            RequiredField::CustomerPhone => &form.customer_phone,
            RequiredField::VehicleMake => &form.vehicle_make,
            RequiredField::VehicleModel => &form.vehicle_model,
            RequiredField::VehicleColor => &form.vehicle_color,
            RequiredField::VehicleYear => &form.vehicle_year,
            RequiredField::EngineNumber => &form.engine_number,
            RequiredField::Vin => &form.vin,
            RequiredField::Odometer => &form.odometer,
        }
    }
}

fn wire_names(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.wire_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every required field that was left blank, in form order.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[error("missing required fields: {}", wire_names(.fields))]
pub struct ValidationError {
    pub fields: Vec<RequiredField>,
}

impl ValidationError {
    pub fn contains(&self, field: RequiredField) -> bool {
        self.fields.contains(&field)
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.wire_name()).collect()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to encode vehicle damage data: {0}")]
    DamageEncoding(String),
}

impl InspectionForm {
    /// Required fields that are empty or whitespace-only.
    pub fn missing_fields(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .into_iter()
            .filter(|f| f.value(self).trim().is_empty())
            .collect()
    }

    /// Checklist completeness is not checked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = self.missing_fields();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields })
        }
    }
}

/// Serialized [`VehicleDamageData`] carried as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DamageBlob(String);

impl DamageBlob {
    pub fn encode(data: &VehicleDamageData) -> Result<Self, serde_json::Error> {
        serde_json::to_string(data).map(Self)
    }

    /// Decode the blob. A blank blob (never written) decodes to no damage.
    pub fn decode(&self) -> Result<VehicleDamageData, serde_json::Error> {
        if self.0.trim().is_empty() {
            return Ok(VehicleDamageData::default());
        }
        serde_json::from_str(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl Default for DamageBlob {
    fn default() -> Self {
        Self(String::new())
    }
}

/// Wire payload sent to the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionPayload {
    #[serde(flatten)]
    pub form: InspectionForm,
    #[serde(default)]
    pub responses: Vec<ItemResponse>,
    #[serde(default)]
    pub leakage_responses: Vec<LeakageResponse>,
    #[serde(default)]
    pub vehicle_damage_data: DamageBlob,
}

impl InspectionPayload {
    /// Server-side re-check of the scalar fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.form.validate()
    }

    /// Answers keyed by item id again (the inverse of assembly).
    pub fn response_maps(
        &self,
    ) -> (
        HashMap<ChecklistItemId, ItemResponse>,
        HashMap<LeakageItemId, LeakageResponse>,
    ) {
        let checklist = self
            .responses
            .iter()
            .map(|r| (r.item_id, r.clone()))
            .collect();
        let leakage = self
            .leakage_responses
            .iter()
            .map(|r| (r.leakage_item_id, r.clone()))
            .collect();
        (checklist, leakage)
    }

    pub fn to_response_store(&self) -> ResponseStore {
        ResponseStore::from_parts(
            self.responses.iter().cloned(),
            self.leakage_responses.iter().cloned(),
        )
    }

    pub fn damage_data(&self) -> Result<VehicleDamageData, serde_json::Error> {
        self.vehicle_damage_data.decode()
    }
}

/// Validate the form and merge it with answers and damage into one payload.
///
/// A partially answered checklist is a valid, submittable state.
pub fn assemble(
    form: &InspectionForm,
    responses: &ResponseStore,
    damage: &VehicleDamageData,
) -> Result<InspectionPayload, AssemblyError> {
    form.validate()?;

    let mut checklist: Vec<ItemResponse> = responses.checklist().values().cloned().collect();
    checklist.sort_by_key(|r| r.item_id);

    let mut leakage: Vec<LeakageResponse> = responses.leakage().values().cloned().collect();
    leakage.sort_by_key(|r| r.leakage_item_id);

    let blob = DamageBlob::encode(damage).map_err(|e| AssemblyError::DamageEncoding(e.to_string()))?;

    Ok(InspectionPayload {
        form: form.clone(),
        responses: checklist,
        leakage_responses: leakage,
        vehicle_damage_data: blob,
    })
}
