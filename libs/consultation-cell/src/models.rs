// libs/consultation-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::{AppointmentKey, DiagnosticCode, NurseId, PrescriptionId};
use shared_utils::TimestampError;

// ==============================================================================
// OUTCOMES
// ==============================================================================

/// Which branch of lookup-or-create an edit took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationOpen {
    Existing,
    Created,
}

impl ConsultationOpen {
    pub fn created(&self) -> bool {
        matches!(self, ConsultationOpen::Created)
    }
}

/// Attaching a code already on the consultation is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticAttachment {
    Attached,
    AlreadyPresent,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoapFieldUpdate {
    /// `null` or absent clears the field.
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachDiagnosticRequest {
    pub code: DiagnosticCode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPrescriptionRequest {
    pub id: PrescriptionId,
    pub medication: String,
    pub lab: String,
    pub dosage: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignNurseRequest {
    pub nurse: NurseId,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum ConsultationError {
    #[error("No appointment for {0}")]
    AppointmentNotFound(AppointmentKey),

    #[error("Prescription {id} already exists for {key}")]
    DuplicatePrescriptionId {
        key: AppointmentKey,
        id: PrescriptionId,
    },

    #[error("Nurse not found: {0}")]
    UnknownNurse(NurseId),

    #[error("Diagnostic code not found: {0}")]
    UnknownDiagnosticCode(DiagnosticCode),

    #[error("Medication not found: {name} ({lab})")]
    UnknownMedication { name: String, lab: String },

    #[error(transparent)]
    InvalidTimestamp(#[from] TimestampError),

    #[error("{0}")]
    InvalidSoapField(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
