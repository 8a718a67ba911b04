use std::sync::Arc;

use async_trait::async_trait;

use shared_models::{
    AppointmentKey, AppointmentSlot, Client, ClientId, ConsultationRecord, DiagnosticCode,
    Doctor, FactTable, Medication, Nurse, NurseId, Prescription, SoapField,
};

use crate::error::StoreError;
use crate::filters::{AppointmentFilter, FactFilter};

/// Shared handle injected into every service.
pub type StoreHandle = Arc<dyn RecordStore>;

/// Ordered-record store backing the clinic core.
///
/// Implementations must make `insert_appointment`, `create_consultation` and
/// `insert_prescription` compare-and-insert operations: the existence check
/// and the write happen atomically with respect to concurrent callers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Per-consultation facts laid out per `FactSchema::consultations()`.
    async fn fetch_facts(&self, filter: &FactFilter) -> Result<FactTable, StoreError>;

    /// Appointments ordered by timestamp, then doctor.
    async fn fetch_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentSlot>, StoreError>;

    /// Fails with `StoreError::SlotConflict` when (doctor, timestamp) is taken.
    async fn insert_appointment(&self, slot: AppointmentSlot) -> Result<(), StoreError>;

    async fn fetch_doctors(&self) -> Result<Vec<Doctor>, StoreError>;

    async fn fetch_nurses(&self) -> Result<Vec<Nurse>, StoreError>;

    async fn fetch_client(&self, vat: &ClientId) -> Result<Option<Client>, StoreError>;

    async fn fetch_diagnostic_codes(&self) -> Result<Vec<DiagnosticCode>, StoreError>;

    async fn fetch_medications(&self) -> Result<Vec<Medication>, StoreError>;

    async fn fetch_consultation(
        &self,
        key: &AppointmentKey,
    ) -> Result<Option<ConsultationRecord>, StoreError>;

    /// Creates an empty consultation row. Fails with
    /// `StoreError::ConsultationExists` if one is already there.
    async fn create_consultation(&self, key: &AppointmentKey) -> Result<(), StoreError>;

    /// Sets one SOAP column of an existing consultation.
    async fn update_consultation_field(
        &self,
        key: &AppointmentKey,
        field: SoapField,
        value: Option<String>,
    ) -> Result<(), StoreError>;

    /// Returns `false` when the code was already attached.
    async fn append_diagnostic(
        &self,
        key: &AppointmentKey,
        code: &DiagnosticCode,
    ) -> Result<bool, StoreError>;

    /// Fails with `StoreError::DuplicatePrescription` if the id is taken.
    async fn insert_prescription(
        &self,
        key: &AppointmentKey,
        prescription: &Prescription,
    ) -> Result<(), StoreError>;

    /// Replaces any previously assigned nurse.
    async fn set_assisting_nurse(
        &self,
        key: &AppointmentKey,
        nurse: &NurseId,
    ) -> Result<(), StoreError>;
}
