// libs/consultation-cell/src/services/workflow.rs
use tracing::{debug, info, instrument};

use shared_database::{AppointmentFilter, StoreError, StoreHandle};
use shared_models::{
    AppointmentKey, ConsultationRecord, DiagnosticCode, Medication, NurseId, Prescription,
    SoapField,
};

use crate::models::{
    AddPrescriptionRequest, ConsultationError, ConsultationOpen, DiagnosticAttachment,
};

/// Consultation edits keyed by appointment (doctor, timestamp).
///
/// Every edit opens the consultation first: an existing row is reused and a
/// missing one is created, provided the appointment itself exists.
pub struct ConsultationWorkflow {
    store: StoreHandle,
}

impl ConsultationWorkflow {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(key = %key))]
    pub async fn open_consultation(
        &self,
        key: &AppointmentKey,
    ) -> Result<ConsultationOpen, ConsultationError> {
        if self.store.fetch_consultation(key).await?.is_some() {
            return Ok(ConsultationOpen::Existing);
        }

        let filter = AppointmentFilter {
            doctor: Some(key.doctor.clone()),
            timestamp: Some(key.timestamp),
            ..AppointmentFilter::default()
        };
        if self.store.fetch_appointments(&filter).await?.is_empty() {
            return Err(ConsultationError::AppointmentNotFound(key.clone()));
        }

        match self.store.create_consultation(key).await {
            Ok(()) => {
                info!("Created consultation for {}", key);
                Ok(ConsultationOpen::Created)
            }
            // Another edit created it between lookup and insert.
            Err(StoreError::ConsultationExists(_)) => Ok(ConsultationOpen::Existing),
            Err(e) => Err(e.into()),
        }
    }

    /// Sets one SOAP field, leaving the other three untouched.
    #[instrument(skip_all, fields(key = %key, field = %field))]
    pub async fn set_soap_field(
        &self,
        key: &AppointmentKey,
        field: SoapField,
        value: Option<String>,
    ) -> Result<ConsultationOpen, ConsultationError> {
        let opened = self.open_consultation(key).await?;
        self.store.update_consultation_field(key, field, value).await?;
        Ok(opened)
    }

    /// Like [`Self::set_soap_field`] with the field given by name (`soap_s`, `s`, `subjective`, ...).
    pub async fn set_soap_field_named(
        &self,
        key: &AppointmentKey,
        field: &str,
        value: Option<String>,
    ) -> Result<ConsultationOpen, ConsultationError> {
        let field: SoapField = field.parse().map_err(ConsultationError::InvalidSoapField)?;
        self.set_soap_field(key, field, value).await
    }

    #[instrument(skip_all, fields(key = %key, code = %code))]
    pub async fn attach_diagnostic(
        &self,
        key: &AppointmentKey,
        code: &DiagnosticCode,
    ) -> Result<DiagnosticAttachment, ConsultationError> {
        let known = self.store.fetch_diagnostic_codes().await?;
        if !known.contains(code) {
            return Err(ConsultationError::UnknownDiagnosticCode(code.clone()));
        }

        self.open_consultation(key).await?;
        if self.store.append_diagnostic(key, code).await? {
            Ok(DiagnosticAttachment::Attached)
        } else {
            debug!("Diagnostic {} already attached to {}", code, key);
            Ok(DiagnosticAttachment::AlreadyPresent)
        }
    }

    #[instrument(skip_all, fields(key = %key, id = %request.id))]
    pub async fn add_prescription(
        &self,
        key: &AppointmentKey,
        request: AddPrescriptionRequest,
    ) -> Result<Prescription, ConsultationError> {
        let medication = Medication {
            name: request.medication,
            lab: request.lab,
        };
        let catalog = self.store.fetch_medications().await?;
        if !catalog.contains(&medication) {
            return Err(ConsultationError::UnknownMedication {
                name: medication.name,
                lab: medication.lab,
            });
        }

        let prescription = Prescription {
            id: request.id,
            medication,
            dosage: request.dosage,
            description: request.description.unwrap_or_default(),
        };

        self.open_consultation(key).await?;
        match self.store.insert_prescription(key, &prescription).await {
            Ok(()) => Ok(prescription),
            Err(StoreError::DuplicatePrescription { key, id }) => {
                Err(ConsultationError::DuplicatePrescriptionId { key, id })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces any nurse already assigned.
    #[instrument(skip_all, fields(key = %key, nurse = %nurse))]
    pub async fn assign_nurse(
        &self,
        key: &AppointmentKey,
        nurse: &NurseId,
    ) -> Result<ConsultationOpen, ConsultationError> {
        let nurses = self.store.fetch_nurses().await?;
        if !nurses.iter().any(|n| &n.vat == nurse) {
            return Err(ConsultationError::UnknownNurse(nurse.clone()));
        }

        let opened = self.open_consultation(key).await?;
        self.store.set_assisting_nurse(key, nurse).await?;
        Ok(opened)
    }

    /// `None` until the first edit creates the consultation.
    pub async fn consultation_details(
        &self,
        key: &AppointmentKey,
    ) -> Result<Option<ConsultationRecord>, ConsultationError> {
        Ok(self.store.fetch_consultation(key).await?)
    }
}
