use chrono::NaiveDateTime;
use thiserror::Error;

use shared_models::{AppError, AppointmentKey, DoctorId, FactSchemaError, PrescriptionId};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Doctor {doctor} already has an appointment at {timestamp}")]
    SlotConflict {
        doctor: DoctorId,
        timestamp: NaiveDateTime,
    },

    #[error("Consultation already exists for {0}")]
    ConsultationExists(AppointmentKey),

    #[error("Prescription {id} already exists for {key}")]
    DuplicatePrescription {
        key: AppointmentKey,
        id: PrescriptionId,
    },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store configuration error: {0}")]
    Configuration(String),

    #[error("Store API error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Store payload error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid fact row: {0}")]
    InvalidFact(#[from] FactSchemaError),
}

impl StoreError {
    /// Failures of the backend itself, as opposed to constraint violations.
    /// Reads may be retried on these; commits must be re-checked first.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transport(_) => true,
            StoreError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SlotConflict { .. }
            | StoreError::ConsultationExists(_)
            | StoreError::DuplicatePrescription { .. } => AppError::Conflict(err.to_string()),
            StoreError::NotFound(_) => AppError::NotFound(err.to_string()),
            StoreError::Transport(_) | StoreError::Http { .. } => {
                AppError::ExternalService(err.to_string())
            }
            StoreError::Configuration(_) => AppError::Internal(err.to_string()),
            StoreError::Decode(_) | StoreError::InvalidFact(_) => AppError::Database(err.to_string()),
        }
    }
}
