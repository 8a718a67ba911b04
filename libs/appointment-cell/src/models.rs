// libs/appointment-cell/src/models.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::{AppointmentSlot, ClientId, DoctorId};
use shared_utils::TimestampError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Scheduling form input. Date and time arrive as separate fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor: DoctorId,
    pub client: ClientId,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableDoctorsQuery {
    pub date: String,
    pub time: String,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAppointment {
    #[serde(flatten)]
    pub slot: AppointmentSlot,
    pub has_consultation: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("Doctor {doctor} is not available at {timestamp}")]
    SlotConflict {
        doctor: DoctorId,
        timestamp: NaiveDateTime,
    },

    #[error("Doctor not found: {0}")]
    UnknownDoctor(DoctorId),

    #[error("Client not found: {0}")]
    UnknownClient(ClientId),

    #[error(transparent)]
    InvalidTimestamp(#[from] TimestampError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
