// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::instrument;

use shared_database::StoreHandle;
use shared_models::error::AppError;
use shared_models::ClientId;

use crate::models::{AvailableDoctorsQuery, BookAppointmentRequest, SchedulingError};
use crate::services::{AvailabilityService, BookingService};

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::SlotConflict { .. } => AppError::Conflict(err.to_string()),
            SchedulingError::UnknownDoctor(_) | SchedulingError::UnknownClient(_) => {
                AppError::NotFound(err.to_string())
            }
            SchedulingError::InvalidTimestamp(e) => AppError::BadRequest(e.to_string()),
            SchedulingError::Store(e) => e.into(),
        }
    }
}

/// Doctors with no appointment at the requested date and time.
#[axum::debug_handler]
#[instrument(skip(store))]
pub async fn search_available_doctors(
    State(store): State<StoreHandle>,
    Query(query): Query<AvailableDoctorsQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(store);
    let doctors = service.search_doctors(&query.date, &query.time).await?;

    Ok(Json(json!({
        "date": query.date,
        "time": query.time,
        "doctors": doctors,
        "total": doctors.len(),
    })))
}

#[axum::debug_handler]
#[instrument(skip(store))]
pub async fn book_appointment(
    State(store): State<StoreHandle>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = BookingService::new(store);
    let appointment = service.book_appointment(request).await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
#[instrument(skip(store))]
pub async fn get_client_appointments(
    State(store): State<StoreHandle>,
    Path(vat): Path<String>,
) -> Result<Json<Value>, AppError> {
    let client = ClientId::from(vat);
    let service = BookingService::new(store);
    let appointments = service.client_appointments(&client).await?;

    Ok(Json(json!({
        "client": client,
        "appointments": appointments,
        "total": appointments.len(),
    })))
}
