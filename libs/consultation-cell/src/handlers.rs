// libs/consultation-cell/src/handlers.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::instrument;

use shared_database::StoreHandle;
use shared_models::error::AppError;
use shared_models::AppointmentKey;
use shared_utils::parse_timestamp;

use crate::models::{
    AddPrescriptionRequest, AssignNurseRequest, AttachDiagnosticRequest, ConsultationError,
    ConsultationOpen, DiagnosticAttachment, SoapFieldUpdate,
};
use crate::services::ConsultationWorkflow;

impl From<ConsultationError> for AppError {
    fn from(err: ConsultationError) -> Self {
        match err {
            ConsultationError::AppointmentNotFound(_)
            | ConsultationError::UnknownNurse(_)
            | ConsultationError::UnknownDiagnosticCode(_)
            | ConsultationError::UnknownMedication { .. } => AppError::NotFound(err.to_string()),
            ConsultationError::DuplicatePrescriptionId { .. } => AppError::Conflict(err.to_string()),
            ConsultationError::InvalidTimestamp(_) | ConsultationError::InvalidSoapField(_) => {
                AppError::BadRequest(err.to_string())
            }
            ConsultationError::Store(e) => e.into(),
        }
    }
}

fn appointment_key(doctor: String, timestamp: &str) -> Result<AppointmentKey, ConsultationError> {
    Ok(AppointmentKey::new(doctor, parse_timestamp(timestamp)?))
}

/// Current state of the consultation after an edit.
async fn edited(
    workflow: &ConsultationWorkflow,
    key: &AppointmentKey,
    opened: ConsultationOpen,
) -> Result<Json<Value>, AppError> {
    let consultation = workflow.consultation_details(key).await?;
    Ok(Json(json!({
        "consultation_created": opened.created(),
        "consultation": consultation,
    })))
}

#[axum::debug_handler]
#[instrument(skip(store))]
pub async fn get_consultation(
    State(store): State<StoreHandle>,
    Path((doctor, timestamp)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let key = appointment_key(doctor, &timestamp)?;
    let workflow = ConsultationWorkflow::new(store);

    let consultation = workflow
        .consultation_details(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No consultation for {}", key)))?;
    Ok(Json(json!(consultation)))
}

#[axum::debug_handler]
#[instrument(skip(store, update))]
pub async fn set_soap_field(
    State(store): State<StoreHandle>,
    Path((doctor, timestamp, field)): Path<(String, String, String)>,
    Json(update): Json<SoapFieldUpdate>,
) -> Result<Json<Value>, AppError> {
    let key = appointment_key(doctor, &timestamp)?;
    let workflow = ConsultationWorkflow::new(store);

    let opened = workflow
        .set_soap_field_named(&key, &field, update.value)
        .await?;
    edited(&workflow, &key, opened).await
}

#[axum::debug_handler]
#[instrument(skip(store))]
pub async fn attach_diagnostic(
    State(store): State<StoreHandle>,
    Path((doctor, timestamp)): Path<(String, String)>,
    Json(request): Json<AttachDiagnosticRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let key = appointment_key(doctor, &timestamp)?;
    let workflow = ConsultationWorkflow::new(store);

    let status = match workflow.attach_diagnostic(&key, &request.code).await? {
        DiagnosticAttachment::Attached => StatusCode::CREATED,
        DiagnosticAttachment::AlreadyPresent => StatusCode::OK,
    };
    let consultation = workflow.consultation_details(&key).await?;
    Ok((status, Json(json!({ "consultation": consultation }))))
}

#[axum::debug_handler]
#[instrument(skip(store))]
pub async fn add_prescription(
    State(store): State<StoreHandle>,
    Path((doctor, timestamp)): Path<(String, String)>,
    Json(request): Json<AddPrescriptionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let key = appointment_key(doctor, &timestamp)?;
    let workflow = ConsultationWorkflow::new(store);

    let prescription = workflow.add_prescription(&key, request).await?;
    Ok((StatusCode::CREATED, Json(json!(prescription))))
}

#[axum::debug_handler]
#[instrument(skip(store))]
pub async fn assign_nurse(
    State(store): State<StoreHandle>,
    Path((doctor, timestamp)): Path<(String, String)>,
    Json(request): Json<AssignNurseRequest>,
) -> Result<Json<Value>, AppError> {
    let key = appointment_key(doctor, &timestamp)?;
    let workflow = ConsultationWorkflow::new(store);

    let opened = workflow.assign_nurse(&key, &request.nurse).await?;
    edited(&workflow, &key, opened).await
}
