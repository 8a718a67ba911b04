// libs/analytics-cell/src/handlers.rs
use axum::{
    extract::{Query, State},
    Json,
};
use tracing::instrument;

use shared_database::{FactFilter, StoreHandle};
use shared_models::error::AppError;

use crate::models::{AggregationError, DashboardReport};
use crate::services::DashboardService;

impl From<AggregationError> for AppError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::InvalidSpec(msg) => AppError::BadRequest(msg),
            AggregationError::MeasureOverflow { .. } => AppError::Internal(err.to_string()),
            AggregationError::Store(e) => e.into(),
        }
    }
}

/// Both dashboard aggregations, optionally restricted to a consultation date range.
#[axum::debug_handler]
#[instrument(skip(store))]
pub async fn get_dashboard(
    State(store): State<StoreHandle>,
    Query(filter): Query<FactFilter>,
) -> Result<Json<DashboardReport>, AppError> {
    let service = DashboardService::new(store);
    let report = service.dashboard(&filter).await?;
    Ok(Json(report))
}
