//! Report handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;

use crate::dtos::OverviewQuery;
use crate::services::reports::{self, Dashboard, Overview};
use crate::startup::AppState;

/// GET /reports/dashboard
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, AppError> {
    Ok(Json(reports::dashboard(state.store.as_ref()).await?))
}

/// GET /reports/overview?startDate=&endDate=
pub async fn overview(
    State(state): State<AppState>,
    Query(query): Query<OverviewQuery>,
) -> Result<Json<Overview>, AppError> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "startDate must not be after endDate"
            )));
        }
    }
    Ok(Json(
        reports::overview(state.store.as_ref(), query.start_date, query.end_date).await?,
    ))
}
