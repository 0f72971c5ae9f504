//! Rate template handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::{CreateRateRequest, UpdateRateRequest};
use crate::models::{Rate, UpdateRate};
use crate::startup::AppState;
use crate::utils::{parse_id, ValidatedJson};

fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Rate not found"))
}

/// GET /rates
pub async fn list_rates(State(state): State<AppState>) -> Result<Json<Vec<Rate>>, AppError> {
    Ok(Json(state.store.list_rates().await?))
}

/// GET /rates/:id
pub async fn get_rate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Rate>, AppError> {
    let id = parse_id(&id, "rate")?;
    state.store.get_rate(id).await?.map(Json).ok_or_else(not_found)
}

/// GET /rates/code/:code
pub async fn get_rate_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Rate>, AppError> {
    state
        .store
        .get_rate_by_code(&code)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// POST /rates
///
/// A code that is already taken yields 409.
pub async fn create_rate(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateRateRequest>,
) -> Result<(StatusCode, Json<Rate>), AppError> {
    let rate = state.store.create_rate(&req.into()).await?;
    Ok((StatusCode::CREATED, Json(rate)))
}

/// PUT /rates/:id
pub async fn update_rate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateRateRequest>,
) -> Result<Json<Rate>, AppError> {
    let id = parse_id(&id, "rate")?;
    let patch = UpdateRate::from(req);
    state
        .store
        .update_rate(id, &patch)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /rates/:id
pub async fn delete_rate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "rate")?;
    if state.store.delete_rate(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
