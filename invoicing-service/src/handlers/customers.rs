//! Customer handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::{CreateCustomerRequest, UpdateCustomerRequest};
use crate::models::{Customer, UpdateCustomer};
use crate::startup::AppState;
use crate::utils::{parse_id, ValidatedJson};

fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Customer not found"))
}

/// GET /customers
pub async fn list_customers(State(state): State<AppState>) -> Result<Json<Vec<Customer>>, AppError> {
    Ok(Json(state.store.list_customers().await?))
}

/// GET /customers/:id
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, AppError> {
    let id = parse_id(&id, "customer")?;
    state
        .store
        .get_customer(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// POST /customers
pub async fn create_customer(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    let customer = state.store.create_customer(&req.into()).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// PUT /customers/:id
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateCustomerRequest>,
) -> Result<Json<Customer>, AppError> {
    let id = parse_id(&id, "customer")?;
    let patch = UpdateCustomer::from(req);
    state
        .store
        .update_customer(id, &patch)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /customers/:id
///
/// Invoices and items of the customer are left in place.
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "customer")?;
    if state.store.delete_customer(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
