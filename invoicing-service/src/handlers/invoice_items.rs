//! Invoice item handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::{CreateInvoiceItemRequest, UpdateInvoiceItemRequest};
use crate::models::{InvoiceItem, UpdateInvoiceItem};
use crate::startup::AppState;
use crate::utils::{parse_id, ValidatedJson};

fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Invoice item not found"))
}

/// GET /invoice-items
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<InvoiceItem>>, AppError> {
    Ok(Json(state.store.list_items().await?))
}

/// GET /invoice-items/unassigned
pub async fn list_unassigned_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvoiceItem>>, AppError> {
    Ok(Json(state.store.list_unassigned_items().await?))
}

/// GET /invoice-items/customer/:id
pub async fn list_items_by_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<InvoiceItem>>, AppError> {
    let customer_id = parse_id(&customer_id, "customer")?;
    if state.store.get_customer(customer_id).await?.is_none() {
        return Err(AppError::NotFound(anyhow::anyhow!("Customer not found")));
    }
    Ok(Json(state.store.list_items_by_customer(customer_id).await?))
}

/// GET /invoice-items/:id
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceItem>, AppError> {
    let id = parse_id(&id, "invoice item")?;
    state.store.get_item(id).await?.map(Json).ok_or_else(not_found)
}

/// POST /invoice-items
pub async fn create_item(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateInvoiceItemRequest>,
) -> Result<(StatusCode, Json<InvoiceItem>), AppError> {
    let item = state.store.create_item(&req.into()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /invoice-items/:id
///
/// Changing quantity, unit price or VAT rate re-derives the amounts.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateInvoiceItemRequest>,
) -> Result<Json<InvoiceItem>, AppError> {
    let id = parse_id(&id, "invoice item")?;
    let patch = UpdateInvoiceItem::from(req);
    state
        .store
        .update_item(id, &patch)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /invoice-items/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "invoice item")?;
    if state.store.delete_item(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
