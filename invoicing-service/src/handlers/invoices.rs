//! Invoice handlers, including assembly and item assignment.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::{
    AssignItemsRequest, CreateInvoiceRequest, InvoiceListQuery, MessageResponse,
    UpdateInvoiceRequest, UpdateStatusRequest,
};
use crate::models::{Invoice, InvoiceItem, ListInvoicesFilter, UpdateInvoice};
use crate::services::assembly::{self, InvoiceDraft};
use crate::startup::AppState;
use crate::utils::{parse_id, ValidatedJson};

fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Invoice not found"))
}

/// GET /invoices?status=&customerId=&startDate=&endDate=
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let filter = ListInvoicesFilter::try_from(query)?;
    Ok(Json(state.store.list_invoices(&filter).await?))
}

/// GET /invoices/customer/:id
pub async fn list_invoices_by_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let customer_id = parse_id(&customer_id, "customer")?;
    if state.store.get_customer(customer_id).await?.is_none() {
        return Err(AppError::NotFound(anyhow::anyhow!("Customer not found")));
    }
    let filter = ListInvoicesFilter {
        customer_id: Some(customer_id),
        ..Default::default()
    };
    Ok(Json(state.store.list_invoices(&filter).await?))
}

/// GET /invoices/:id
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, AppError> {
    let id = parse_id(&id, "invoice")?;
    state.store.get_invoice(id).await?.map(Json).ok_or_else(not_found)
}

/// POST /invoices
///
/// Creates the invoice and binds `itemIds` to it in one step.
pub async fn create_invoice(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    let draft = InvoiceDraft::try_from(req)?;
    let assembled = assembly::assemble_invoice(state.store.as_ref(), draft).await?;
    Ok((StatusCode::CREATED, Json(assembled.invoice)))
}

/// PUT /invoices/:id
///
/// Aggregates are stored as sent; they are not re-summed from the items.
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateInvoiceRequest>,
) -> Result<Json<Invoice>, AppError> {
    let id = parse_id(&id, "invoice")?;
    let patch = UpdateInvoice::try_from(req)?;
    state
        .store
        .update_invoice(id, &patch)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// PUT /invoices/:id/status
///
/// Any status may follow any other.
pub async fn update_invoice_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateStatusRequest>,
) -> Result<Json<Invoice>, AppError> {
    let id = parse_id(&id, "invoice")?;
    let status = req.parse()?;
    state
        .store
        .update_invoice_status(id, status)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /invoices/:id
///
/// Items that pointed at the invoice keep their reference.
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "invoice")?;
    if state.store.delete_invoice(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

/// GET /invoices/:id/items
pub async fn list_invoice_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<InvoiceItem>>, AppError> {
    let id = parse_id(&id, "invoice")?;
    if state.store.get_invoice(id).await?.is_none() {
        return Err(not_found());
    }
    Ok(Json(state.store.list_items_by_invoice(id).await?))
}

/// POST /invoices/:id/items
pub async fn assign_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<AssignItemsRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "invoice")?;
    assembly::assign_items(state.store.as_ref(), id, &req.item_ids)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(MessageResponse {
        message: "Items assigned to invoice successfully".to_string(),
    }))
}
