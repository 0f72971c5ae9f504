use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

use super::{double_option, validate_non_negative};
use crate::models::{InvoiceStatus, ListInvoicesFilter, UpdateInvoice};
use crate::services::assembly::InvoiceDraft;

fn parse_status(raw: Option<String>) -> Result<Option<InvoiceStatus>, AppError> {
    raw.map(|s| s.parse::<InvoiceStatus>())
        .transpose()
        .map_err(|e| AppError::BadRequest(e.into()))
}

/// Body of `POST /invoices`. `itemIds` lists the items to bind to the new
/// invoice; aggregates may be left out to have them summed from those items.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, message = "Invoice number must not be empty"))]
    pub invoice_number: Option<String>,
    pub customer_id: i32,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[validate(custom(function = "validate_non_negative"))]
    pub subtotal: Option<Decimal>,
    #[validate(custom(function = "validate_non_negative"))]
    pub vat_amount: Option<Decimal>,
    #[validate(custom(function = "validate_non_negative"))]
    pub total: Option<Decimal>,
    pub status: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub item_ids: Vec<i32>,
}

impl TryFrom<CreateInvoiceRequest> for InvoiceDraft {
    type Error = AppError;

    fn try_from(req: CreateInvoiceRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            invoice_number: req.invoice_number,
            customer_id: req.customer_id,
            issue_date: req.issue_date,
            due_date: req.due_date,
            subtotal: req.subtotal,
            vat_amount: req.vat_amount,
            total: req.total,
            status: parse_status(req.status)?,
            notes: req.notes,
            item_ids: req.item_ids,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    #[validate(length(min = 1, message = "Invoice number must not be empty"))]
    pub invoice_number: Option<String>,
    pub customer_id: Option<i32>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[validate(custom(function = "validate_non_negative"))]
    pub subtotal: Option<Decimal>,
    #[validate(custom(function = "validate_non_negative"))]
    pub vat_amount: Option<Decimal>,
    #[validate(custom(function = "validate_non_negative"))]
    pub total: Option<Decimal>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl TryFrom<UpdateInvoiceRequest> for UpdateInvoice {
    type Error = AppError;

    fn try_from(req: UpdateInvoiceRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            invoice_number: req.invoice_number,
            customer_id: req.customer_id,
            issue_date: req.issue_date,
            due_date: req.due_date,
            subtotal: req.subtotal,
            vat_amount: req.vat_amount,
            total: req.total,
            status: parse_status(req.status)?,
            notes: req.notes,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

impl UpdateStatusRequest {
    pub fn parse(&self) -> Result<InvoiceStatus, AppError> {
        self.status
            .parse()
            .map_err(|e: crate::models::ParseInvoiceStatusError| AppError::BadRequest(e.into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignItemsRequest {
    pub item_ids: Vec<i32>,
}

/// Query string of `GET /invoices`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListQuery {
    pub status: Option<String>,
    pub customer_id: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<InvoiceListQuery> for ListInvoicesFilter {
    type Error = AppError;

    fn try_from(query: InvoiceListQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            status: parse_status(query.status)?,
            customer_id: query.customer_id,
            start_date: query.start_date,
            end_date: query.end_date,
        })
    }
}

/// Query string of `GET /reports/overview`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
