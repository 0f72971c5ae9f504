use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::{double_option, validate_non_negative, validate_positive};
use crate::models::{CreateInvoiceItem, UpdateInvoiceItem};

/// Derived amounts are never accepted from the client; unknown fields such as
/// `subtotal` are ignored.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceItemRequest {
    pub invoice_id: Option<i32>,
    pub customer_id: i32,
    pub rate_id: Option<i32>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,
    #[validate(custom(function = "validate_non_negative"))]
    pub unit_price: Decimal,
    #[validate(custom(function = "validate_non_negative"))]
    pub vat_rate: Decimal,
}

impl From<CreateInvoiceItemRequest> for CreateInvoiceItem {
    fn from(req: CreateInvoiceItemRequest) -> Self {
        Self {
            invoice_id: req.invoice_id,
            customer_id: req.customer_id,
            rate_id: req.rate_id,
            description: req.description,
            quantity: req.quantity,
            unit_price: req.unit_price,
            vat_rate: req.vat_rate,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceItemRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub invoice_id: Option<Option<i32>>,
    pub customer_id: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub rate_id: Option<Option<i32>>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_positive"))]
    pub quantity: Option<Decimal>,
    #[validate(custom(function = "validate_non_negative"))]
    pub unit_price: Option<Decimal>,
    #[validate(custom(function = "validate_non_negative"))]
    pub vat_rate: Option<Decimal>,
}

impl From<UpdateInvoiceItemRequest> for UpdateInvoiceItem {
    fn from(req: UpdateInvoiceItemRequest) -> Self {
        Self {
            invoice_id: req.invoice_id,
            customer_id: req.customer_id,
            rate_id: req.rate_id,
            description: req.description,
            quantity: req.quantity,
            unit_price: req.unit_price,
            vat_rate: req.vat_rate,
        }
    }
}
