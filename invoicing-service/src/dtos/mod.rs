//! Request and response bodies for the HTTP API.
//!
//! Field names are camelCase on the wire. Money and quantities are decimals,
//! accepted as JSON numbers or strings and always rendered as strings.

pub mod customer;
pub mod invoice;
pub mod invoice_item;
pub mod rate;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::ValidationError;

pub use customer::{CreateCustomerRequest, UpdateCustomerRequest};
pub use invoice::{
    AssignItemsRequest, CreateInvoiceRequest, InvoiceListQuery, OverviewQuery,
    UpdateInvoiceRequest, UpdateStatusRequest,
};
pub use invoice_item::{CreateInvoiceItemRequest, UpdateInvoiceItemRequest};
pub use rate::{CreateRateRequest, UpdateRateRequest};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn decimal_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub(crate) fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        Err(decimal_error("positive", "must be greater than 0"))
    }
}

pub(crate) fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(decimal_error("non_negative", "must not be negative"))
    } else {
        Ok(())
    }
}
