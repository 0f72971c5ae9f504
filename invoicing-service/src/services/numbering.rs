//! Invoice number generation.
//!
//! Canonical format is `F-<year>-<NNNN>`: the sequence part is zero-padded to
//! four digits and grows wider past 9999.

use service_core::error::AppError;
use tracing::warn;

use super::store::InvoiceStore;

const MAX_ATTEMPTS: usize = 50;

pub fn format_invoice_number(year: i32, sequence: i64) -> String {
    format!("F-{}-{:04}", year, sequence)
}

/// Draw sequence values until the formatted number is not yet in use. Numbers
/// can already be taken when callers supplied their own.
pub async fn next_invoice_number(store: &dyn InvoiceStore, year: i32) -> Result<String, AppError> {
    for _ in 0..MAX_ATTEMPTS {
        let sequence = store.next_invoice_sequence().await?;
        let candidate = format_invoice_number(year, sequence);
        if !store.invoice_number_exists(&candidate).await? {
            return Ok(candidate);
        }
        warn!(invoice_number = %candidate, "Generated invoice number already taken");
    }

    Err(AppError::InternalError(anyhow::anyhow!(
        "Could not generate a free invoice number after {} attempts",
        MAX_ATTEMPTS
    )))
}
