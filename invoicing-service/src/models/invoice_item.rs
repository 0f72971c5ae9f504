//! Invoice item model for invoicing-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{recompute_if_needed, AmountOverflow, Amounts};

/// Billable line. `invoice_id == None` means the item is still pending billing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: i32,
    pub invoice_id: Option<i32>,
    pub customer_id: i32,
    /// Rate the item was prefilled from. Provenance only.
    pub rate_id: Option<i32>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub vat_rate: Decimal,
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    pub fn amounts(&self) -> Amounts {
        Amounts {
            subtotal: self.subtotal,
            vat_amount: self.vat_amount,
            total: self.total,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.invoice_id.is_some()
    }

    fn set_amounts(&mut self, amounts: Amounts) {
        self.subtotal = amounts.subtotal;
        self.vat_amount = amounts.vat_amount;
        self.total = amounts.total;
    }
}

/// Input for creating an item. Derived amounts are computed on insert.
#[derive(Debug, Clone)]
pub struct CreateInvoiceItem {
    pub invoice_id: Option<i32>,
    pub customer_id: i32,
    pub rate_id: Option<i32>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub vat_rate: Decimal,
}

impl CreateInvoiceItem {
    pub fn amounts(&self) -> Result<Amounts, AmountOverflow> {
        Amounts::derive(self.quantity, self.unit_price, self.vat_rate)
    }
}

/// Partial update of an item. `invoice_id: Some(None)` detaches the item from
/// its invoice.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceItem {
    pub invoice_id: Option<Option<i32>>,
    pub customer_id: Option<i32>,
    pub rate_id: Option<Option<i32>>,
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
}

impl UpdateInvoiceItem {
    /// Merge the patch, re-deriving the money fields when an input changed.
    /// The item is left untouched when the new amounts are out of range.
    pub fn apply_to(&self, item: &mut InvoiceItem) -> Result<(), AmountOverflow> {
        let derived = recompute_if_needed(item, self)?;

        if let Some(invoice_id) = self.invoice_id {
            item.invoice_id = invoice_id;
        }
        if let Some(customer_id) = self.customer_id {
            item.customer_id = customer_id;
        }
        if let Some(rate_id) = self.rate_id {
            item.rate_id = rate_id;
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(unit_price) = self.unit_price {
            item.unit_price = unit_price;
        }
        if let Some(vat_rate) = self.vat_rate {
            item.vat_rate = vat_rate;
        }
        if let Some(amounts) = derived {
            item.set_amounts(amounts);
        }
        Ok(())
    }
}
