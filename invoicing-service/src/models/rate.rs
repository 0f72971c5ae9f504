//! Rate template model for invoicing-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Reusable billing template: prefills an item's description, price, VAT and quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    pub id: i32,
    pub code: String,
    pub description: String,
    pub amount: Decimal,
    /// Free-form label such as "per hour" or "per session".
    pub period: String,
    pub vat_rate: Decimal,
    pub default_quantity: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a rate.
#[derive(Debug, Clone)]
pub struct CreateRate {
    pub code: String,
    pub description: String,
    pub amount: Decimal,
    pub period: String,
    pub vat_rate: Decimal,
    pub default_quantity: Decimal,
}

/// Input for updating a rate.
#[derive(Debug, Clone, Default)]
pub struct UpdateRate {
    pub code: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub period: Option<String>,
    pub vat_rate: Option<Decimal>,
    pub default_quantity: Option<Decimal>,
}

impl UpdateRate {
    pub fn apply_to(&self, rate: &mut Rate) {
        if let Some(code) = &self.code {
            rate.code = code.clone();
        }
        if let Some(description) = &self.description {
            rate.description = description.clone();
        }
        if let Some(amount) = self.amount {
            rate.amount = amount;
        }
        if let Some(period) = &self.period {
            rate.period = period.clone();
        }
        if let Some(vat_rate) = self.vat_rate {
            rate.vat_rate = vat_rate;
        }
        if let Some(default_quantity) = self.default_quantity {
            rate.default_quantity = default_quantity;
        }
    }
}
