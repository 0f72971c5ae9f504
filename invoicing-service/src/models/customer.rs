//! Customer model for invoicing-service.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A billable customer. Email is not unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// Input for creating a customer.
#[derive(Debug, Clone)]
pub struct CreateCustomer {
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// Partial update. For the nullable columns `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<Option<String>>,
    pub phone_number: Option<Option<String>>,
}

impl UpdateCustomer {
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if let Some(email) = &self.email {
            customer.email = email.clone();
        }
        if let Some(address) = &self.address {
            customer.address = address.clone();
        }
        if let Some(phone_number) = &self.phone_number {
            customer.phone_number = phone_number.clone();
        }
    }
}
