//! HTTP handlers for invoicing-service.

pub mod customers;
pub mod health;
pub mod invoice_items;
pub mod invoices;
pub mod reports;
pub mod rates;
