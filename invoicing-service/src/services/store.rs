//! Storage abstraction for invoicing-service.
//!
//! Two backends implement [`InvoiceStore`]: [`PgStore`](super::PgStore) for
//! PostgreSQL and [`MemoryStore`](super::MemoryStore) for process-lifetime
//! storage (local runs and tests).

use async_trait::async_trait;
use service_core::error::AppError;

use crate::models::{
    CreateCustomer, CreateInvoiceItem, CreateRate, Customer, Invoice, InvoiceItem, InvoiceStatus,
    ListInvoicesFilter, NewInvoice, Rate, UpdateCustomer, UpdateInvoice, UpdateInvoiceItem,
    UpdateRate,
};

/// Persistence for customers, rates, invoice items and invoices.
///
/// Lookups return `Ok(None)` when the row does not exist and deletes return
/// whether a row was removed. Deletes never cascade. Unique violations on
/// `rates.code` and `invoices.invoice_number` surface as [`AppError::Conflict`].
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    async fn list_customers(&self) -> Result<Vec<Customer>, AppError>;
    async fn get_customer(&self, id: i32) -> Result<Option<Customer>, AppError>;
    async fn create_customer(&self, input: &CreateCustomer) -> Result<Customer, AppError>;
    async fn update_customer(
        &self,
        id: i32,
        patch: &UpdateCustomer,
    ) -> Result<Option<Customer>, AppError>;
    async fn delete_customer(&self, id: i32) -> Result<bool, AppError>;

    async fn list_rates(&self) -> Result<Vec<Rate>, AppError>;
    async fn get_rate(&self, id: i32) -> Result<Option<Rate>, AppError>;
    async fn get_rate_by_code(&self, code: &str) -> Result<Option<Rate>, AppError>;
    async fn create_rate(&self, input: &CreateRate) -> Result<Rate, AppError>;
    async fn update_rate(&self, id: i32, patch: &UpdateRate) -> Result<Option<Rate>, AppError>;
    async fn delete_rate(&self, id: i32) -> Result<bool, AppError>;

    async fn list_items(&self) -> Result<Vec<InvoiceItem>, AppError>;
    async fn list_unassigned_items(&self) -> Result<Vec<InvoiceItem>, AppError>;
    async fn list_items_by_customer(&self, customer_id: i32)
        -> Result<Vec<InvoiceItem>, AppError>;
    async fn list_items_by_invoice(&self, invoice_id: i32) -> Result<Vec<InvoiceItem>, AppError>;
    /// Items among `ids` that exist. Unknown ids are skipped.
    async fn get_items_by_ids(&self, ids: &[i32]) -> Result<Vec<InvoiceItem>, AppError>;
    async fn get_item(&self, id: i32) -> Result<Option<InvoiceItem>, AppError>;
    /// Insert an item; derived amounts are computed from the input.
    async fn create_item(&self, input: &CreateInvoiceItem) -> Result<InvoiceItem, AppError>;
    /// Merge a patch, re-deriving amounts when quantity, price or VAT changed.
    async fn update_item(
        &self,
        id: i32,
        patch: &UpdateInvoiceItem,
    ) -> Result<Option<InvoiceItem>, AppError>;
    async fn delete_item(&self, id: i32) -> Result<bool, AppError>;

    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError>;
    async fn get_invoice(&self, id: i32) -> Result<Option<Invoice>, AppError>;
    async fn invoice_number_exists(&self, invoice_number: &str) -> Result<bool, AppError>;
    /// Next value of the invoice number sequence. Strictly increasing per store.
    async fn next_invoice_sequence(&self) -> Result<i64, AppError>;
    /// Insert the invoice and assign `item_ids` to it atomically. Returns the
    /// invoice and the number of items assigned.
    async fn create_invoice(
        &self,
        input: &NewInvoice,
        item_ids: &[i32],
    ) -> Result<(Invoice, u64), AppError>;
    /// Point `item_ids` at the invoice atomically. `None` when the invoice does
    /// not exist, in which case nothing is updated.
    async fn assign_items_to_invoice(
        &self,
        invoice_id: i32,
        item_ids: &[i32],
    ) -> Result<Option<u64>, AppError>;
    async fn update_invoice(
        &self,
        id: i32,
        patch: &UpdateInvoice,
    ) -> Result<Option<Invoice>, AppError>;
    async fn update_invoice_status(
        &self,
        id: i32,
        status: InvoiceStatus,
    ) -> Result<Option<Invoice>, AppError>;
    async fn delete_invoice(&self, id: i32) -> Result<bool, AppError>;
}
