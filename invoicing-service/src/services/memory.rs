//! In-memory store. State lives for the lifetime of the process.

use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use super::store::InvoiceStore;
use crate::models::{
    CreateCustomer, CreateInvoiceItem, CreateRate, Customer, Invoice, InvoiceItem, InvoiceStatus,
    ListInvoicesFilter, NewInvoice, Rate, UpdateCustomer, UpdateInvoice, UpdateInvoiceItem,
    UpdateRate,
};

#[derive(Default)]
struct Tables {
    customers: BTreeMap<i32, Customer>,
    rates: BTreeMap<i32, Rate>,
    items: BTreeMap<i32, InvoiceItem>,
    invoices: BTreeMap<i32, Invoice>,
    next_customer_id: i32,
    next_rate_id: i32,
    next_item_id: i32,
    next_invoice_id: i32,
    invoice_sequence: i64,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

impl Tables {
    fn rate_code_taken(&self, code: &str, except: Option<i32>) -> bool {
        self.rates
            .values()
            .any(|r| r.code == code && Some(r.id) != except)
    }

    fn invoice_number_taken(&self, number: &str, except: Option<i32>) -> bool {
        self.invoices
            .values()
            .any(|i| i.invoice_number == number && Some(i.id) != except)
    }

    fn assign(&mut self, invoice_id: i32, item_ids: &[i32]) -> u64 {
        let mut assigned = 0;
        for id in item_ids.iter().collect::<BTreeSet<_>>() {
            if let Some(item) = self.items.get_mut(id) {
                item.invoice_id = Some(invoice_id);
                assigned += 1;
            }
        }
        assigned
    }
}

/// Store backed by ordered maps behind a single lock. Every mutation holds the
/// write lock for its whole duration, so multi-row operations are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn rate_conflict(code: &str) -> AppError {
    AppError::Conflict(anyhow::anyhow!("Rate code '{}' already exists", code))
}

fn invoice_number_conflict(number: &str) -> AppError {
    AppError::Conflict(anyhow::anyhow!("Invoice number '{}' already exists", number))
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        Ok(self.tables.read().await.customers.values().cloned().collect())
    }

    async fn get_customer(&self, id: i32) -> Result<Option<Customer>, AppError> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    #[instrument(skip(self, input))]
    async fn create_customer(&self, input: &CreateCustomer) -> Result<Customer, AppError> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.next_customer_id);
        let customer = Customer {
            id,
            name: input.name.clone(),
            email: input.email.clone(),
            address: input.address.clone(),
            phone_number: input.phone_number.clone(),
        };
        tables.customers.insert(id, customer.clone());
        info!(customer_id = id, "Customer created");
        Ok(customer)
    }

    async fn update_customer(
        &self,
        id: i32,
        patch: &UpdateCustomer,
    ) -> Result<Option<Customer>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.customers.get_mut(&id).map(|customer| {
            patch.apply_to(customer);
            customer.clone()
        }))
    }

    async fn delete_customer(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.tables.write().await.customers.remove(&id).is_some())
    }

    async fn list_rates(&self) -> Result<Vec<Rate>, AppError> {
        Ok(self.tables.read().await.rates.values().cloned().collect())
    }

    async fn get_rate(&self, id: i32) -> Result<Option<Rate>, AppError> {
        Ok(self.tables.read().await.rates.get(&id).cloned())
    }

    async fn get_rate_by_code(&self, code: &str) -> Result<Option<Rate>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .rates
            .values()
            .find(|r| r.code == code)
            .cloned())
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    async fn create_rate(&self, input: &CreateRate) -> Result<Rate, AppError> {
        let mut tables = self.tables.write().await;
        if tables.rate_code_taken(&input.code, None) {
            return Err(rate_conflict(&input.code));
        }
        let id = next_id(&mut tables.next_rate_id);
        let rate = Rate {
            id,
            code: input.code.clone(),
            description: input.description.clone(),
            amount: input.amount,
            period: input.period.clone(),
            vat_rate: input.vat_rate,
            default_quantity: input.default_quantity,
            created_at: Utc::now(),
        };
        tables.rates.insert(id, rate.clone());
        info!(rate_id = id, "Rate created");
        Ok(rate)
    }

    async fn update_rate(&self, id: i32, patch: &UpdateRate) -> Result<Option<Rate>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.rates.contains_key(&id) {
            return Ok(None);
        }
        if let Some(code) = &patch.code {
            if tables.rate_code_taken(code, Some(id)) {
                return Err(rate_conflict(code));
            }
        }
        Ok(tables.rates.get_mut(&id).map(|rate| {
            patch.apply_to(rate);
            rate.clone()
        }))
    }

    async fn delete_rate(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.tables.write().await.rates.remove(&id).is_some())
    }

    async fn list_items(&self) -> Result<Vec<InvoiceItem>, AppError> {
        Ok(self.tables.read().await.items.values().cloned().collect())
    }

    async fn list_unassigned_items(&self) -> Result<Vec<InvoiceItem>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .items
            .values()
            .filter(|i| !i.is_assigned())
            .cloned()
            .collect())
    }

    async fn list_items_by_customer(
        &self,
        customer_id: i32,
    ) -> Result<Vec<InvoiceItem>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .items
            .values()
            .filter(|i| i.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn list_items_by_invoice(&self, invoice_id: i32) -> Result<Vec<InvoiceItem>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .items
            .values()
            .filter(|i| i.invoice_id == Some(invoice_id))
            .cloned()
            .collect())
    }

    async fn get_items_by_ids(&self, ids: &[i32]) -> Result<Vec<InvoiceItem>, AppError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|id| tables.items.get(id).cloned())
            .collect())
    }

    async fn get_item(&self, id: i32) -> Result<Option<InvoiceItem>, AppError> {
        Ok(self.tables.read().await.items.get(&id).cloned())
    }

    #[instrument(skip(self, input), fields(customer_id = input.customer_id))]
    async fn create_item(&self, input: &CreateInvoiceItem) -> Result<InvoiceItem, AppError> {
        let amounts = input.amounts()?;
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.next_item_id);
        let item = InvoiceItem {
            id,
            invoice_id: input.invoice_id,
            customer_id: input.customer_id,
            rate_id: input.rate_id,
            description: input.description.clone(),
            quantity: input.quantity,
            unit_price: input.unit_price,
            vat_rate: input.vat_rate,
            subtotal: amounts.subtotal,
            vat_amount: amounts.vat_amount,
            total: amounts.total,
            created_at: Utc::now(),
        };
        tables.items.insert(id, item.clone());
        info!(item_id = id, total = %item.total, "Invoice item created");
        Ok(item)
    }

    async fn update_item(
        &self,
        id: i32,
        patch: &UpdateInvoiceItem,
    ) -> Result<Option<InvoiceItem>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables.items.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(item)?;
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.tables.write().await.items.remove(&id).is_some())
    }

    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .invoices
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect())
    }

    async fn get_invoice(&self, id: i32) -> Result<Option<Invoice>, AppError> {
        Ok(self.tables.read().await.invoices.get(&id).cloned())
    }

    async fn invoice_number_exists(&self, invoice_number: &str) -> Result<bool, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .invoice_number_taken(invoice_number, None))
    }

    async fn next_invoice_sequence(&self) -> Result<i64, AppError> {
        let mut tables = self.tables.write().await;
        tables.invoice_sequence += 1;
        Ok(tables.invoice_sequence)
    }

    #[instrument(skip(self, input, item_ids), fields(invoice_number = %input.invoice_number))]
    async fn create_invoice(
        &self,
        input: &NewInvoice,
        item_ids: &[i32],
    ) -> Result<(Invoice, u64), AppError> {
        let mut tables = self.tables.write().await;
        if tables.invoice_number_taken(&input.invoice_number, None) {
            return Err(invoice_number_conflict(&input.invoice_number));
        }
        let id = next_id(&mut tables.next_invoice_id);
        let invoice = Invoice {
            id,
            invoice_number: input.invoice_number.clone(),
            customer_id: input.customer_id,
            issue_date: input.issue_date,
            due_date: input.due_date,
            subtotal: input.amounts.subtotal,
            vat_amount: input.amounts.vat_amount,
            total: input.amounts.total,
            status: input.status,
            notes: input.notes.clone(),
            created_at: Utc::now(),
        };
        tables.invoices.insert(id, invoice.clone());
        let assigned = tables.assign(id, item_ids);
        info!(invoice_id = id, assigned, "Invoice created");
        Ok((invoice, assigned))
    }

    async fn assign_items_to_invoice(
        &self,
        invoice_id: i32,
        item_ids: &[i32],
    ) -> Result<Option<u64>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.invoices.contains_key(&invoice_id) {
            return Ok(None);
        }
        Ok(Some(tables.assign(invoice_id, item_ids)))
    }

    async fn update_invoice(
        &self,
        id: i32,
        patch: &UpdateInvoice,
    ) -> Result<Option<Invoice>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.invoices.contains_key(&id) {
            return Ok(None);
        }
        if let Some(number) = &patch.invoice_number {
            if tables.invoice_number_taken(number, Some(id)) {
                return Err(invoice_number_conflict(number));
            }
        }
        Ok(tables.invoices.get_mut(&id).map(|invoice| {
            patch.apply_to(invoice);
            invoice.clone()
        }))
    }

    async fn update_invoice_status(
        &self,
        id: i32,
        status: InvoiceStatus,
    ) -> Result<Option<Invoice>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.invoices.get_mut(&id).map(|invoice| {
            invoice.status = status;
            invoice.clone()
        }))
    }

    async fn delete_invoice(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.tables.write().await.invoices.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Amounts;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn item_input(customer_id: i32, quantity: i64) -> CreateInvoiceItem {
        CreateInvoiceItem {
            invoice_id: None,
            customer_id,
            rate_id: None,
            description: "Consult".to_string(),
            quantity: Decimal::from(quantity),
            unit_price: Decimal::from(85),
            vat_rate: Decimal::from(21),
        }
    }

    fn new_invoice(number: &str) -> NewInvoice {
        NewInvoice {
            invoice_number: number.to_string(),
            customer_id: 3,
            issue_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 5, 31).unwrap(),
            amounts: Amounts::ZERO,
            status: InvoiceStatus::Draft,
            notes: None,
        }
    }

    #[tokio::test]
    async fn ids_are_scoped_per_store() {
        let first = MemoryStore::new();
        let second = MemoryStore::new();

        let a = first.create_item(&item_input(1, 1)).await.unwrap();
        let b = second.create_item(&item_input(1, 1)).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 1);
    }

    #[tokio::test]
    async fn create_item_derives_amounts() {
        let store = MemoryStore::new();
        let item = store.create_item(&item_input(3, 2)).await.unwrap();

        assert_eq!(item.subtotal, Decimal::from(170));
        assert_eq!(item.vat_amount, Decimal::new(3570, 2));
        assert_eq!(item.total, Decimal::new(20570, 2));
    }

    #[tokio::test]
    async fn create_invoice_assigns_existing_items_and_skips_unknown() {
        let store = MemoryStore::new();
        let a = store.create_item(&item_input(3, 2)).await.unwrap();
        let b = store.create_item(&item_input(3, 1)).await.unwrap();

        let (invoice, assigned) = store
            .create_invoice(&new_invoice("F-2026-0001"), &[a.id, b.id, 99])
            .await
            .unwrap();

        assert_eq!(assigned, 2);
        let on_invoice = store.list_items_by_invoice(invoice.id).await.unwrap();
        assert_eq!(on_invoice.len(), 2);
        assert!(store.list_unassigned_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_invoice_number_is_conflict() {
        let store = MemoryStore::new();
        store
            .create_invoice(&new_invoice("F-2026-0001"), &[])
            .await
            .unwrap();

        let err = store
            .create_invoice(&new_invoice("F-2026-0001"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn assignment_to_missing_invoice_changes_nothing() {
        let store = MemoryStore::new();
        let item = store.create_item(&item_input(3, 1)).await.unwrap();

        let result = store.assign_items_to_invoice(42, &[item.id]).await.unwrap();

        assert_eq!(result, None);
        assert_eq!(store.list_unassigned_items().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_invoice_leaves_items_dangling() {
        let store = MemoryStore::new();
        let item = store.create_item(&item_input(3, 1)).await.unwrap();
        let (invoice, _) = store
            .create_invoice(&new_invoice("F-2026-0001"), &[item.id])
            .await
            .unwrap();

        assert!(store.delete_invoice(invoice.id).await.unwrap());
        assert!(!store.delete_invoice(invoice.id).await.unwrap());

        let item = store.get_item(item.id).await.unwrap().unwrap();
        assert_eq!(item.invoice_id, Some(invoice.id));
    }

    #[tokio::test]
    async fn rate_code_must_be_unique_on_update() {
        let store = MemoryStore::new();
        let rate = |code: &str| CreateRate {
            code: code.to_string(),
            description: "Consult".to_string(),
            amount: Decimal::from(85),
            period: "per sessie".to_string(),
            vat_rate: Decimal::from(21),
            default_quantity: Decimal::ONE,
        };
        store.create_rate(&rate("CONSULT")).await.unwrap();
        let massage = store.create_rate(&rate("MASSAGE")).await.unwrap();

        let err = store
            .update_rate(
                massage.id,
                &UpdateRate {
                    code: Some("CONSULT".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let same = store
            .update_rate(
                massage.id,
                &UpdateRate {
                    code: Some("MASSAGE".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn repeated_item_ids_count_once() {
        let store = MemoryStore::new();
        let item = store.create_item(&item_input(3, 2)).await.unwrap();

        let fetched = store.get_items_by_ids(&[item.id, item.id]).await.unwrap();
        assert_eq!(fetched.len(), 1);

        let (invoice, assigned) = store
            .create_invoice(&new_invoice("F-2026-0001"), &[item.id, item.id])
            .await
            .unwrap();
        assert_eq!(assigned, 1);

        let reassigned = store
            .assign_items_to_invoice(invoice.id, &[item.id, item.id])
            .await
            .unwrap();
        assert_eq!(reassigned, Some(1));
    }

    #[tokio::test]
    async fn updating_missing_rate_is_not_a_conflict() {
        let store = MemoryStore::new();
        store
            .create_rate(&CreateRate {
                code: "CONSULT".to_string(),
                description: "Consult".to_string(),
                amount: Decimal::from(85),
                period: "per sessie".to_string(),
                vat_rate: Decimal::from(21),
                default_quantity: Decimal::ONE,
            })
            .await
            .unwrap();

        let result = store
            .update_rate(
                404,
                &UpdateRate {
                    code: Some("CONSULT".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn out_of_range_item_is_rejected() {
        let store = MemoryStore::new();
        let huge = Decimal::from(1_000_000_000_000_000i64);
        let mut input = item_input(3, 1);
        input.quantity = huge;
        input.unit_price = huge;

        let err = store.create_item(&input).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(store.list_items().await.unwrap().is_empty());
    }
}
