//! Invoice assembly: turn a selection of pending items into an invoice.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use service_core::error::AppError;
use tracing::{info, instrument, warn};

use super::metrics::{INVOICES_TOTAL, ITEMS_ASSIGNED_TOTAL};
use super::numbering::next_invoice_number;
use super::store::InvoiceStore;
use crate::models::{Amounts, Invoice, InvoiceItem, InvoiceStatus, NewInvoice};

const MAX_NUMBER_RETRIES: usize = 3;

/// Item ids in ascending order, each once.
fn unique_ids(item_ids: &[i32]) -> Vec<i32> {
    let mut ids = item_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Everything the caller provides when assembling an invoice.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub invoice_number: Option<String>,
    pub customer_id: i32,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub total: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
    pub notes: Option<String>,
    pub item_ids: Vec<i32>,
}

impl InvoiceDraft {
    /// Caller supplied aggregates, if any. They come as all three or none.
    fn supplied_amounts(&self) -> Result<Option<Amounts>, AppError> {
        match (self.subtotal, self.vat_amount, self.total) {
            (Some(subtotal), Some(vat_amount), Some(total)) => Ok(Some(Amounts {
                subtotal,
                vat_amount,
                total,
            })),
            (None, None, None) => Ok(None),
            _ => Err(AppError::BadRequest(anyhow::anyhow!(
                "subtotal, vatAmount and total must be supplied together"
            ))),
        }
    }
}

/// Result of assembling an invoice.
#[derive(Debug, Clone)]
pub struct AssembledInvoice {
    pub invoice: Invoice,
    pub assigned_items: u64,
}

/// Create an invoice and bind the selected items to it in one store transaction.
///
/// Aggregates are taken from the draft as given. When the draft carries none,
/// they are summed from the selected items that exist. Unknown item ids are
/// skipped and repeated ids count once. A number is generated from the issue year when none is supplied.
#[instrument(skip(store, draft), fields(customer_id = draft.customer_id, item_count = draft.item_ids.len()))]
pub async fn assemble_invoice(
    store: &dyn InvoiceStore,
    draft: InvoiceDraft,
) -> Result<AssembledInvoice, AppError> {
    let item_ids = unique_ids(&draft.item_ids);
    let amounts = match draft.supplied_amounts()? {
        Some(amounts) => amounts,
        None => {
            let items = store.get_items_by_ids(&item_ids).await?;
            Amounts::try_sum(items.iter().map(InvoiceItem::amounts))?
        }
    };

    let status = draft.status.unwrap_or_default();
    let mut new_invoice = NewInvoice {
        invoice_number: String::new(),
        customer_id: draft.customer_id,
        issue_date: draft.issue_date,
        due_date: draft.due_date,
        amounts,
        status,
        notes: draft.notes.clone(),
    };

    let (invoice, assigned_items) = match draft.invoice_number {
        Some(number) => {
            new_invoice.invoice_number = number;
            store.create_invoice(&new_invoice, &item_ids).await?
        }
        None => create_with_generated_number(store, &mut new_invoice, &item_ids).await?,
    };

    INVOICES_TOTAL.with_label_values(&[status.as_str()]).inc();
    ITEMS_ASSIGNED_TOTAL.inc_by(assigned_items);

    info!(
        invoice_id = invoice.id,
        invoice_number = %invoice.invoice_number,
        assigned_items = assigned_items,
        total = %invoice.total,
        "Invoice assembled"
    );

    Ok(AssembledInvoice {
        invoice,
        assigned_items,
    })
}

/// A generated number can still lose a race against a concurrent insert, in
/// which case a fresh one is drawn.
async fn create_with_generated_number(
    store: &dyn InvoiceStore,
    new_invoice: &mut NewInvoice,
    item_ids: &[i32],
) -> Result<(Invoice, u64), AppError> {
    let year = new_invoice.issue_date.year();
    let mut attempt = 0;
    loop {
        attempt += 1;
        new_invoice.invoice_number = next_invoice_number(store, year).await?;
        match store.create_invoice(new_invoice, item_ids).await {
            Err(AppError::Conflict(e)) if attempt < MAX_NUMBER_RETRIES => {
                warn!(error = %e, attempt = attempt, "Invoice number collision, retrying");
            }
            result => return result,
        }
    }
}

/// Bind items to an existing invoice. The invoice aggregates are left as they
/// are. Returns `None` when the invoice does not exist.
#[instrument(skip(store, item_ids), fields(item_count = item_ids.len()))]
pub async fn assign_items(
    store: &dyn InvoiceStore,
    invoice_id: i32,
    item_ids: &[i32],
) -> Result<Option<u64>, AppError> {
    let assigned = store
        .assign_items_to_invoice(invoice_id, &unique_ids(item_ids))
        .await?;
    if let Some(count) = assigned {
        ITEMS_ASSIGNED_TOTAL.inc_by(count);
    }
    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateInvoiceItem;
    use crate::services::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(item_ids: Vec<i32>) -> InvoiceDraft {
        InvoiceDraft {
            invoice_number: None,
            customer_id: 3,
            issue_date: date(2026, 4, 1),
            due_date: date(2026, 4, 15),
            subtotal: None,
            vat_amount: None,
            total: None,
            status: None,
            notes: None,
            item_ids,
        }
    }

    async fn seed_items(store: &MemoryStore) -> (i32, i32) {
        let consult = |quantity: i64| CreateInvoiceItem {
            invoice_id: None,
            customer_id: 3,
            rate_id: None,
            description: "Consult".to_string(),
            quantity: Decimal::from(quantity),
            unit_price: Decimal::from(85),
            vat_rate: Decimal::from(21),
        };
        let a = store.create_item(&consult(2)).await.unwrap();
        let b = store.create_item(&consult(1)).await.unwrap();
        (a.id, b.id)
    }

    #[tokio::test]
    async fn sums_selected_items_when_aggregates_omitted() {
        let store = MemoryStore::new();
        let (a, b) = seed_items(&store).await;

        let assembled = assemble_invoice(&store, draft(vec![a, b])).await.unwrap();

        let invoice = assembled.invoice;
        assert_eq!(assembled.assigned_items, 2);
        assert_eq!(invoice.subtotal, Decimal::from(255));
        assert_eq!(invoice.vat_amount, Decimal::new(5355, 2));
        assert_eq!(invoice.total, Decimal::new(30855, 2));
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.invoice_number, "F-2026-0001");
    }

    #[tokio::test]
    async fn supplied_aggregates_are_stored_verbatim() {
        let store = MemoryStore::new();
        let (a, _) = seed_items(&store).await;

        let mut d = draft(vec![a]);
        d.subtotal = Some(Decimal::from(1));
        d.vat_amount = Some(Decimal::from(2));
        d.total = Some(Decimal::from(3));
        d.status = Some(InvoiceStatus::Sent);

        let invoice = assemble_invoice(&store, d).await.unwrap().invoice;
        assert_eq!(invoice.subtotal, Decimal::from(1));
        assert_eq!(invoice.total, Decimal::from(3));
        assert_eq!(invoice.status, InvoiceStatus::Sent);
    }

    #[tokio::test]
    async fn partial_aggregates_are_rejected() {
        let store = MemoryStore::new();
        let mut d = draft(vec![]);
        d.subtotal = Some(Decimal::from(10));

        let err = assemble_invoice(&store, d).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(store.list_invoices(&Default::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn generated_numbers_avoid_manual_ones() {
        let store = MemoryStore::new();
        let mut manual = draft(vec![]);
        manual.invoice_number = Some("F-2026-0001".to_string());
        assemble_invoice(&store, manual).await.unwrap();

        let generated = assemble_invoice(&store, draft(vec![])).await.unwrap().invoice;
        assert_eq!(generated.invoice_number, "F-2026-0002");
    }

    #[tokio::test]
    async fn duplicate_manual_number_is_conflict() {
        let store = MemoryStore::new();
        let mut first = draft(vec![]);
        first.invoice_number = Some("INV-1".to_string());
        assemble_invoice(&store, first.clone()).await.unwrap();

        let err = assemble_invoice(&store, first).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn repeated_item_id_is_summed_once() {
        let store = MemoryStore::new();
        let (a, _) = seed_items(&store).await;

        let assembled = assemble_invoice(&store, draft(vec![a, a])).await.unwrap();

        assert_eq!(assembled.assigned_items, 1);
        assert_eq!(assembled.invoice.total, Decimal::new(20570, 2));
    }

    #[tokio::test]
    async fn repeated_ids_are_assigned_once() {
        let store = MemoryStore::new();
        let (a, b) = seed_items(&store).await;
        let invoice = assemble_invoice(&store, draft(vec![])).await.unwrap().invoice;

        let assigned = assign_items(&store, invoice.id, &[b, a, b]).await.unwrap();

        assert_eq!(assigned, Some(2));
    }

    #[test]
    fn unique_ids_sorts_and_dedups() {
        assert_eq!(unique_ids(&[3, 1, 3, 2, 1]), vec![1, 2, 3]);
        assert!(unique_ids(&[]).is_empty());
    }
}
