//! Dashboard and period overview figures.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;
use tracing::instrument;

use super::store::InvoiceStore;
use crate::models::{
    try_sum_decimals, Amounts, Invoice, InvoiceStatus, ListInvoicesFilter,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_invoices: usize,
    pub total_customers: usize,
    /// Sum of totals of pending and sent invoices.
    pub outstanding_amount: Decimal,
    pub paid_amount: Decimal,
    pub unassigned_items: usize,
    pub unbilled_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub invoice_count: usize,
    #[serde(flatten)]
    pub amounts: Amounts,
    pub paid_amount: Decimal,
    pub invoices: Vec<Invoice>,
}

fn sum_totals<'a>(invoices: impl Iterator<Item = &'a Invoice>) -> Result<Decimal, AppError> {
    try_sum_decimals(invoices.map(|i| i.total)).map_err(AppError::from)
}

fn paid(invoices: &[Invoice]) -> impl Iterator<Item = &Invoice> {
    invoices.iter().filter(|i| i.status == InvoiceStatus::Paid)
}

#[instrument(skip(store))]
pub async fn dashboard(store: &dyn InvoiceStore) -> Result<Dashboard, AppError> {
    let invoices = store.list_invoices(&ListInvoicesFilter::default()).await?;
    let customers = store.list_customers().await?;
    let unassigned = store.list_unassigned_items().await?;

    Ok(Dashboard {
        total_invoices: invoices.len(),
        total_customers: customers.len(),
        outstanding_amount: sum_totals(invoices.iter().filter(|i| i.status.is_outstanding()))?,
        paid_amount: sum_totals(paid(&invoices))?,
        unassigned_items: unassigned.len(),
        unbilled_amount: try_sum_decimals(unassigned.iter().map(|i| i.total))?,
    })
}

/// Invoices issued in the inclusive range with their summed aggregates.
#[instrument(skip(store))]
pub async fn overview(
    store: &dyn InvoiceStore,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Overview, AppError> {
    let filter = ListInvoicesFilter {
        start_date,
        end_date,
        ..Default::default()
    };
    let invoices = store.list_invoices(&filter).await?;

    Ok(Overview {
        start_date,
        end_date,
        invoice_count: invoices.len(),
        amounts: Amounts::try_sum(invoices.iter().map(Invoice::amounts))?,
        paid_amount: sum_totals(paid(&invoices))?,
        invoices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateInvoiceItem, NewInvoice};
    use crate::services::MemoryStore;

    fn invoice(number: &str, day: u32, total: i64, status: InvoiceStatus) -> NewInvoice {
        let total = Decimal::from(total);
        NewInvoice {
            invoice_number: number.to_string(),
            customer_id: 1,
            issue_date: NaiveDate::from_ymd_opt(2026, 6, day).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 7, day).unwrap(),
            amounts: Amounts {
                subtotal: total,
                vat_amount: Decimal::ZERO,
                total,
            },
            status,
            notes: None,
        }
    }

    async fn populated() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_invoice(&invoice("F-2026-0001", 1, 100, InvoiceStatus::Paid), &[])
            .await
            .unwrap();
        store
            .create_invoice(&invoice("F-2026-0002", 10, 40, InvoiceStatus::Sent), &[])
            .await
            .unwrap();
        store
            .create_invoice(&invoice("F-2026-0003", 20, 7, InvoiceStatus::Pending), &[])
            .await
            .unwrap();
        store
            .create_invoice(&invoice("F-2026-0004", 25, 3, InvoiceStatus::Draft), &[])
            .await
            .unwrap();
        store
            .create_item(&CreateInvoiceItem {
                invoice_id: None,
                customer_id: 1,
                rate_id: None,
                description: "Massage".to_string(),
                quantity: Decimal::ONE,
                unit_price: Decimal::from(65),
                vat_rate: Decimal::from(21),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn dashboard_splits_outstanding_and_paid() {
        let store = populated().await;

        let d = dashboard(&store).await.unwrap();

        assert_eq!(d.total_invoices, 4);
        assert_eq!(d.outstanding_amount, Decimal::from(47));
        assert_eq!(d.paid_amount, Decimal::from(100));
        assert_eq!(d.unassigned_items, 1);
        assert_eq!(d.unbilled_amount, Decimal::new(7865, 2));
    }

    #[tokio::test]
    async fn overview_limits_to_range() {
        let store = populated().await;

        let o = overview(
            &store,
            NaiveDate::from_ymd_opt(2026, 6, 1),
            NaiveDate::from_ymd_opt(2026, 6, 10),
        )
        .await
        .unwrap();

        assert_eq!(o.invoice_count, 2);
        assert_eq!(o.amounts.total, Decimal::from(140));
        assert_eq!(o.paid_amount, Decimal::from(100));
    }
}
