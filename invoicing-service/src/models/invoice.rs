//! Invoice model for invoicing-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use super::Amounts;

/// Invoice status. Any status may be set at any time; there is no transition guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Pending,
    Sent,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid invoice status: '{0}'")]
pub struct ParseInvoiceStatusError(pub String);

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Pending,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// Sent or pending: billed but not yet paid.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, InvoiceStatus::Pending | InvoiceStatus::Sent)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ParseInvoiceStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseInvoiceStatusError(s.to_string()))
    }
}

impl TryFrom<String> for InvoiceStatus {
    type Error = ParseInvoiceStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Invoice document.
///
/// `subtotal`, `vat_amount` and `total` are captured when the invoice is
/// assembled and are not kept in sync with later item changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i32,
    pub invoice_number: String,
    pub customer_id: i32,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
    #[sqlx(try_from = "String")]
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn amounts(&self) -> Amounts {
        Amounts {
            subtotal: self.subtotal,
            vat_amount: self.vat_amount,
            total: self.total,
        }
    }
}

/// Fully resolved invoice row, ready to insert.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub customer_id: i32,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub amounts: Amounts,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
}

/// Partial update of an invoice.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoice {
    pub invoice_number: Option<String>,
    pub customer_id: Option<i32>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub total: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
    pub notes: Option<Option<String>>,
}

impl UpdateInvoice {
    pub fn apply_to(&self, invoice: &mut Invoice) {
        if let Some(invoice_number) = &self.invoice_number {
            invoice.invoice_number = invoice_number.clone();
        }
        if let Some(customer_id) = self.customer_id {
            invoice.customer_id = customer_id;
        }
        if let Some(issue_date) = self.issue_date {
            invoice.issue_date = issue_date;
        }
        if let Some(due_date) = self.due_date {
            invoice.due_date = due_date;
        }
        if let Some(subtotal) = self.subtotal {
            invoice.subtotal = subtotal;
        }
        if let Some(vat_amount) = self.vat_amount {
            invoice.vat_amount = vat_amount;
        }
        if let Some(total) = self.total {
            invoice.total = total;
        }
        if let Some(status) = self.status {
            invoice.status = status;
        }
        if let Some(notes) = &self.notes {
            invoice.notes = notes.clone();
        }
    }
}

/// Filter parameters for listing invoices. Date bounds are inclusive and apply
/// to the issue date.
#[derive(Debug, Clone, Default)]
pub struct ListInvoicesFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ListInvoicesFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.status.map_or(true, |s| invoice.status == s)
            && self.customer_id.map_or(true, |c| invoice.customer_id == c)
            && self.start_date.map_or(true, |d| invoice.issue_date >= d)
            && self.end_date.map_or(true, |d| invoice.issue_date <= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in InvoiceStatus::ALL {
            assert_eq!(status.as_str().parse::<InvoiceStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("overdue".parse::<InvoiceStatus>().is_err());
        assert!("PAID".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn filter_bounds_are_inclusive() {
        let invoice = Invoice {
            id: 1,
            invoice_number: "F-2026-0001".to_string(),
            customer_id: 3,
            issue_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            subtotal: Decimal::ZERO,
            vat_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            status: InvoiceStatus::Sent,
            notes: None,
            created_at: Utc::now(),
        };

        let filter = ListInvoicesFilter {
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            ..Default::default()
        };
        assert!(filter.matches(&invoice));

        let filter = ListInvoicesFilter {
            customer_id: Some(4),
            ..Default::default()
        };
        assert!(!filter.matches(&invoice));
    }
}
