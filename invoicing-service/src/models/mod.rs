//! Domain models for invoicing-service.

mod amounts;
mod customer;
mod invoice;
mod invoice_item;
mod rate;

pub use amounts::{recompute_if_needed, try_sum_decimals, AmountOverflow, Amounts};
pub use customer::{CreateCustomer, Customer, UpdateCustomer};
pub use invoice::{
    Invoice, InvoiceStatus, ListInvoicesFilter, NewInvoice, ParseInvoiceStatusError,
    UpdateInvoice,
};
pub use invoice_item::{CreateInvoiceItem, InvoiceItem, UpdateInvoiceItem};
pub use rate::{CreateRate, Rate, UpdateRate};
