//! Services module for invoicing-service.

pub mod assembly;
pub mod database;
pub mod memory;
pub mod metrics;
pub mod numbering;
pub mod reports;
pub mod seed;
pub mod store;

pub use database::PgStore;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use store::InvoiceStore;
