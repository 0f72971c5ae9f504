//! PostgreSQL store for invoicing-service.

use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{info, instrument};

use super::metrics::DB_QUERY_DURATION;
use super::store::InvoiceStore;
use crate::models::{
    CreateCustomer, CreateInvoiceItem, CreateRate, Customer, Invoice, InvoiceItem, InvoiceStatus,
    ListInvoicesFilter, NewInvoice, Rate, UpdateCustomer, UpdateInvoice, UpdateInvoiceItem,
    UpdateRate,
};

const CUSTOMER_COLUMNS: &str = "id, name, email, address, phone_number";
const RATE_COLUMNS: &str =
    "id, code, description, amount, period, vat_rate, default_quantity, created_at";
const ITEM_COLUMNS: &str = "id, invoice_id, customer_id, rate_id, description, quantity, \
     unit_price, vat_rate, subtotal, vat_amount, total, created_at";
const INVOICE_COLUMNS: &str = "id, invoice_number, customer_id, issue_date, due_date, subtotal, \
     vat_amount, total, status, notes, created_at";

/// Map a write error, turning unique violations into a conflict.
fn write_error(e: sqlx::Error, what: &str, conflict: impl FnOnce() -> String) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(anyhow::anyhow!(conflict()))
        }
        _ => AppError::DatabaseError(anyhow::anyhow!("Failed to {}: {}", what, e)),
    }
}

fn read_error(what: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |e| AppError::DatabaseError(anyhow::anyhow!("Failed to {}: {}", what, e))
}

/// Store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "invoicing-service"))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, AppError> {
        self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })
    }

    async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), AppError> {
        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })
    }

    async fn delete_by_id(&self, table: &str, id: i32, operation: &str) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[operation])
            .start_timer();

        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(read_error(operation))?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(table = table, id = id, "Row deleted");
        }
        Ok(deleted)
    }

    async fn assign_in_tx(
        tx: &mut Transaction<'static, Postgres>,
        invoice_id: i32,
        item_ids: &[i32],
    ) -> Result<u64, AppError> {
        if item_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("UPDATE invoice_items SET invoice_id = $1 WHERE id = ANY($2)")
            .bind(invoice_id)
            .bind(item_ids)
            .execute(&mut **tx)
            .await
            .map_err(read_error("assign items"))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl InvoiceStore for PgStore {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Customer Operations
    // -------------------------------------------------------------------------

    async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers ORDER BY id",
            CUSTOMER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("list customers"))?;

        timer.observe_duration();
        Ok(customers)
    }

    #[instrument(skip(self))]
    async fn get_customer(&self, id: i32) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_error("get customer"))?;

        timer.observe_duration();
        Ok(customer)
    }

    #[instrument(skip(self, input))]
    async fn create_customer(&self, input: &CreateCustomer) -> Result<Customer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (name, email, address, phone_number)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.phone_number)
        .fetch_one(&self.pool)
        .await
        .map_err(read_error("create customer"))?;

        timer.observe_duration();

        info!(customer_id = customer.id, "Customer created");

        Ok(customer)
    }

    #[instrument(skip(self, patch))]
    async fn update_customer(
        &self,
        id: i32,
        patch: &UpdateCustomer,
    ) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_customer"])
            .start_timer();

        let mut tx = self.begin().await?;
        let existing = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = $1 FOR UPDATE",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(read_error("get customer"))?;

        let Some(mut customer) = existing else {
            tx.rollback().await.ok();
            return Ok(None);
        };
        patch.apply_to(&mut customer);

        sqlx::query(
            "UPDATE customers SET name = $2, email = $3, address = $4, phone_number = $5 WHERE id = $1",
        )
        .bind(id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.phone_number)
        .execute(&mut *tx)
        .await
        .map_err(read_error("update customer"))?;

        Self::commit(tx).await?;
        timer.observe_duration();

        info!(customer_id = id, "Customer updated");

        Ok(Some(customer))
    }

    async fn delete_customer(&self, id: i32) -> Result<bool, AppError> {
        self.delete_by_id("customers", id, "delete_customer").await
    }

    // -------------------------------------------------------------------------
    // Rate Operations
    // -------------------------------------------------------------------------

    async fn list_rates(&self) -> Result<Vec<Rate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_rates"])
            .start_timer();

        let rates = sqlx::query_as::<_, Rate>(&format!(
            "SELECT {} FROM rates ORDER BY id",
            RATE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("list rates"))?;

        timer.observe_duration();
        Ok(rates)
    }

    #[instrument(skip(self))]
    async fn get_rate(&self, id: i32) -> Result<Option<Rate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_rate"])
            .start_timer();

        let rate = sqlx::query_as::<_, Rate>(&format!(
            "SELECT {} FROM rates WHERE id = $1",
            RATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_error("get rate"))?;

        timer.observe_duration();
        Ok(rate)
    }

    #[instrument(skip(self))]
    async fn get_rate_by_code(&self, code: &str) -> Result<Option<Rate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_rate_by_code"])
            .start_timer();

        let rate = sqlx::query_as::<_, Rate>(&format!(
            "SELECT {} FROM rates WHERE code = $1",
            RATE_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_error("get rate"))?;

        timer.observe_duration();
        Ok(rate)
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    async fn create_rate(&self, input: &CreateRate) -> Result<Rate, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_rate"])
            .start_timer();

        let rate = sqlx::query_as::<_, Rate>(&format!(
            r#"
            INSERT INTO rates (code, description, amount, period, vat_rate, default_quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            RATE_COLUMNS
        ))
        .bind(&input.code)
        .bind(&input.description)
        .bind(input.amount)
        .bind(&input.period)
        .bind(input.vat_rate)
        .bind(input.default_quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            write_error(e, "create rate", || {
                format!("Rate code '{}' already exists", input.code)
            })
        })?;

        timer.observe_duration();

        info!(rate_id = rate.id, code = %rate.code, "Rate created");

        Ok(rate)
    }

    #[instrument(skip(self, patch))]
    async fn update_rate(&self, id: i32, patch: &UpdateRate) -> Result<Option<Rate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_rate"])
            .start_timer();

        let mut tx = self.begin().await?;
        let existing = sqlx::query_as::<_, Rate>(&format!(
            "SELECT {} FROM rates WHERE id = $1 FOR UPDATE",
            RATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(read_error("get rate"))?;

        let Some(mut rate) = existing else {
            tx.rollback().await.ok();
            return Ok(None);
        };
        patch.apply_to(&mut rate);

        sqlx::query(
            r#"
            UPDATE rates
            SET code = $2, description = $3, amount = $4, period = $5, vat_rate = $6,
                default_quantity = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&rate.code)
        .bind(&rate.description)
        .bind(rate.amount)
        .bind(&rate.period)
        .bind(rate.vat_rate)
        .bind(rate.default_quantity)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            write_error(e, "update rate", || {
                format!("Rate code '{}' already exists", rate.code)
            })
        })?;

        Self::commit(tx).await?;
        timer.observe_duration();

        info!(rate_id = id, "Rate updated");

        Ok(Some(rate))
    }

    async fn delete_rate(&self, id: i32) -> Result<bool, AppError> {
        self.delete_by_id("rates", id, "delete_rate").await
    }

    // -------------------------------------------------------------------------
    // Invoice Item Operations
    // -------------------------------------------------------------------------

    async fn list_items(&self) -> Result<Vec<InvoiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_items"])
            .start_timer();

        let items = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {} FROM invoice_items ORDER BY id",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("list invoice items"))?;

        timer.observe_duration();
        Ok(items)
    }

    async fn list_unassigned_items(&self) -> Result<Vec<InvoiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_unassigned_items"])
            .start_timer();

        let items = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {} FROM invoice_items WHERE invoice_id IS NULL ORDER BY id",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("list unassigned items"))?;

        timer.observe_duration();
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn list_items_by_customer(
        &self,
        customer_id: i32,
    ) -> Result<Vec<InvoiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_items_by_customer"])
            .start_timer();

        let items = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {} FROM invoice_items WHERE customer_id = $1 ORDER BY id",
            ITEM_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("list items by customer"))?;

        timer.observe_duration();
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn list_items_by_invoice(&self, invoice_id: i32) -> Result<Vec<InvoiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_items_by_invoice"])
            .start_timer();

        let items = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {} FROM invoice_items WHERE invoice_id = $1 ORDER BY id",
            ITEM_COLUMNS
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("list items by invoice"))?;

        timer.observe_duration();
        Ok(items)
    }

    async fn get_items_by_ids(&self, ids: &[i32]) -> Result<Vec<InvoiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_items_by_ids"])
            .start_timer();

        let items = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {} FROM invoice_items WHERE id = ANY($1) ORDER BY id",
            ITEM_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("get items"))?;

        timer.observe_duration();
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn get_item(&self, id: i32) -> Result<Option<InvoiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_item"])
            .start_timer();

        let item = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {} FROM invoice_items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_error("get invoice item"))?;

        timer.observe_duration();
        Ok(item)
    }

    #[instrument(skip(self, input), fields(customer_id = input.customer_id))]
    async fn create_item(&self, input: &CreateInvoiceItem) -> Result<InvoiceItem, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_item"])
            .start_timer();

        let amounts = input.amounts()?;
        let item = sqlx::query_as::<_, InvoiceItem>(&format!(
            r#"
            INSERT INTO invoice_items (
                invoice_id, customer_id, rate_id, description, quantity, unit_price, vat_rate,
                subtotal, vat_amount, total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(input.invoice_id)
        .bind(input.customer_id)
        .bind(input.rate_id)
        .bind(&input.description)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(input.vat_rate)
        .bind(amounts.subtotal)
        .bind(amounts.vat_amount)
        .bind(amounts.total)
        .fetch_one(&self.pool)
        .await
        .map_err(read_error("create invoice item"))?;

        timer.observe_duration();

        info!(item_id = item.id, total = %item.total, "Invoice item created");

        Ok(item)
    }

    #[instrument(skip(self, patch))]
    async fn update_item(
        &self,
        id: i32,
        patch: &UpdateInvoiceItem,
    ) -> Result<Option<InvoiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_item"])
            .start_timer();

        let mut tx = self.begin().await?;
        let existing = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {} FROM invoice_items WHERE id = $1 FOR UPDATE",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(read_error("get invoice item"))?;

        let Some(mut item) = existing else {
            tx.rollback().await.ok();
            return Ok(None);
        };
        patch.apply_to(&mut item)?;

        sqlx::query(
            r#"
            UPDATE invoice_items
            SET invoice_id = $2, customer_id = $3, rate_id = $4, description = $5,
                quantity = $6, unit_price = $7, vat_rate = $8,
                subtotal = $9, vat_amount = $10, total = $11
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(item.invoice_id)
        .bind(item.customer_id)
        .bind(item.rate_id)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.vat_rate)
        .bind(item.subtotal)
        .bind(item.vat_amount)
        .bind(item.total)
        .execute(&mut *tx)
        .await
        .map_err(read_error("update invoice item"))?;

        Self::commit(tx).await?;
        timer.observe_duration();

        info!(item_id = id, total = %item.total, "Invoice item updated");

        Ok(Some(item))
    }

    async fn delete_item(&self, id: i32) -> Result<bool, AppError> {
        self.delete_by_id("invoice_items", id, "delete_item").await
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::int IS NULL OR customer_id = $2)
              AND ($3::date IS NULL OR issue_date >= $3)
              AND ($4::date IS NULL OR issue_date <= $4)
            ORDER BY id
            "#,
            INVOICE_COLUMNS
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.customer_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("list invoices"))?;

        timer.observe_duration();
        Ok(invoices)
    }

    #[instrument(skip(self))]
    async fn get_invoice(&self, id: i32) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE id = $1",
            INVOICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_error("get invoice"))?;

        timer.observe_duration();
        Ok(invoice)
    }

    async fn invoice_number_exists(&self, invoice_number: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM invoices WHERE invoice_number = $1)",
        )
        .bind(invoice_number)
        .fetch_one(&self.pool)
        .await
        .map_err(read_error("check invoice number"))
    }

    async fn next_invoice_sequence(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT nextval('invoice_number_seq')")
            .fetch_one(&self.pool)
            .await
            .map_err(read_error("advance invoice number sequence"))
    }

    #[instrument(skip(self, input, item_ids), fields(invoice_number = %input.invoice_number))]
    async fn create_invoice(
        &self,
        input: &NewInvoice,
        item_ids: &[i32],
    ) -> Result<(Invoice, u64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let mut tx = self.begin().await?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (
                invoice_number, customer_id, issue_date, due_date, subtotal, vat_amount, total,
                status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(&input.invoice_number)
        .bind(input.customer_id)
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(input.amounts.subtotal)
        .bind(input.amounts.vat_amount)
        .bind(input.amounts.total)
        .bind(input.status.as_str())
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            write_error(e, "create invoice", || {
                format!("Invoice number '{}' already exists", input.invoice_number)
            })
        })?;

        let assigned = Self::assign_in_tx(&mut tx, invoice.id, item_ids).await?;

        Self::commit(tx).await?;
        timer.observe_duration();

        info!(
            invoice_id = invoice.id,
            invoice_number = %invoice.invoice_number,
            assigned = assigned,
            total = %invoice.total,
            "Invoice created"
        );

        Ok((invoice, assigned))
    }

    #[instrument(skip(self, item_ids), fields(item_count = item_ids.len()))]
    async fn assign_items_to_invoice(
        &self,
        invoice_id: i32,
        item_ids: &[i32],
    ) -> Result<Option<u64>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["assign_items"])
            .start_timer();

        let mut tx = self.begin().await?;

        let exists = sqlx::query_scalar::<_, i32>("SELECT id FROM invoices WHERE id = $1 FOR SHARE")
            .bind(invoice_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(read_error("get invoice"))?;

        if exists.is_none() {
            tx.rollback().await.ok();
            return Ok(None);
        }

        let assigned = Self::assign_in_tx(&mut tx, invoice_id, item_ids).await?;

        Self::commit(tx).await?;
        timer.observe_duration();

        info!(invoice_id = invoice_id, assigned = assigned, "Items assigned to invoice");

        Ok(Some(assigned))
    }

    #[instrument(skip(self, patch))]
    async fn update_invoice(
        &self,
        id: i32,
        patch: &UpdateInvoice,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let mut tx = self.begin().await?;
        let existing = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE id = $1 FOR UPDATE",
            INVOICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(read_error("get invoice"))?;

        let Some(mut invoice) = existing else {
            tx.rollback().await.ok();
            return Ok(None);
        };
        patch.apply_to(&mut invoice);

        sqlx::query(
            r#"
            UPDATE invoices
            SET invoice_number = $2, customer_id = $3, issue_date = $4, due_date = $5,
                subtotal = $6, vat_amount = $7, total = $8, status = $9, notes = $10
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&invoice.invoice_number)
        .bind(invoice.customer_id)
        .bind(invoice.issue_date)
        .bind(invoice.due_date)
        .bind(invoice.subtotal)
        .bind(invoice.vat_amount)
        .bind(invoice.total)
        .bind(invoice.status.as_str())
        .bind(&invoice.notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            write_error(e, "update invoice", || {
                format!("Invoice number '{}' already exists", invoice.invoice_number)
            })
        })?;

        Self::commit(tx).await?;
        timer.observe_duration();

        info!(invoice_id = id, "Invoice updated");

        Ok(Some(invoice))
    }

    #[instrument(skip(self))]
    async fn update_invoice_status(
        &self,
        id: i32,
        status: InvoiceStatus,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice_status"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "UPDATE invoices SET status = $2 WHERE id = $1 RETURNING {}",
            INVOICE_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(read_error("update invoice status"))?;

        timer.observe_duration();

        if invoice.is_some() {
            info!(invoice_id = id, status = %status, "Invoice status updated");
        }

        Ok(invoice)
    }

    async fn delete_invoice(&self, id: i32) -> Result<bool, AppError> {
        self.delete_by_id("invoices", id, "delete_invoice").await
    }
}
