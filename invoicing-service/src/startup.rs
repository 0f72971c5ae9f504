//! Application startup and lifecycle management.

use crate::config::{InvoicingConfig, StoreBackend};
use crate::handlers::{customers, health, invoice_items, invoices, rates, reports};
use crate::services::metrics::metrics_middleware;
use crate::services::seed::seed_sample_data;
use crate::services::{init_metrics, InvoiceStore, MemoryStore, PgStore};
use axum::{
    extract::Request,
    middleware,
    routing::{get, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::tracing::{request_id_middleware, RequestId};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<InvoicingConfig>,
    pub store: Arc<dyn InvoiceStore>,
}

/// Build the HTTP router over the given state.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            "/customers/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route("/rates", get(rates::list_rates).post(rates::create_rate))
        .route("/rates/code/:code", get(rates::get_rate_by_code))
        .route(
            "/rates/:id",
            get(rates::get_rate)
                .put(rates::update_rate)
                .delete(rates::delete_rate),
        )
        .route(
            "/invoice-items",
            get(invoice_items::list_items).post(invoice_items::create_item),
        )
        .route(
            "/invoice-items/unassigned",
            get(invoice_items::list_unassigned_items),
        )
        .route(
            "/invoice-items/customer/:id",
            get(invoice_items::list_items_by_customer),
        )
        .route(
            "/invoice-items/:id",
            get(invoice_items::get_item)
                .put(invoice_items::update_item)
                .delete(invoice_items::delete_item),
        )
        .route(
            "/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route(
            "/invoices/customer/:id",
            get(invoices::list_invoices_by_customer),
        )
        .route(
            "/invoices/:id",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route(
            "/invoices/:id/items",
            get(invoices::list_invoice_items).post(invoices::assign_items),
        )
        .route("/invoices/:id/status", put(invoices::update_invoice_status))
        .route("/reports/dashboard", get(reports::dashboard))
        .route("/reports/overview", get(reports::overview));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_handler))
        .merge(api)
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    let request_id = req
                        .extensions()
                        .get::<RequestId>()
                        .map(|id| id.0.as_str())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id = %request_id,
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Open the configured store, running migrations for PostgreSQL.
async fn open_store(config: &InvoicingConfig) -> Result<Arc<dyn InvoiceStore>, AppError> {
    match config.store {
        StoreBackend::Postgres => {
            let url = config.database.url.as_deref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
            })?;
            let db = PgStore::connect(
                url,
                config.database.max_connections,
                config.database.min_connections,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                e
            })?;

            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;

            Ok(Arc::new(db))
        }
        StoreBackend::Memory => {
            tracing::info!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: InvoicingConfig) -> Result<Self, AppError> {
        let store = open_store(&config).await?;
        Self::build_with_store(config, store).await
    }

    /// Build the application over an already opened store.
    pub async fn build_with_store(
        config: InvoicingConfig,
        store: Arc<dyn InvoiceStore>,
    ) -> Result<Self, AppError> {
        init_metrics();

        if config.seed_sample_data {
            seed_sample_data(store.as_ref()).await.map_err(|e| {
                tracing::error!(error = %e, "Failed to seed sample data");
                e
            })?;
        }

        let addr = config.common.socket_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Invoicing service listener bound");

        Ok(Self {
            port,
            listener,
            state: AppState {
                config: Arc::new(config),
                store,
            },
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        tracing::info!(
            service = "invoicing-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "HTTP server error");
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
