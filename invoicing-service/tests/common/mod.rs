//! Common test utilities for invoicing-service integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use invoicing_service::config::InvoicingConfig;
use invoicing_service::services::{init_metrics, InvoiceStore, MemoryStore};
use invoicing_service::startup::{build_router, AppState};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::{Arc, Once};
use tower::util::ServiceExt;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,invoicing_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Router over a fresh in-memory store, driven without a network listener.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

/// Response status, headers and JSON body (`Value::Null` when empty).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        init_tracing();
        init_metrics();

        let store = Arc::new(MemoryStore::new());
        let state = AppState {
            config: Arc::new(InvoicingConfig::for_memory()),
            store: store.clone() as Arc<dyn InvoiceStore>,
        };

        Self {
            router: build_router(state),
            store,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Create a customer and return its id.
    pub async fn create_customer(&self, name: &str) -> i64 {
        let response = self
            .post(
                "/customers",
                json!({
                    "name": name,
                    "email": format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_i64().unwrap()
    }

    /// Create an unassigned item and return the created record.
    pub async fn create_item(
        &self,
        customer_id: i64,
        description: &str,
        quantity: Value,
        unit_price: Value,
        vat_rate: Value,
    ) -> Value {
        let response = self
            .post(
                "/invoice-items",
                json!({
                    "customerId": customer_id,
                    "description": description,
                    "quantity": quantity,
                    "unitPrice": unit_price,
                    "vatRate": vat_rate,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }
}

/// Read a decimal field, whichever JSON representation it came in.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {}", other),
    }
}

pub fn dec_str(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn ids(items: &Value) -> Vec<i64> {
    let mut ids: Vec<i64> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect();
    ids.sort();
    ids
}
