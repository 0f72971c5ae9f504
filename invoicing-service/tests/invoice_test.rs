//! Invoice assembly and lifecycle integration tests for invoicing-service.

mod common;

use axum::http::StatusCode;
use common::{dec, dec_str, ids, TestApp};
use serde_json::{json, Value};
use std::collections::HashSet;

/// Customers 1..=3 plus two consult items (2x and 1x 85 at 21%) for customer 3.
async fn customer_three_with_items(app: &TestApp) -> (i64, Vec<i64>) {
    app.create_customer("Client A").await;
    app.create_customer("Bedrijf B").await;
    let customer = app.create_customer("Customer C").await;
    assert_eq!(customer, 3);

    let a = app
        .create_item(customer, "Consult", json!(2), json!(85), json!(21))
        .await;
    let b = app
        .create_item(customer, "Consult", json!(1), json!(85), json!(21))
        .await;
    (
        customer,
        vec![a["id"].as_i64().unwrap(), b["id"].as_i64().unwrap()],
    )
}

fn invoice_body(customer: i64, item_ids: &[i64]) -> Value {
    json!({
        "customerId": customer,
        "issueDate": "2026-04-01",
        "dueDate": "2026-04-15",
        "itemIds": item_ids,
    })
}

#[tokio::test]
async fn assembling_customer_three_items() {
    let app = TestApp::new();
    let (customer, item_ids) = customer_three_with_items(&app).await;

    let mut body = invoice_body(customer, &item_ids);
    body["subtotal"] = json!(255);
    body["vatAmount"] = json!("53.55");
    body["total"] = json!(308.55);
    let created = app.post("/invoices", body).await;

    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["status"], "draft");
    let id = created.body["id"].as_i64().unwrap();

    let fetched = app.get(&format!("/invoices/{}", id)).await;
    assert_eq!(dec(&fetched.body["subtotal"]), dec_str("255"));
    assert_eq!(dec(&fetched.body["vatAmount"]), dec_str("53.55"));
    assert_eq!(dec(&fetched.body["total"]), dec_str("308.55"));

    let items = app.get(&format!("/invoices/{}/items", id)).await;
    assert_eq!(ids(&items.body), item_ids);
    for item in items.body.as_array().unwrap() {
        assert_eq!(item["invoiceId"].as_i64(), Some(id));
    }

    let unassigned = app.get("/invoice-items/unassigned").await;
    assert!(unassigned.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn omitted_aggregates_are_summed_from_items() {
    let app = TestApp::new();
    let (customer, item_ids) = customer_three_with_items(&app).await;

    let created = app.post("/invoices", invoice_body(customer, &item_ids)).await;

    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(dec(&created.body["subtotal"]), dec_str("255"));
    assert_eq!(dec(&created.body["vatAmount"]), dec_str("53.55"));
    assert_eq!(dec(&created.body["total"]), dec_str("308.55"));
}

#[tokio::test]
async fn partial_aggregates_are_rejected() {
    let app = TestApp::new();
    let (customer, item_ids) = customer_three_with_items(&app).await;
    let mut body = invoice_body(customer, &item_ids);
    body["subtotal"] = json!(255);

    let response = app.post("/invoices", body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let unassigned = app.get("/invoice-items/unassigned").await;
    assert_eq!(unassigned.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn missing_dates_are_rejected() {
    let app = TestApp::new();

    let response = app.post("/invoices", json!({ "customerId": 1 })).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generated_numbers_are_unique() {
    let app = TestApp::new();
    let customer = app.create_customer("Numbers").await;

    let mut numbers = HashSet::new();
    for _ in 0..5 {
        let created = app.post("/invoices", invoice_body(customer, &[])).await;
        assert_eq!(created.status, StatusCode::CREATED);
        let number = created.body["invoiceNumber"].as_str().unwrap().to_string();
        assert!(number.starts_with("F-2026-"));
        numbers.insert(number);
    }

    assert_eq!(numbers.len(), 5);
}

#[tokio::test]
async fn duplicate_manual_number_is_conflict() {
    let app = TestApp::new();
    let customer = app.create_customer("Manual").await;
    let mut body = invoice_body(customer, &[]);
    body["invoiceNumber"] = json!("F-2026-0100");

    assert_eq!(app.post("/invoices", body.clone()).await.status, StatusCode::CREATED);
    assert_eq!(app.post("/invoices", body).await.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn status_has_no_transition_guard() {
    let app = TestApp::new();
    let customer = app.create_customer("Permissive").await;
    let id = app.post("/invoices", invoice_body(customer, &[])).await.body["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/invoices/{}/status", id);

    let paid = app.put(&uri, json!({ "status": "paid" })).await;
    assert_eq!(paid.status, StatusCode::OK);
    assert_eq!(paid.body["status"], "paid");

    let draft = app.put(&uri, json!({ "status": "draft" })).await;
    assert_eq!(draft.status, StatusCode::OK);
    assert_eq!(draft.body["status"], "draft");
}

#[tokio::test]
async fn unknown_status_is_bad_request() {
    let app = TestApp::new();
    let customer = app.create_customer("Strict").await;
    let id = app.post("/invoices", invoice_body(customer, &[])).await.body["id"]
        .as_i64()
        .unwrap();

    let response = app
        .put(&format!("/invoices/{}/status", id), json!({ "status": "overdue" }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_of_missing_invoice_is_not_found() {
    let app = TestApp::new();

    let response = app.put("/invoices/9/status", json!({ "status": "sent" })).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn assign_items_to_existing_invoice() {
    let app = TestApp::new();
    let (customer, item_ids) = customer_three_with_items(&app).await;
    let id = app.post("/invoices", invoice_body(customer, &[])).await.body["id"]
        .as_i64()
        .unwrap();

    let response = app
        .post(
            &format!("/invoices/{}/items", id),
            json!({ "itemIds": [item_ids[0], 999] }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Items assigned to invoice successfully");

    let items = app.get(&format!("/invoices/{}/items", id)).await;
    assert_eq!(ids(&items.body), vec![item_ids[0]]);
    let unassigned = app.get("/invoice-items/unassigned").await;
    assert_eq!(ids(&unassigned.body), vec![item_ids[1]]);
}

#[tokio::test]
async fn assign_to_missing_invoice_changes_nothing() {
    let app = TestApp::new();
    let (_, item_ids) = customer_three_with_items(&app).await;

    let response = app
        .post("/invoices/77/items", json!({ "itemIds": item_ids }))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let unassigned = app.get("/invoice-items/unassigned").await;
    assert_eq!(unassigned.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn delete_invoice_does_not_cascade() {
    let app = TestApp::new();
    let (customer, item_ids) = customer_three_with_items(&app).await;
    let id = app.post("/invoices", invoice_body(customer, &item_ids)).await.body["id"]
        .as_i64()
        .unwrap();

    assert_eq!(
        app.delete(&format!("/invoices/{}", id)).await.status,
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        app.delete(&format!("/invoices/{}", id)).await.status,
        StatusCode::NOT_FOUND
    );

    let item = app.get(&format!("/invoice-items/{}", item_ids[0])).await;
    assert_eq!(item.status, StatusCode::OK);
    assert_eq!(item.body["invoiceId"].as_i64(), Some(id));
}

#[tokio::test]
async fn aggregates_are_a_snapshot() {
    let app = TestApp::new();
    let (customer, item_ids) = customer_three_with_items(&app).await;
    let id = app.post("/invoices", invoice_body(customer, &item_ids)).await.body["id"]
        .as_i64()
        .unwrap();

    app.put(
        &format!("/invoice-items/{}", item_ids[0]),
        json!({ "quantity": 10 }),
    )
    .await;

    let invoice = app.get(&format!("/invoices/{}", id)).await;
    assert_eq!(dec(&invoice.body["total"]), dec_str("308.55"));
}

#[tokio::test]
async fn update_invoice_fields() {
    let app = TestApp::new();
    let customer = app.create_customer("Editable").await;
    let mut body = invoice_body(customer, &[]);
    body["notes"] = json!("Thanks!");
    let id = app.post("/invoices", body).await.body["id"].as_i64().unwrap();

    let updated = app
        .put(
            &format!("/invoices/{}", id),
            json!({ "dueDate": "2026-05-01", "notes": null, "status": "sent" }),
        )
        .await;

    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["dueDate"], "2026-05-01");
    assert_eq!(updated.body["issueDate"], "2026-04-01");
    assert_eq!(updated.body["status"], "sent");
    assert!(updated.body["notes"].is_null());
}

#[tokio::test]
async fn list_filters_by_status_customer_and_dates() {
    let app = TestApp::new();
    let first = app.create_customer("First").await;
    let second = app.create_customer("Second").await;

    let mut early = invoice_body(first, &[]);
    early["issueDate"] = json!("2026-01-10");
    early["status"] = json!("paid");
    app.post("/invoices", early).await;

    let mut late = invoice_body(second, &[]);
    late["issueDate"] = json!("2026-03-10");
    app.post("/invoices", late).await;

    let paid = app.get("/invoices?status=paid").await;
    assert_eq!(paid.body.as_array().unwrap().len(), 1);

    let by_customer = app.get(&format!("/invoices?customerId={}", second)).await;
    assert_eq!(by_customer.body.as_array().unwrap().len(), 1);
    assert_eq!(by_customer.body[0]["customerId"].as_i64(), Some(second));

    let ranged = app
        .get("/invoices?startDate=2026-01-01&endDate=2026-01-10")
        .await;
    assert_eq!(ranged.body.as_array().unwrap().len(), 1);

    let all = app.get("/invoices").await;
    assert_eq!(all.body.as_array().unwrap().len(), 2);

    let invalid = app.get("/invoices?status=void").await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invoices_by_customer() {
    let app = TestApp::new();
    let customer = app.create_customer("Owner").await;
    app.post("/invoices", invoice_body(customer, &[])).await;

    let found = app.get(&format!("/invoices/customer/{}", customer)).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body.as_array().unwrap().len(), 1);

    let missing = app.get("/invoices/customer/404").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repeated_item_id_counts_once() {
    let app = TestApp::new();
    let (customer, item_ids) = customer_three_with_items(&app).await;

    let created = app
        .post("/invoices", invoice_body(customer, &[item_ids[0], item_ids[0]]))
        .await;

    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(dec(&created.body["subtotal"]), dec_str("170"));
    assert_eq!(dec(&created.body["vatAmount"]), dec_str("35.70"));
    assert_eq!(dec(&created.body["total"]), dec_str("205.70"));

    let id = created.body["id"].as_i64().unwrap();
    let items = app.get(&format!("/invoices/{}/items", id)).await;
    assert_eq!(ids(&items.body), vec![item_ids[0]]);
}
