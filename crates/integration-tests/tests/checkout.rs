//! Integration tests for checkout and order history.

use reqwest::StatusCode;
use serde_json::{Value, json};

use restcrud_api::error::EMPTY_CART;
use restcrud_integration_tests::{TestApp, add_to_cart, body};

async fn checkout(app: &TestApp, client: &reqwest::Client) -> reqwest::Response {
    client
        .post(app.url("/api/orders"))
        .send()
        .await
        .expect("Failed to check out")
}

#[tokio::test]
async fn test_checkout_snapshots_cart() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let novel = app.create_product(&category, "Novel", "10.00", 0).await;
    let pen = app.create_product(&category, "Pen", "5.00", 0).await;
    let alice = app.login_as("alice").await;
    add_to_cart(&app, &alice, &novel, 2).await;
    add_to_cart(&app, &alice, &pen, 1).await;

    let resp = checkout(&app, &alice).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order = body(resp).await;

    assert_eq!(order["total_amount"], "25.00");
    assert_eq!(order["user"]["username"], "alice");
    let items = &order["items"];
    assert_eq!(items.as_array().map(Vec::len), Some(2));
    assert_eq!(items[0]["product"]["id"], novel["id"]);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["unit_price"], "10.00");
    assert_eq!(items[1]["product"]["id"], pen["id"]);
    assert_eq!(items[1]["quantity"], 1);
    assert_eq!(items[1]["unit_price"], "5.00");

    // Stock may go negative
    assert_eq!(app.product(&novel).await["stock"], -2);
    assert_eq!(app.product(&pen).await["stock"], -1);

    let resp = alice.get(app.url("/api/cart")).send().await.expect("cart");
    assert_eq!(body(resp).await, json!([]));
}

#[tokio::test]
async fn test_duplicate_lines_become_separate_items() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let novel = app.create_product(&category, "Novel", "2.00", 10).await;
    let alice = app.login_as("alice").await;
    add_to_cart(&app, &alice, &novel, 1).await;
    add_to_cart(&app, &alice, &novel, 3).await;

    let resp = checkout(&app, &alice).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order = body(resp).await;

    let items = &order["items"];
    assert_eq!(items.as_array().map(Vec::len), Some(2));
    assert_eq!(items[0]["quantity"], 1);
    assert_eq!(items[1]["quantity"], 3);
    assert_eq!(order["total_amount"], "8.00");
    assert_eq!(app.product(&novel).await["stock"], 6);
}

#[tokio::test]
async fn test_oversized_total_is_rejected() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Boats").await;
    let yacht = app.create_product(&category, "Yacht", "99999999.99", 1).await;
    let alice = app.login_as("alice").await;
    add_to_cart(&app, &alice, &yacht, 101).await;

    let resp = checkout(&app, &alice).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body(resp).await["detail"].is_string());

    // Nothing was written
    assert_eq!(app.product(&yacht).await["stock"], 1);
    let resp = alice.get(app.url("/api/cart")).send().await.expect("cart");
    assert_eq!(body(resp).await.as_array().map(Vec::len), Some(1));
    let resp = alice.get(app.url("/api/orders")).send().await.expect("orders");
    assert_eq!(body(resp).await, json!([]));
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let app = TestApp::spawn().await;
    let alice = app.login_as("alice").await;

    let resp = checkout(&app, &alice).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(resp).await, json!([EMPTY_CART]));

    let resp = alice.get(app.url("/api/orders")).send().await.expect("orders");
    assert_eq!(body(resp).await, json!([]));
}

#[tokio::test]
async fn test_order_keeps_price_paid() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let novel = app.create_product(&category, "Novel", "10.00", 5).await;
    let alice = app.login_as("alice").await;
    add_to_cart(&app, &alice, &novel, 1).await;
    let order = body(checkout(&app, &alice).await).await;

    let resp = TestApp::client()
        .patch(app.url(&format!("/api/products/{}", novel["id"])))
        .json(&json!({ "price": "99.00" }))
        .send()
        .await
        .expect("patch");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = alice
        .get(app.url(&format!("/api/orders/{}", order["id"])))
        .send()
        .await
        .expect("order");
    let order = body(resp).await;
    assert_eq!(order["items"][0]["unit_price"], "10.00");
    assert_eq!(order["items"][0]["product"]["price"], "99.00");
    assert_eq!(order["total_amount"], "10.00");
}

#[tokio::test]
async fn test_ordered_product_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let novel = app.create_product(&category, "Novel", "10.00", 5).await;
    let alice = app.login_as("alice").await;
    add_to_cart(&app, &alice, &novel, 1).await;
    checkout(&app, &alice).await;

    let resp = TestApp::client()
        .delete(app.url(&format!("/api/products/{}", novel["id"])))
        .send()
        .await
        .expect("delete");

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_orders_are_private() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let novel = app.create_product(&category, "Novel", "10.00", 5).await;
    let alice = app.login_as("alice").await;
    let bob = app.login_as("bob").await;
    add_to_cart(&app, &alice, &novel, 1).await;
    let order = body(checkout(&app, &alice).await).await;

    let resp = bob.get(app.url("/api/orders")).send().await.expect("orders");
    assert_eq!(body(resp).await, json!([]));

    let resp = bob
        .get(app.url(&format!("/api/orders/{}", order["id"])))
        .send()
        .await
        .expect("order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = alice.get(app.url("/api/orders")).send().await.expect("orders");
    let orders: Vec<Value> = serde_json::from_value(body(resp).await).expect("list");
    assert_eq!(orders, vec![order]);
}

#[tokio::test]
async fn test_concurrent_checkouts_create_one_order() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let novel = app.create_product(&category, "Novel", "10.00", 3).await;
    let alice = app.login_as("alice").await;
    add_to_cart(&app, &alice, &novel, 2).await;

    let (first, second) = tokio::join!(checkout(&app, &alice), checkout(&app, &alice));
    let mut statuses = [first.status(), second.status()];
    statuses.sort();

    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    assert_eq!(app.product(&novel).await["stock"], 1);

    let resp = alice.get(app.url("/api/orders")).send().await.expect("orders");
    assert_eq!(body(resp).await.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_checkout_requires_login() {
    let app = TestApp::spawn().await;

    let resp = checkout(&app, &TestApp::client()).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
