//! Integration tests for the per-user cart.

use reqwest::StatusCode;
use serde_json::json;

use restcrud_api::error::PRODUCT_NOT_FOUND;
use restcrud_integration_tests::{TestApp, add_to_cart, body};

#[tokio::test]
async fn test_cart_requires_login() {
    let app = TestApp::spawn().await;

    let resp = TestApp::client()
        .get(app.url("/api/cart"))
        .send()
        .await
        .expect("get");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(body(resp).await.get("detail").is_some());
}

#[tokio::test]
async fn test_add_update_and_remove_line() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let product = app.create_product(&category, "Novel", "10.00", 5).await;
    let alice = app.login_as("alice").await;

    let resp = add_to_cart(&app, &alice, &product, 2).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let line = body(resp).await;
    assert_eq!(line["quantity"], 2);
    assert_eq!(line["product"], product);
    assert_eq!(line["user"]["username"], "alice");

    let url = app.url(&format!("/api/cart/{}", line["id"]));
    let resp = alice
        .patch(&url)
        .json(&json!({ "quantity": 4 }))
        .send()
        .await
        .expect("patch");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body(resp).await["quantity"], 4);

    let resp = alice.delete(&url).send().await.expect("delete");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = alice.get(app.url("/api/cart")).send().await.expect("list");
    assert_eq!(body(resp).await, json!([]));
}

#[tokio::test]
async fn test_quantity_defaults_to_one() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let product = app.create_product(&category, "Novel", "10.00", 5).await;
    let alice = app.login_as("alice").await;

    let resp = alice
        .post(app.url("/api/cart"))
        .json(&json!({ "product_id": product["id"] }))
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body(resp).await["quantity"], 1);
}

#[tokio::test]
async fn test_invalid_lines_are_rejected() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let product = app.create_product(&category, "Novel", "10.00", 5).await;
    let alice = app.login_as("alice").await;

    let resp = add_to_cart(&app, &alice, &product, 0).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body(resp).await.get("quantity").is_some());

    let resp = add_to_cart(&app, &alice, &json!({ "id": 999 }), 1).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(resp).await, json!({ "product_id": PRODUCT_NOT_FOUND }));

    let resp = alice.get(app.url("/api/cart")).send().await.expect("list");
    assert_eq!(body(resp).await, json!([]));
}

#[tokio::test]
async fn test_other_users_lines_are_invisible() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let product = app.create_product(&category, "Novel", "10.00", 5).await;
    let alice = app.login_as("alice").await;
    let bob = app.login_as("bob").await;

    let line = body(add_to_cart(&app, &alice, &product, 1).await).await;
    let url = app.url(&format!("/api/cart/{}", line["id"]));

    let resp = bob.get(app.url("/api/cart")).send().await.expect("list");
    assert_eq!(body(resp).await, json!([]));

    let resp = bob.get(&url).send().await.expect("get");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = bob
        .put(&url)
        .json(&json!({ "quantity": 9 }))
        .send()
        .await
        .expect("put");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = bob.delete(&url).send().await.expect("delete");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Alice's line is untouched
    let resp = alice.get(&url).send().await.expect("get");
    assert_eq!(body(resp).await["quantity"], 1);
}

#[tokio::test]
async fn test_deleting_product_removes_cart_lines() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let product = app.create_product(&category, "Novel", "10.00", 5).await;
    let alice = app.login_as("alice").await;
    add_to_cart(&app, &alice, &product, 1).await;

    let resp = TestApp::client()
        .delete(app.url(&format!("/api/products/{}", product["id"])))
        .send()
        .await
        .expect("delete");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = alice.get(app.url("/api/cart")).send().await.expect("list");
    assert_eq!(body(resp).await, json!([]));
}
