//! Integration tests for the category and product catalog.

use reqwest::StatusCode;
use serde_json::json;

use restcrud_api::error::CATEGORY_NOT_FOUND;
use restcrud_integration_tests::{TestApp, body};

// ============================================================================
// Categories
// ============================================================================

#[tokio::test]
async fn test_category_crud() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let created = app.create_category("Books").await;
    assert_eq!(created["name"], "Books");
    assert_eq!(created["description"], json!(null));

    let url = app.url(&format!("/api/categories/{}", created["id"]));
    let resp = client
        .patch(&url)
        .json(&json!({ "description": "Printed" }))
        .send()
        .await
        .expect("patch");
    assert_eq!(resp.status(), StatusCode::OK);
    let patched = body(resp).await;
    assert_eq!(patched["name"], "Books");
    assert_eq!(patched["description"], "Printed");

    let resp = client.delete(&url).send().await.expect("delete");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client.get(&url).send().await.expect("get");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_requires_name() {
    let app = TestApp::spawn().await;

    let resp = TestApp::client()
        .post(app.url("/api/categories"))
        .json(&json!({ "description": "no name" }))
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let errors = body(resp).await;
    assert!(errors.get("name").is_some(), "{errors}");
}

#[tokio::test]
async fn test_category_with_products_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    app.create_product(&category, "Novel", "12.50", 3).await;

    let resp = TestApp::client()
        .delete(app.url(&format!("/api/categories/{}", category["id"])))
        .send()
        .await
        .expect("delete");

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_product_embeds_category() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;

    let product = app.create_product(&category, "Novel", "12.5", 3).await;

    assert_eq!(product["price"], "12.50");
    assert_eq!(product["stock"], 3);
    assert_eq!(product["description"], "");
    assert_eq!(product["category"], category);
}

#[tokio::test]
async fn test_product_validation_reports_every_field() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;

    let resp = TestApp::client()
        .post(app.url("/api/products"))
        .json(&json!({
            "name": "  ",
            "price": "0",
            "stock": -1,
            "category_id": category["id"],
        }))
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let errors = body(resp).await;
    for field in ["name", "price", "stock"] {
        assert!(errors.get(field).is_some(), "missing {field} in {errors}");
    }
}

#[tokio::test]
async fn test_product_with_unknown_category_is_rejected() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let resp = client
        .post(app.url("/api/products"))
        .json(&json!({ "name": "Orphan", "price": "1.00", "stock": 1, "category_id": 999 }))
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(resp).await, json!({ "category_id": CATEGORY_NOT_FOUND }));

    let resp = client.get(app.url("/api/products")).send().await.expect("list");
    assert_eq!(body(resp).await, json!([]));
}

#[tokio::test]
async fn test_product_update_with_unknown_category_is_rejected() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let product = app.create_product(&category, "Novel", "12.00", 3).await;

    let resp = TestApp::client()
        .patch(app.url(&format!("/api/products/{}", product["id"])))
        .json(&json!({ "category_id": 999, "name": "x" }))
        .send()
        .await
        .expect("patch");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(resp).await, json!({ "category_id": CATEGORY_NOT_FOUND }));
    assert_eq!(app.product(&product).await, product);
}

#[tokio::test]
async fn test_product_filters() {
    let app = TestApp::spawn().await;
    let books = app.create_category("Books").await;
    let pens = app.create_category("Pens").await;
    let novel = app.create_product(&books, "Mystery Novel", "12.00", 3).await;
    let atlas = app.create_product(&books, "World Atlas", "30.00", 1).await;
    let pen = app.create_product(&pens, "Fountain Pen", "24.00", 5).await;
    let client = TestApp::client();

    let list = |query: String| {
        let client = client.clone();
        let url = app.url(&format!("/api/products{query}"));
        async move { body(client.get(url).send().await.expect("list")).await }
    };

    assert_eq!(list(String::new()).await, json!([novel, atlas, pen]));
    assert_eq!(
        list(format!("?category={}", books["id"])).await,
        json!([novel, atlas])
    );
    assert_eq!(list("?search=NOVEL".to_string()).await, json!([novel]));
    assert_eq!(
        list(format!("?category={}&search=pen", books["id"])).await,
        json!([])
    );

    // Listings are stable between calls
    assert_eq!(list(String::new()).await, list(String::new()).await);
}

#[tokio::test]
async fn test_product_replace_requires_every_field() {
    let app = TestApp::spawn().await;
    let category = app.create_category("Books").await;
    let product = app.create_product(&category, "Novel", "12.00", 3).await;
    let url = app.url(&format!("/api/products/{}", product["id"]));
    let client = TestApp::client();

    let resp = client
        .put(&url)
        .json(&json!({ "name": "Renamed" }))
        .send()
        .await
        .expect("put");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .patch(&url)
        .json(&json!({ "price": "9.99" }))
        .send()
        .await
        .expect("patch");
    assert_eq!(resp.status(), StatusCode::OK);
    let patched = body(resp).await;
    assert_eq!(patched["name"], "Novel");
    assert_eq!(patched["price"], "9.99");
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    for path in ["/api/products/42", "/api/products/abc", "/api/categories/42"] {
        let resp = client.get(app.url(path)).send().await.expect("get");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
    }
}
