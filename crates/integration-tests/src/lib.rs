//! Integration tests for restcrud.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory store, no external services needed
//! cargo test -p restcrud-integration-tests
//!
//! # Also run the PostgreSQL-backed tests
//! RESTCRUD_TEST_DATABASE_URL=postgres://localhost/restcrud_test \
//!     cargo test -p restcrud-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Categories, products, validation and filtering
//! - `cart` - Per-user cart lines and privacy
//! - `checkout` - Orders, stock and price snapshots
//! - `users` - Registration, login and profiles
//! - `postgres` - The same flows against a real database

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_sessions::{MemoryStore, SessionStore};

use restcrud_api::build_router;
use restcrud_api::config::ApiConfig;
use restcrud_api::db::{InMemoryStore, Store};
use restcrud_api::state::AppState;

/// Password used for every test account.
pub const PASSWORD: &str = "correct horse battery";

/// A running API server bound to an ephemeral local port.
pub struct TestApp {
    pub base_url: String,
    pub store: Arc<dyn Store>,
}

impl TestApp {
    /// Serve the API from an in-memory store with in-memory sessions.
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(InMemoryStore::new()), MemoryStore::default()).await
    }

    /// Serve the API from the given store and session backend.
    pub async fn spawn_with<S>(store: Arc<dyn Store>, sessions: S) -> Self
    where
        S: SessionStore + Clone,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let base_url = format!("http://{addr}");

        let config = ApiConfig {
            base_url: base_url.clone(),
            ..ApiConfig::default()
        };
        let router = build_router(AppState::new(config, Arc::clone(&store)), sessions);

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Test server failed");
        });

        Self { base_url, store }
    }

    /// Absolute URL for an API path such as `/api/products`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A client with its own cookie jar (one browser, one session).
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Register `username` and return a client logged in as them.
    pub async fn login_as(&self, username: &str) -> Client {
        let client = Self::client();

        let resp = client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": PASSWORD,
            }))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status(), StatusCode::CREATED, "register {username}");

        let resp = client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to log in");
        assert_eq!(resp.status(), StatusCode::OK, "login {username}");

        client
    }

    /// Create a category over HTTP and return its JSON.
    pub async fn create_category(&self, name: &str) -> Value {
        let resp = Self::client()
            .post(self.url("/api/categories"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("Failed to create category");
        assert_eq!(resp.status(), StatusCode::CREATED);
        body(resp).await
    }

    /// Create a product over HTTP and return its JSON.
    pub async fn create_product(
        &self,
        category: &Value,
        name: &str,
        price: &str,
        stock: i32,
    ) -> Value {
        let resp = Self::client()
            .post(self.url("/api/products"))
            .json(&json!({
                "name": name,
                "price": price,
                "stock": stock,
                "category_id": category["id"],
            }))
            .send()
            .await
            .expect("Failed to create product");
        assert_eq!(resp.status(), StatusCode::CREATED);
        body(resp).await
    }

    /// Fetch a product's current state.
    pub async fn product(&self, product: &Value) -> Value {
        let resp = Self::client()
            .get(self.url(&format!("/api/products/{}", product["id"])))
            .send()
            .await
            .expect("Failed to get product");
        assert_eq!(resp.status(), StatusCode::OK);
        body(resp).await
    }
}

/// Add `quantity` of `product` to the logged-in client's cart.
pub async fn add_to_cart(
    app: &TestApp,
    client: &Client,
    product: &Value,
    quantity: i32,
) -> Response {
    client
        .post(app.url("/api/cart"))
        .json(&json!({ "product_id": product["id"], "quantity": quantity }))
        .send()
        .await
        .expect("Failed to add to cart")
}

/// Decode a JSON response body.
pub async fn body(resp: Response) -> Value {
    resp.json().await.expect("Response body was not JSON")
}
