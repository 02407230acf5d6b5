//! HTTP route handlers for the JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (store ping)
//!
//! # Catalog (open to everyone)
//! GET|POST              /api/categories
//! GET|PUT|PATCH|DELETE  /api/categories/{id}
//! GET|POST              /api/products          ?category=<id>&search=<term>
//! GET|PUT|PATCH|DELETE  /api/products/{id}
//!
//! # Cart (requires auth)
//! GET|POST              /api/cart
//! GET|PUT|PATCH|DELETE  /api/cart/{id}
//!
//! # Orders (requires auth)
//! GET                   /api/orders
//! POST                  /api/orders            - Checkout
//! GET                   /api/orders/{id}
//!
//! # Users (requires auth)
//! GET  /api/users
//! GET  /api/users/me
//! GET  /api/users/{id}
//!
//! # Auth
//! POST /api/auth/register
//! POST /api/auth/login
//! POST /api/auth/logout
//! ```

pub mod auth;
pub mod cart;
pub mod categories;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::replace)
                .patch(categories::update)
                .delete(categories::destroy),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::replace)
                .patch(products::update)
                .delete(products::destroy),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::index).post(cart::create))
        .route(
            "/{id}",
            get(cart::show)
                .put(cart::update)
                .patch(cart::update)
                .delete(cart::destroy),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::checkout))
        .route("/{id}", get(orders::show))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/me", get(users::me))
        .route("/{id}", get(users::show))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/users", user_routes())
        .nest("/auth", auth_routes());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api)
}
