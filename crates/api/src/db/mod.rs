//! Persistence for the catalog, carts, orders and users.
//!
//! # Database: `restcrud`
//!
//! ## Tables (schema `shop`)
//!
//! - `category` - Product categories
//! - `product` - Catalog products (`NUMERIC(10,2)` prices)
//! - `cart_item` - Per-user cart lines
//! - `order` / `order_item` - Immutable checkout snapshots
//! - `user` - Accounts with argon2 password hashes
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! # Stores
//!
//! Handlers talk to a [`Store`]. [`PgStore`] is backed by `PostgreSQL` through
//! the per-table repositories in this module; [`InMemoryStore`] keeps
//! everything in process and is used for local development and tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p restcrud-cli -- migrate
//! ```

pub mod cart;
pub mod categories;
pub mod memory;
pub mod orders;
pub mod postgres;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use restcrud_core::{
    CartItemId, CategoryId, CheckoutError, Email, OrderId, ProductId, UserId, Username,
};

use crate::models::{
    CartItem, CartItemPatch, Category, CategoryPatch, NewCartItem, NewCategory, NewProduct,
    Order, Product, ProductFilter, ProductPatch, User,
};

pub use cart::CartRepository;
pub use categories::CategoryRepository;
pub use memory::InMemoryStore;
pub use orders::OrderRepository;
pub use postgres::PgStore;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Schema migrations embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found (or belongs to another user).
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username, referenced row).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A product write referenced a category that does not exist.
    #[error("category {0} does not exist")]
    CategoryNotFound(CategoryId),

    /// A cart write referenced a product that does not exist.
    #[error("product {0} does not exist")]
    ProductNotFound(ProductId),

    /// Checkout could not be planned.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The in-memory store's lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Data access used by the HTTP layer.
///
/// Every cart, order and user method takes the caller's [`UserId`]; rows
/// owned by anyone else behave exactly like missing rows.
#[allow(clippy::missing_errors_doc)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the backing storage is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // Categories
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn get_category(&self, id: CategoryId) -> Result<Category, RepositoryError>;
    async fn create_category(&self, new: NewCategory) -> Result<Category, RepositoryError>;
    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, RepositoryError>;
    /// Fails with `Conflict` while products still reference the category.
    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError>;

    // Products
    async fn list_products(&self, filter: &ProductFilter)
    -> Result<Vec<Product>, RepositoryError>;
    async fn get_product(&self, id: ProductId) -> Result<Product, RepositoryError>;
    async fn create_product(&self, new: NewProduct) -> Result<Product, RepositoryError>;
    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError>;
    /// Removes cart lines for the product. Fails with `Conflict` if it was ever ordered.
    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError>;

    // Cart
    async fn list_cart_items(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError>;
    async fn get_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
    ) -> Result<CartItem, RepositoryError>;
    async fn add_cart_item(
        &self,
        user: UserId,
        new: NewCartItem,
    ) -> Result<CartItem, RepositoryError>;
    async fn update_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
        patch: CartItemPatch,
    ) -> Result<CartItem, RepositoryError>;
    async fn delete_cart_item(&self, user: UserId, id: CartItemId)
    -> Result<(), RepositoryError>;

    // Orders
    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError>;
    async fn get_order(&self, user: UserId, id: OrderId) -> Result<Order, RepositoryError>;
    /// Atomically turn the user's cart into an order.
    async fn checkout(&self, user: UserId) -> Result<Order, RepositoryError>;

    // Users
    /// Fails with `Conflict` if the username is taken.
    async fn create_user(
        &self,
        username: &Username,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;
    async fn get_user(&self, id: UserId) -> Result<User, RepositoryError>;
    /// Look up a user and their password hash for login.
    async fn get_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-violation into `Conflict`, passing other errors through.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Map a foreign-key violation into `Conflict`, passing other errors through.
pub(crate) fn conflict_on_reference(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}
