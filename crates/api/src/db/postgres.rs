//! `PostgreSQL`-backed [`Store`].

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use restcrud_core::{CartItemId, CategoryId, Email, OrderId, ProductId, UserId, Username};

use super::{
    CartRepository, CategoryRepository, OrderRepository, ProductRepository, RepositoryError,
    Store, UserRepository,
};
use crate::models::{
    CartItem, CartItemPatch, Category, CategoryPatch, NewCartItem, NewCategory, NewProduct,
    Order, Product, ProductFilter, ProductPatch, User,
};

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn found<T>(value: Option<T>) -> Result<T, RepositoryError> {
    value.ok_or(RepositoryError::NotFound)
}

fn deleted(existed: bool) -> Result<(), RepositoryError> {
    if existed {
        Ok(())
    } else {
        Err(RepositoryError::NotFound)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        CategoryRepository::new(&self.pool).list().await
    }

    async fn get_category(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        found(CategoryRepository::new(&self.pool).get_by_id(id).await?)
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category, RepositoryError> {
        CategoryRepository::new(&self.pool).create(&new).await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, RepositoryError> {
        found(CategoryRepository::new(&self.pool).update(id, &patch).await?)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        deleted(CategoryRepository::new(&self.pool).delete(id).await?)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).list(filter).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, RepositoryError> {
        found(ProductRepository::new(&self.pool).get_by_id(id).await?)
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        ProductRepository::new(&self.pool).create(&new).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError> {
        found(ProductRepository::new(&self.pool).update(id, &patch).await?)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        deleted(ProductRepository::new(&self.pool).delete(id).await?)
    }

    async fn list_cart_items(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        CartRepository::new(&self.pool).list_for_user(user).await
    }

    async fn get_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
    ) -> Result<CartItem, RepositoryError> {
        found(CartRepository::new(&self.pool).get(user, id).await?)
    }

    async fn add_cart_item(
        &self,
        user: UserId,
        new: NewCartItem,
    ) -> Result<CartItem, RepositoryError> {
        CartRepository::new(&self.pool).add(user, new).await
    }

    async fn update_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
        patch: CartItemPatch,
    ) -> Result<CartItem, RepositoryError> {
        found(CartRepository::new(&self.pool).update(user, id, patch).await?)
    }

    async fn delete_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
    ) -> Result<(), RepositoryError> {
        deleted(CartRepository::new(&self.pool).delete(user, id).await?)
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).list_for_user(user).await
    }

    async fn get_order(&self, user: UserId, id: OrderId) -> Result<Order, RepositoryError> {
        found(OrderRepository::new(&self.pool).get(user, id).await?)
    }

    #[instrument(skip(self), fields(user_id = %user))]
    async fn checkout(&self, user: UserId) -> Result<Order, RepositoryError> {
        let orders = OrderRepository::new(&self.pool);
        let order_id = orders.checkout(user).await?;
        orders.get(user, order_id).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("order {order_id} missing after checkout"))
        })
    }

    async fn create_user(
        &self,
        username: &Username,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool)
            .create(username, email, password_hash)
            .await
    }

    async fn get_user(&self, id: UserId) -> Result<User, RepositoryError> {
        found(UserRepository::new(&self.pool).get_by_id(id).await?)
    }

    async fn get_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        UserRepository::new(&self.pool).get_credentials(username).await
    }
}
