//! Cart repository for database operations.
//!
//! Every query is scoped by `user_id`; another user's line is reported as
//! missing.

use sqlx::PgPool;
use tracing::instrument;

use restcrud_core::{CartItemId, Quantity, UserId};

use super::RepositoryError;
use super::products::{CATEGORY_JOIN, PRODUCT_COLUMNS, ProductRow};
use crate::models::{CartItem, CartItemPatch, NewCartItem, Product};

const PRODUCT_FK: &str = "cart_item_product_id_fkey";

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    user_id: i32,
    quantity: i32,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid quantity on cart item {}: {e}", row.id))
        })?;

        Ok(Self {
            id: CartItemId::new(row.id),
            user_id: UserId::new(row.user_id),
            product: Product::try_from(row.product)?,
            quantity,
        })
    }
}

fn select_sql(filter: &str) -> String {
    format!(
        r"
        SELECT ci.id, ci.user_id, ci.quantity, {PRODUCT_COLUMNS}
        FROM shop.cart_item ci
        JOIN shop.product p ON p.id = ci.product_id
        {CATEGORY_JOIN}
        WHERE {filter}
        ORDER BY ci.id
        "
    )
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the user's cart lines ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(&select_sql("ci.user_id = $1"))
            .bind(user.as_i32())
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(CartItem::try_from).collect()
    }

    /// Get one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user: UserId,
        id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&select_sql(
            "ci.id = $1 AND ci.user_id = $2",
        ))
        .bind(id.as_i32())
        .bind(user.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(CartItem::try_from).transpose()
    }

    /// Add a line to the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ProductNotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self), fields(user_id = %user, product_id = %new.product_id))]
    pub async fn add(&self, user: UserId, new: NewCartItem) -> Result<CartItem, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO shop.cart_item (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(user.as_i32())
        .bind(new.product_id.as_i32())
        .bind(new.quantity.get())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(PRODUCT_FK)
            {
                return RepositoryError::ProductNotFound(new.product_id);
            }
            RepositoryError::Database(e)
        })?;

        self.get(user, CartItemId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Change the quantity of one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self), fields(user_id = %user, cart_item_id = %id))]
    pub async fn update(
        &self,
        user: UserId,
        id: CartItemId,
        patch: CartItemPatch,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.cart_item SET quantity = $3 WHERE id = $1 AND user_id = $2")
                .bind(id.as_i32())
                .bind(user.as_i32())
                .bind(patch.quantity.get())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(user, id).await
    }

    /// Remove one of the user's lines. Returns `false` if it was not found.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self), fields(user_id = %user, cart_item_id = %id))]
    pub async fn delete(&self, user: UserId, id: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_item WHERE id = $1 AND user_id = $2")
            .bind(id.as_i32())
            .bind(user.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
