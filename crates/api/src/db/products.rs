//! Product repository for database operations.
//!
//! Products are always read joined with their category so the API can embed
//! it. The joined column list is shared with the cart and order repositories.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use restcrud_core::{CategoryId, Price, ProductId};

use super::{RepositoryError, conflict_on_reference};
use crate::models::{Category, NewProduct, Product, ProductFilter, ProductPatch};

/// Columns selected for an embedded product. Expects `p` = product, `c` = category.
pub(crate) const PRODUCT_COLUMNS: &str = "p.id AS product_id, p.name AS product_name, \
     p.description AS product_description, p.price, p.stock, \
     c.id AS category_id, c.name AS category_name, c.description AS category_description";

/// Join from `p` to its category `c`.
pub(crate) const CATEGORY_JOIN: &str = "JOIN shop.category c ON c.id = p.category_id";

const CATEGORY_FK: &str = "product_category_id_fkey";

/// A product joined with its category.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    product_id: i32,
    product_name: String,
    product_description: String,
    price: Decimal,
    stock: i32,
    category_id: i32,
    category_name: String,
    category_description: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid price for product {}: {e}",
                row.product_id
            ))
        })?;

        Ok(Self {
            id: ProductId::new(row.product_id),
            category: Category {
                id: CategoryId::new(row.category_id),
                name: row.category_name,
                description: row.category_description,
            },
            name: row.product_name,
            description: row.product_description,
            price,
            stock: row.stock,
        })
    }
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Translate a foreign-key failure on `category_id` into `CategoryNotFound`.
fn category_violation(e: sqlx::Error, category_id: Option<CategoryId>) -> RepositoryError {
    if let (sqlx::Error::Database(db_err), Some(category_id)) = (&e, category_id)
        && db_err.constraint() == Some(CATEGORY_FK)
    {
        return RepositoryError::CategoryNotFound(category_id);
    }
    RepositoryError::Database(e)
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `filter`, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product p {CATEGORY_JOIN}
            WHERE ($1::INTEGER IS NULL OR p.category_id = $1)
              AND ($2::TEXT IS NULL OR p.name ILIKE $2 OR p.description ILIKE $2)
            ORDER BY p.id
            "
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(filter.category.map(|id| id.as_i32()))
            .bind(filter.search_term().map(like_pattern))
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored price is invalid.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p {CATEGORY_JOIN} WHERE p.id = $1"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::CategoryNotFound` if the category does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, new), fields(name = %new.name, category_id = %new.category_id))]
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO shop.product (category_id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(new.category_id.as_i32())
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price.amount())
        .bind(new.stock)
        .fetch_one(self.pool)
        .await
        .map_err(|e| category_violation(e, Some(new.category_id)))?;

        self.get_by_id(ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update. Returns `None` if the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::CategoryNotFound` if a new category does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let updated: Option<(i32,)> = sqlx::query_as(
            r"
            UPDATE shop.product
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                stock = COALESCE($5, stock),
                category_id = COALESCE($6, category_id)
            WHERE id = $1
            RETURNING id
            ",
        )
        .bind(id.as_i32())
        .bind(patch.name.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.price.map(|p| p.amount()))
        .bind(patch.stock)
        .bind(patch.category_id.map(|c| c.as_i32()))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| category_violation(e, patch.category_id))?;

        match updated {
            Some(_) => self.get_by_id(id).await,
            None => Ok(None),
        }
    }

    /// Delete a product and its cart lines. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an order references the product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| conflict_on_reference(e, "product is referenced by an order"))?;

        Ok(result.rows_affected() > 0)
    }
}
