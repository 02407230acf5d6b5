//! Category repository for database operations.

use sqlx::PgPool;
use tracing::instrument;

use restcrud_core::CategoryId;

use super::{RepositoryError, conflict_on_reference};
use crate::models::{Category, CategoryPatch, NewCategory};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description FROM shop.category ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description FROM shop.category WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Insert a new category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.category (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            ",
        )
        .bind(&new.name)
        .bind(new.description.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update. Returns `None` if the category does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self, patch), fields(category_id = %id))]
    pub async fn update(
        &self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE shop.category
            SET name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END
            WHERE id = $1
            RETURNING id, name, description
            ",
        )
        .bind(id.as_i32())
        .bind(patch.name.as_deref())
        .bind(patch.description.is_some())
        .bind(patch.description.clone().flatten())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Delete a category. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if products still belong to it.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| conflict_on_reference(e, "category still has products"))?;

        Ok(result.rows_affected() > 0)
    }
}
