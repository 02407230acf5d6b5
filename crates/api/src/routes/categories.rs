//! Category route handlers.

use axum::{extract::State, http::StatusCode};

use restcrud_core::CategoryId;

use crate::error::{Json, Path, Result};
use crate::models::{Category, CategoryPatch, CategoryPayload};
use crate::state::AppState;

/// GET /api/categories
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.store().list_categories().await?))
}

/// POST /api/categories
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CategoryPayload>,
) -> Result<(StatusCode, Json<Category>)> {
    let new = payload.into_new()?;
    let category = state.store().create_category(new).await?;
    tracing::info!(category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/categories/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    Ok(Json(state.store().get_category(id).await?))
}

/// PUT /api/categories/{id}
pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<Category>> {
    let patch = CategoryPatch::from(payload.into_new()?);
    Ok(Json(state.store().update_category(id, patch).await?))
}

/// PATCH /api/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<Category>> {
    let patch = payload.into_patch()?;
    Ok(Json(state.store().update_category(id, patch).await?))
}

/// DELETE /api/categories/{id}
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    state.store().delete_category(id).await?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
