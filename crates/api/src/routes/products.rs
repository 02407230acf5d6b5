//! Product route handlers.

use axum::{extract::State, http::StatusCode};

use restcrud_core::ProductId;

use crate::error::{Json, Path, Query, Result};
use crate::models::{Product, ProductFilter, ProductPatch, ProductPayload};
use crate::state::AppState;

/// GET /api/products?category=<id>&search=<term>
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.store().list_products(&filter).await?))
}

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> Result<(StatusCode, Json<Product>)> {
    let new = payload.into_new()?;
    let product = state.store().create_product(new).await?;
    tracing::info!(product_id = %product.id, category_id = %product.category.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.store().get_product(id).await?))
}

/// PUT /api/products/{id}
pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<Product>> {
    let patch = ProductPatch::from(payload.into_new()?);
    Ok(Json(state.store().update_product(id, patch).await?))
}

/// PATCH /api/products/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<Product>> {
    let patch = payload.into_patch()?;
    Ok(Json(state.store().update_product(id, patch).await?))
}

/// DELETE /api/products/{id}
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state.store().delete_product(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
