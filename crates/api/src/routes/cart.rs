//! Cart route handlers.
//!
//! Every handler acts on the authenticated user's own cart; lines owned by
//! anyone else are reported as not found.

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use restcrud_core::{CartItemId, Quantity};

use crate::error::{Json, Path, Result};
use crate::middleware::RequireAuth;
use crate::models::{CartItem, CartItemPayload, Product, User};
use crate::state::AppState;

/// A cart line as returned by the API.
#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub id: CartItemId,
    pub product: Product,
    pub user: User,
    pub quantity: Quantity,
}

impl CartItemResponse {
    fn new(item: CartItem, user: User) -> Self {
        Self {
            id: item.id,
            product: item.product,
            user,
            quantity: item.quantity,
        }
    }
}

/// GET /api/cart
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Vec<CartItemResponse>>> {
    let user = state.store().get_user(current.id).await?;
    let items = state.store().list_cart_items(current.id).await?;
    Ok(Json(
        items
            .into_iter()
            .map(|item| CartItemResponse::new(item, user.clone()))
            .collect(),
    ))
}

/// POST /api/cart
#[instrument(skip(state, current, payload), fields(user_id = %current.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(payload): Json<CartItemPayload>,
) -> Result<(StatusCode, Json<CartItemResponse>)> {
    let new = payload.into_new()?;
    let user = state.store().get_user(current.id).await?;
    let item = state.store().add_cart_item(current.id, new).await?;
    tracing::info!(cart_item_id = %item.id, product_id = %item.product.id, "Added to cart");
    Ok((StatusCode::CREATED, Json(CartItemResponse::new(item, user))))
}

/// GET /api/cart/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<CartItemId>,
) -> Result<Json<CartItemResponse>> {
    let item = state.store().get_cart_item(current.id, id).await?;
    let user = state.store().get_user(current.id).await?;
    Ok(Json(CartItemResponse::new(item, user)))
}

/// PUT|PATCH /api/cart/{id}
///
/// Only the quantity can change; a `product_id` in the body is ignored.
#[instrument(skip(state, current, payload), fields(user_id = %current.id, cart_item_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<CartItemId>,
    Json(payload): Json<CartItemPayload>,
) -> Result<Json<CartItemResponse>> {
    let patch = payload.into_patch()?;
    let item = state.store().update_cart_item(current.id, id, patch).await?;
    let user = state.store().get_user(current.id).await?;
    Ok(Json(CartItemResponse::new(item, user)))
}

/// DELETE /api/cart/{id}
#[instrument(skip(state, current), fields(user_id = %current.id, cart_item_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<CartItemId>,
) -> Result<StatusCode> {
    state.store().delete_cart_item(current.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
