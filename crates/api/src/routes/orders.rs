//! Order route handlers. `POST /api/orders` is the checkout.

use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use restcrud_core::{OrderId, Price, Quantity};

use crate::error::{Json, Path, Result};
use crate::middleware::RequireAuth;
use crate::models::{Order, Product, User};
use crate::services;
use crate::state::AppState;

/// An order as returned by the API.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub user: User,
    pub items: Vec<OrderItemResponse>,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
}

/// One order line as returned by the API.
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product: Product,
    pub quantity: Quantity,
    pub unit_price: Price,
}

impl OrderResponse {
    fn new(order: Order, user: User) -> Self {
        Self {
            id: order.id,
            user,
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product: item.product,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            order_date: order.order_date,
            total_amount: order.total_amount,
        }
    }
}

/// GET /api/orders
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Vec<OrderResponse>>> {
    let user = state.store().get_user(current.id).await?;
    let orders = state.store().list_orders(current.id).await?;
    Ok(Json(
        orders
            .into_iter()
            .map(|order| OrderResponse::new(order, user.clone()))
            .collect(),
    ))
}

/// POST /api/orders
///
/// Converts the caller's whole cart into an order.
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let order = services::orders::checkout(state.store(), current.id).await?;
    let user = state.store().get_user(current.id).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::new(order, user))))
}

/// GET /api/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = state.store().get_order(current.id, id).await?;
    let user = state.store().get_user(current.id).await?;
    Ok(Json(OrderResponse::new(order, user)))
}
