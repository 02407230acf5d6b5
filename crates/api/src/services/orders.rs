//! Checkout orchestration.

use tracing::instrument;

use restcrud_core::UserId;

use crate::db::{RepositoryError, Store};
use crate::error::add_breadcrumb;
use crate::models::Order;

/// Check out the user's cart.
///
/// The store performs the whole checkout atomically; this wrapper records the
/// outcome.
///
/// # Errors
///
/// Returns `RepositoryError::Checkout` for an empty cart, or the store's error.
#[instrument(skip(store), fields(user_id = %user))]
pub async fn checkout(store: &dyn Store, user: UserId) -> Result<Order, RepositoryError> {
    let order = store.checkout(user).await?;

    tracing::info!(
        order_id = %order.id,
        lines = order.items.len(),
        total = %order.total_amount,
        "Order placed"
    );
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", &order.id.to_string())]),
    );

    Ok(order)
}
