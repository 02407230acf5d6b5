//! Order domain types. Orders are created only by checkout and never change.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use restcrud_core::{OrderId, OrderItemId, Price, Quantity, UserId};

use super::catalog::Product;

/// A placed order with its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub items: Vec<OrderItem>,
}

/// One purchased line.
///
/// `unit_price` is the price captured at checkout; `product` is the product
/// as it is now, so `product.price` may differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product: Product,
    pub quantity: Quantity,
    pub unit_price: Price,
}
