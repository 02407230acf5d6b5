//! Checkout planning.
//!
//! A checkout turns every cart line of one user into an order line whose
//! unit price is the product price *at this moment*, sums the order total and
//! works out each product's stock after the purchase. Stores call
//! [`CheckoutPlan::build`] while holding their locks and then persist the plan
//! verbatim, so both backends agree on the arithmetic.
//!
//! Stock sufficiency is deliberately not checked: stock may go negative.
//! Duplicate lines for the same product stay separate order lines; their
//! quantities are summed into a single stock change.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{CartItemId, Price, ProductId, Quantity};

/// Errors that abort a checkout before anything is written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// The user has no cart lines.
    #[error("cart is empty")]
    EmptyCart,
    /// The order total does not fit in `NUMERIC(12, 2)`.
    #[error(
        "order total must have at most {} digits before the decimal point",
        CheckoutPlan::MAX_TOTAL_INTEGER_DIGITS
    )]
    TotalOverflow,
    /// Decrementing the product's stock would overflow `i32`.
    #[error("stock of product {product_id} overflows")]
    StockOverflow {
        /// Product whose stock could not be decremented.
        product_id: ProductId,
    },
}

/// A cart line as read inside the checkout transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Cart item being consumed.
    pub cart_item_id: CartItemId,
    /// Product on the line.
    pub product_id: ProductId,
    /// Units ordered.
    pub quantity: Quantity,
    /// Current catalog price of the product.
    pub price: Price,
    /// Current stock of the product.
    pub stock: i32,
}

/// One order line to insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    /// Product purchased.
    pub product_id: ProductId,
    /// Units purchased.
    pub quantity: Quantity,
    /// Price captured for this purchase.
    pub unit_price: Price,
}

/// New stock level of a product after the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    /// Product to update.
    pub product_id: ProductId,
    /// Stock after subtracting every purchased unit.
    pub new_stock: i32,
}

/// Everything a store needs to persist one checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    total: Decimal,
    lines: Vec<OrderLine>,
    stock_changes: Vec<StockChange>,
    consumed: Vec<CartItemId>,
}

impl CheckoutPlan {
    /// Integer digits allowed in an order total (`NUMERIC(12, 2)`).
    pub const MAX_TOTAL_INTEGER_DIGITS: u32 = 10;

    /// Build a plan from the user's cart lines, in cart order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if `cart` is empty, and an overflow
    /// error if the total does not fit the order column or a stock level
    /// cannot be represented.
    pub fn build(cart: &[CartLine]) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(cart.len());
        let mut stock_changes: Vec<StockChange> = Vec::new();

        for line in cart {
            let line_total = line
                .price
                .amount()
                .checked_mul(Decimal::from(line.quantity.get()))
                .ok_or(CheckoutError::TotalOverflow)?;
            total = total
                .checked_add(line_total)
                .ok_or(CheckoutError::TotalOverflow)?;

            lines.push(OrderLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.price,
            });

            let overflow = CheckoutError::StockOverflow {
                product_id: line.product_id,
            };
            if let Some(change) = stock_changes
                .iter_mut()
                .find(|c| c.product_id == line.product_id)
            {
                change.new_stock = change
                    .new_stock
                    .checked_sub(line.quantity.get())
                    .ok_or(overflow)?;
            } else {
                stock_changes.push(StockChange {
                    product_id: line.product_id,
                    new_stock: line.stock.checked_sub(line.quantity.get()).ok_or(overflow)?,
                });
            }
        }

        if total >= Decimal::from(10_i64.pow(Self::MAX_TOTAL_INTEGER_DIGITS)) {
            return Err(CheckoutError::TotalOverflow);
        }

        Ok(Self {
            total,
            lines,
            stock_changes,
            consumed: cart.iter().map(|l| l.cart_item_id).collect(),
        })
    }

    /// Order total: the sum of price times quantity over all lines.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Order lines, one per cart line.
    #[must_use]
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Stock updates, one per distinct product.
    #[must_use]
    pub fn stock_changes(&self) -> &[StockChange] {
        &self.stock_changes
    }

    /// Cart items to delete once the order exists.
    #[must_use]
    pub fn consumed_cart_items(&self) -> &[CartItemId] {
        &self.consumed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn line(cart_item: i32, product: i32, price: &str, quantity: i32, stock: i32) -> CartLine {
        CartLine {
            cart_item_id: CartItemId::new(cart_item),
            product_id: ProductId::new(product),
            quantity: Quantity::new(quantity).unwrap(),
            price: Price::new(Decimal::from_str(price).unwrap()).unwrap(),
            stock,
        }
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        assert_eq!(CheckoutPlan::build(&[]), Err(CheckoutError::EmptyCart));
    }

    #[test]
    fn test_total_and_captured_prices() {
        let plan =
            CheckoutPlan::build(&[line(1, 10, "10", 2, 5), line(2, 20, "5", 1, 3)]).unwrap();

        assert_eq!(plan.total(), Decimal::from(25));
        assert_eq!(plan.total().to_string(), "25.00");

        let prices: Vec<String> = plan
            .lines()
            .iter()
            .map(|l| l.unit_price.to_string())
            .collect();
        assert_eq!(prices, vec!["10.00", "5.00"]);

        assert_eq!(
            plan.stock_changes(),
            &[
                StockChange {
                    product_id: ProductId::new(10),
                    new_stock: 3
                },
                StockChange {
                    product_id: ProductId::new(20),
                    new_stock: 2
                },
            ]
        );
        assert_eq!(
            plan.consumed_cart_items(),
            &[CartItemId::new(1), CartItemId::new(2)]
        );
    }

    #[test]
    fn test_stock_may_go_negative() {
        let plan = CheckoutPlan::build(&[line(1, 10, "1.50", 4, 1)]).unwrap();
        assert_eq!(plan.stock_changes()[0].new_stock, -3);
        assert_eq!(plan.total().to_string(), "6.00");
    }

    #[test]
    fn test_duplicate_lines_stay_separate_but_share_stock() {
        let plan =
            CheckoutPlan::build(&[line(1, 10, "2.00", 1, 10), line(2, 10, "2.00", 3, 10)])
                .unwrap();

        assert_eq!(plan.lines().len(), 2);
        assert_eq!(plan.stock_changes().len(), 1);
        assert_eq!(plan.stock_changes()[0].new_stock, 6);
        assert_eq!(plan.total(), Decimal::from(8));
    }

    #[test]
    fn test_stock_overflow_is_an_error() {
        let result = CheckoutPlan::build(&[line(1, 10, "1", 2, i32::MIN + 1)]);
        assert_eq!(
            result,
            Err(CheckoutError::StockOverflow {
                product_id: ProductId::new(10)
            })
        );
    }

    #[test]
    fn test_total_must_fit_order_column() {
        let result = CheckoutPlan::build(&[line(1, 10, "99999999.99", 101, 0)]);
        assert_eq!(result, Err(CheckoutError::TotalOverflow));

        let plan = CheckoutPlan::build(&[line(1, 10, "99999999.99", 100, 0)]).unwrap();
        assert_eq!(plan.total().to_string(), "9999999999.00");
    }
}
