//! Order repository: read access and the checkout transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use restcrud_core::{
    CartItemId, CartLine, CheckoutPlan, OrderId, OrderItemId, Price, ProductId, Quantity, UserId,
};

use super::RepositoryError;
use super::products::{CATEGORY_JOIN, PRODUCT_COLUMNS, ProductRow};
use crate::models::{Order, OrderItem, Product};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    order_date: DateTime<Utc>,
    total_amount: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    quantity: i32,
    unit_price: Decimal,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, e: String| {
            RepositoryError::DataCorruption(format!("invalid {what} on order item {}: {e}", row.id))
        };
        let quantity = Quantity::new(row.quantity).map_err(|e| corrupt("quantity", e.to_string()))?;
        let unit_price =
            Price::new(row.unit_price).map_err(|e| corrupt("unit price", e.to_string()))?;

        Ok(Self {
            id: OrderItemId::new(row.id),
            product: Product::try_from(row.product)?,
            quantity,
            unit_price,
        })
    }
}

/// A cart line locked for checkout.
#[derive(Debug, sqlx::FromRow)]
struct LockedLineRow {
    cart_item_id: i32,
    product_id: i32,
    quantity: i32,
    price: Decimal,
    stock: i32,
}

impl TryFrom<LockedLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: LockedLineRow) -> Result<Self, Self::Error> {
        let corrupt = |e: String| {
            RepositoryError::DataCorruption(format!(
                "invalid cart item {} during checkout: {e}",
                row.cart_item_id
            ))
        };

        Ok(Self {
            cart_item_id: CartItemId::new(row.cart_item_id),
            product_id: ProductId::new(row.product_id),
            quantity: Quantity::new(row.quantity).map_err(|e| corrupt(e.to_string()))?,
            price: Price::new(row.price).map_err(|e| corrupt(e.to_string()))?,
            stock: row.stock,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the user's orders with their items, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, order_date, total_amount
            FROM shop."order"
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user.as_i32())
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// Get one of the user's orders with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, user: UserId, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, order_date, total_amount
            FROM shop."order"
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_i32())
        .bind(user.as_i32())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let sql = format!(
            r"
            SELECT oi.id, oi.order_id, oi.quantity, oi.unit_price, {PRODUCT_COLUMNS}
            FROM shop.order_item oi
            JOIN shop.product p ON p.id = oi.product_id
            {CATEGORY_JOIN}
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id
            "
        );
        let item_rows = sqlx::query_as::<_, OrderItemRow>(&sql)
            .bind(&ids)
            .fetch_all(self.pool)
            .await?;

        let mut orders: Vec<Order> = rows
            .into_iter()
            .map(|r| Order {
                id: OrderId::new(r.id),
                user_id: UserId::new(r.user_id),
                order_date: r.order_date,
                total_amount: r.total_amount,
                items: Vec::new(),
            })
            .collect();

        for row in item_rows {
            let order_id = OrderId::new(row.order_id);
            let item = OrderItem::try_from(row)?;
            if let Some(order) = orders.iter_mut().find(|o| o.id == order_id) {
                order.items.push(item);
            }
        }

        Ok(orders)
    }

    /// Turn the user's cart into an order in a single transaction.
    ///
    /// The user's cart rows and their products are locked with
    /// `SELECT ... FOR UPDATE`, so a concurrent checkout of the same cart
    /// waits and then finds it empty. Any error drops the transaction, which
    /// rolls back every write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Checkout` if the cart is empty or the totals overflow.
    /// Returns `RepositoryError::Database` if any statement fails.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn checkout(&self, user: UserId) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, LockedLineRow>(
            r"
            SELECT ci.id AS cart_item_id, ci.product_id, ci.quantity, p.price, p.stock
            FROM shop.cart_item ci
            JOIN shop.product p ON p.id = ci.product_id
            WHERE ci.user_id = $1
            ORDER BY ci.id
            FOR UPDATE OF ci, p
            ",
        )
        .bind(user.as_i32())
        .fetch_all(&mut *tx)
        .await?;

        let lines = rows
            .into_iter()
            .map(CartLine::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let plan = CheckoutPlan::build(&lines)?;

        let (order_id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO shop."order" (user_id, total_amount)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(user.as_i32())
        .bind(plan.total())
        .fetch_one(&mut *tx)
        .await?;

        for line in plan.lines() {
            sqlx::query(
                r"
                INSERT INTO shop.order_item (order_id, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order_id)
            .bind(line.product_id.as_i32())
            .bind(line.quantity.get())
            .bind(line.unit_price.amount())
            .execute(&mut *tx)
            .await?;
        }

        for change in plan.stock_changes() {
            sqlx::query("UPDATE shop.product SET stock = $2 WHERE id = $1")
                .bind(change.product_id.as_i32())
                .bind(change.new_stock)
                .execute(&mut *tx)
                .await?;
        }

        let consumed: Vec<i32> = plan
            .consumed_cart_items()
            .iter()
            .map(CartItemId::as_i32)
            .collect();
        sqlx::query("DELETE FROM shop.cart_item WHERE id = ANY($1)")
            .bind(&consumed)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(OrderId::new(order_id))
    }
}
