//! In-process [`Store`] for local development and tests.
//!
//! All tables live behind one `RwLock`, so every operation (checkout
//! included) sees and leaves a consistent state. Referential rules mirror the
//! `PostgreSQL` schema: categories with products and ordered products cannot
//! be deleted; deleting a product drops its cart lines.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use restcrud_core::{
    CartItemId, CartLine, CategoryId, CheckoutPlan, Email, OrderId, OrderItemId, Price,
    ProductId, Quantity, UserId, Username,
};

use super::{RepositoryError, Store};
use crate::models::{
    CartItem, CartItemPatch, Category, CategoryPatch, NewCartItem, NewCategory, NewProduct,
    Order, OrderItem, Product, ProductFilter, ProductPatch, User,
};

#[derive(Debug, Clone)]
struct ProductRecord {
    category_id: CategoryId,
    name: String,
    description: String,
    price: Price,
    stock: i32,
}

#[derive(Debug, Clone, Copy)]
struct CartRecord {
    user_id: UserId,
    product_id: ProductId,
    quantity: Quantity,
}

#[derive(Debug, Clone)]
struct OrderRecord {
    user_id: UserId,
    order_date: DateTime<Utc>,
    total_amount: Decimal,
    items: Vec<OrderItemRecord>,
}

#[derive(Debug, Clone, Copy)]
struct OrderItemRecord {
    id: OrderItemId,
    product_id: ProductId,
    quantity: Quantity,
    unit_price: Price,
}

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
}

/// Last assigned ID per table. IDs start at 1 and are never reused.
#[derive(Debug, Default)]
struct Sequences {
    category: i32,
    product: i32,
    cart_item: i32,
    order: i32,
    order_item: i32,
    user: i32,
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct Tables {
    seq: Sequences,
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, ProductRecord>,
    cart: BTreeMap<CartItemId, CartRecord>,
    orders: BTreeMap<OrderId, OrderRecord>,
    users: BTreeMap<UserId, UserRecord>,
}

impl Tables {
    fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let Some(record) = self.products.get(&id) else {
            return Ok(None);
        };
        let category = self
            .categories
            .get(&record.category_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "product {id} references missing category {}",
                    record.category_id
                ))
            })?;

        Ok(Some(Product {
            id,
            category,
            name: record.name.clone(),
            description: record.description.clone(),
            price: record.price,
            stock: record.stock,
        }))
    }

    fn existing_product(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.product(id)?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("dangling reference to product {id}"))
        })
    }

    fn cart_item(&self, id: CartItemId, record: CartRecord) -> Result<CartItem, RepositoryError> {
        Ok(CartItem {
            id,
            user_id: record.user_id,
            product: self.existing_product(record.product_id)?,
            quantity: record.quantity,
        })
    }

    fn owned_cart_record(&self, user: UserId, id: CartItemId) -> Option<CartRecord> {
        self.cart
            .get(&id)
            .copied()
            .filter(|record| record.user_id == user)
    }

    fn order(&self, id: OrderId, record: &OrderRecord) -> Result<Order, RepositoryError> {
        let items = record
            .items
            .iter()
            .map(|item| {
                Ok(OrderItem {
                    id: item.id,
                    product: self.existing_product(item.product_id)?,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Order {
            id,
            user_id: record.user_id,
            order_date: record.order_date,
            total_amount: record.total_amount,
            items,
        })
    }

    fn is_ordered(&self, product_id: ProductId) -> bool {
        self.orders
            .values()
            .flat_map(|order| &order.items)
            .any(|item| item.product_id == product_id)
    }
}

/// Store keeping every table in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, RepositoryError> {
        self.tables.read().map_err(|_| RepositoryError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, RepositoryError> {
        self.tables.write().map_err(|_| RepositoryError::Poisoned)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.read().map(drop)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        self.read()?
            .categories
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.write()?;
        let category = Category {
            id: CategoryId::new(next(&mut tables.seq.category)),
            name: new.name,
            description: new.description,
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, RepositoryError> {
        let mut tables = self.write()?;
        let category = tables
            .categories
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(name) = patch.name {
            category.name = name;
        }
        if let Some(description) = patch.description {
            category.description = description;
        }
        Ok(category.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tables = self.write()?;
        if !tables.categories.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.products.values().any(|p| p.category_id == id) {
            return Err(RepositoryError::Conflict(
                "category still has products".to_owned(),
            ));
        }
        tables.categories.remove(&id);
        Ok(())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.read()?;
        let mut products = Vec::new();
        for id in tables.products.keys() {
            let product = tables.existing_product(*id)?;
            if filter.matches(&product) {
                products.push(product);
            }
        }
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.read()?.product(id)?.ok_or(RepositoryError::NotFound)
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.write()?;
        if !tables.categories.contains_key(&new.category_id) {
            return Err(RepositoryError::CategoryNotFound(new.category_id));
        }
        let id = ProductId::new(next(&mut tables.seq.product));
        tables.products.insert(
            id,
            ProductRecord {
                category_id: new.category_id,
                name: new.name,
                description: new.description,
                price: new.price,
                stock: new.stock,
            },
        );
        tables.existing_product(id)
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError> {
        let mut tables = self.write()?;
        if !tables.products.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if let Some(category_id) = patch.category_id
            && !tables.categories.contains_key(&category_id)
        {
            return Err(RepositoryError::CategoryNotFound(category_id));
        }

        let record = tables
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(description) = patch.description {
            record.description = description;
        }
        if let Some(price) = patch.price {
            record.price = price;
        }
        if let Some(stock) = patch.stock {
            record.stock = stock;
        }
        if let Some(category_id) = patch.category_id {
            record.category_id = category_id;
        }
        tables.existing_product(id)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut tables = self.write()?;
        if !tables.products.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.is_ordered(id) {
            return Err(RepositoryError::Conflict(
                "product is referenced by an order".to_owned(),
            ));
        }
        tables.cart.retain(|_, line| line.product_id != id);
        tables.products.remove(&id);
        Ok(())
    }

    async fn list_cart_items(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let tables = self.read()?;
        tables
            .cart
            .iter()
            .filter(|(_, record)| record.user_id == user)
            .map(|(id, record)| tables.cart_item(*id, *record))
            .collect()
    }

    async fn get_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
    ) -> Result<CartItem, RepositoryError> {
        let tables = self.read()?;
        let record = tables
            .owned_cart_record(user, id)
            .ok_or(RepositoryError::NotFound)?;
        tables.cart_item(id, record)
    }

    async fn add_cart_item(
        &self,
        user: UserId,
        new: NewCartItem,
    ) -> Result<CartItem, RepositoryError> {
        let mut tables = self.write()?;
        if !tables.products.contains_key(&new.product_id) {
            return Err(RepositoryError::ProductNotFound(new.product_id));
        }
        let id = CartItemId::new(next(&mut tables.seq.cart_item));
        let record = CartRecord {
            user_id: user,
            product_id: new.product_id,
            quantity: new.quantity,
        };
        tables.cart.insert(id, record);
        tables.cart_item(id, record)
    }

    async fn update_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
        patch: CartItemPatch,
    ) -> Result<CartItem, RepositoryError> {
        let mut tables = self.write()?;
        let mut record = tables
            .owned_cart_record(user, id)
            .ok_or(RepositoryError::NotFound)?;
        record.quantity = patch.quantity;
        tables.cart.insert(id, record);
        tables.cart_item(id, record)
    }

    async fn delete_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.write()?;
        tables
            .owned_cart_record(user, id)
            .ok_or(RepositoryError::NotFound)?;
        tables.cart.remove(&id);
        Ok(())
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.read()?;
        tables
            .orders
            .iter()
            .filter(|(_, record)| record.user_id == user)
            .map(|(id, record)| tables.order(*id, record))
            .collect()
    }

    async fn get_order(&self, user: UserId, id: OrderId) -> Result<Order, RepositoryError> {
        let tables = self.read()?;
        let record = tables
            .orders
            .get(&id)
            .filter(|record| record.user_id == user)
            .ok_or(RepositoryError::NotFound)?;
        tables.order(id, record)
    }

    async fn checkout(&self, user: UserId) -> Result<Order, RepositoryError> {
        let mut tables = self.write()?;

        let lines = tables
            .cart
            .iter()
            .filter(|(_, record)| record.user_id == user)
            .map(|(id, record)| {
                let product = tables.products.get(&record.product_id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "cart item {id} references missing product {}",
                        record.product_id
                    ))
                })?;
                Ok(CartLine {
                    cart_item_id: *id,
                    product_id: record.product_id,
                    quantity: record.quantity,
                    price: product.price,
                    stock: product.stock,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        // Planned before any table is touched.
        let plan = CheckoutPlan::build(&lines)?;

        let items = plan
            .lines()
            .iter()
            .map(|line| OrderItemRecord {
                id: OrderItemId::new(next(&mut tables.seq.order_item)),
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        let order_id = OrderId::new(next(&mut tables.seq.order));
        let record = OrderRecord {
            user_id: user,
            order_date: Utc::now(),
            total_amount: plan.total(),
            items,
        };

        for change in plan.stock_changes() {
            if let Some(product) = tables.products.get_mut(&change.product_id) {
                product.stock = change.new_stock;
            }
        }
        for id in plan.consumed_cart_items() {
            tables.cart.remove(id);
        }

        let order = tables.order(order_id, &record)?;
        tables.orders.insert(order_id, record);
        Ok(order)
    }

    async fn create_user(
        &self,
        username: &Username,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.write()?;
        if tables.users.values().any(|r| &r.user.username == username) {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }
        let user = User {
            id: UserId::new(next(&mut tables.seq.user)),
            username: username.clone(),
            email: email.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, RepositoryError> {
        self.read()?
            .users
            .get(&id)
            .map(|r| r.user.clone())
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|r| &r.user.username == username)
            .map(|r| (r.user.clone(), r.password_hash.clone())))
    }
}
