//! Domain models for the API.
//!
//! Domain types are what the stores return; `*Payload` types are what the
//! handlers accept. Payloads are validated into `New*` / `*Patch` values
//! before they reach a store, collecting every problem into [`FieldErrors`].

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod user;

mod validation;

pub use cart::{CartItem, CartItemPayload, CartItemPatch, NewCartItem};
pub use catalog::{
    Category, CategoryPatch, CategoryPayload, NewCategory, NewProduct, Product, ProductFilter,
    ProductPatch, ProductPayload,
};
pub use order::{Order, OrderItem};
pub use session::{CurrentUser, session_keys};
pub use user::User;
pub use validation::FieldErrors;
