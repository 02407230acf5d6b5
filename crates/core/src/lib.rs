//! restcrud core - shared domain types.
//!
//! This crate provides the types used across all restcrud components:
//! - `api` - JSON HTTP service for the catalog, carts and orders
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. Both store implementations in `api` build on it, so the
//! arithmetic of a checkout is written exactly once.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, quantities, emails and usernames
//! - [`checkout`] - Turning cart lines into an order total and order lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod types;

pub use checkout::{CartLine, CheckoutError, CheckoutPlan, OrderLine};
pub use types::*;
