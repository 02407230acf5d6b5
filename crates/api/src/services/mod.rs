//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `orders` - Checkout with audit logging

pub mod auth;
pub mod orders;
