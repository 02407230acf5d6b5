//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use restcrud_core::{Email, UserId, Username};

/// A registered user. The password hash never leaves the store layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}
