//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Response bodies follow three shapes:
//! - field errors: `{"<field>": "<message>"}`
//! - the empty-cart checkout failure: `["<message>"]`
//! - everything else: `{"detail": "<message>"}`

use axum::{
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use restcrud_core::CheckoutError;

use crate::db::RepositoryError;
use crate::models::FieldErrors;
use crate::services::auth::AuthError;

/// Message for a `category_id` that does not resolve.
pub const CATEGORY_NOT_FOUND: &str = "دسته بندی با این ID وجود ندارد.";

/// Message for a `product_id` that does not resolve.
pub const PRODUCT_NOT_FOUND: &str = "محصول با این ID وجود ندارد.";

/// Message for a checkout of an empty cart.
pub const EMPTY_CART: &str = "سبد خرید خالی است.";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Request body failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found")]
    NotFound,

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn detail(message: impl Into<String>) -> Value {
    json!({ "detail": message.into() })
}

fn field(name: &str, message: impl Into<String>) -> Value {
    let mut body = serde_json::Map::new();
    body.insert(name.to_owned(), Value::String(message.into()));
    Value::Object(body)
}

const INTERNAL: &str = "Internal server error";

fn repository_response(err: &RepositoryError) -> (StatusCode, Value) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, detail("Not found.")),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, detail(msg.clone())),
        RepositoryError::CategoryNotFound(_) => (
            StatusCode::BAD_REQUEST,
            field("category_id", CATEGORY_NOT_FOUND),
        ),
        RepositoryError::ProductNotFound(_) => (
            StatusCode::BAD_REQUEST,
            field("product_id", PRODUCT_NOT_FOUND),
        ),
        RepositoryError::Checkout(CheckoutError::EmptyCart) => {
            (StatusCode::BAD_REQUEST, json!([EMPTY_CART]))
        }
        RepositoryError::Checkout(e) => (StatusCode::BAD_REQUEST, detail(e.to_string())),
        RepositoryError::Database(_)
        | RepositoryError::DataCorruption(_)
        | RepositoryError::Poisoned => (StatusCode::INTERNAL_SERVER_ERROR, detail(INTERNAL)),
    }
}

impl AppError {
    /// Status code and JSON body for this error.
    fn response_parts(&self) -> (StatusCode, Value) {
        match self {
            Self::Database(err) | Self::Auth(AuthError::Repository(err)) => {
                repository_response(err)
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    detail("Invalid username or password."),
                ),
                AuthError::UserAlreadyExists => (
                    StatusCode::CONFLICT,
                    field("username", "A user with that username already exists."),
                ),
                AuthError::WeakPassword(msg) => {
                    (StatusCode::BAD_REQUEST, field("password", msg.clone()))
                }
                AuthError::InvalidEmail(_) => (
                    StatusCode::BAD_REQUEST,
                    field("email", "Enter a valid email address."),
                ),
                AuthError::InvalidUsername(e) => {
                    (StatusCode::BAD_REQUEST, field("username", e.to_string()))
                }
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    (StatusCode::INTERNAL_SERVER_ERROR, detail(INTERNAL))
                }
            },
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                serde_json::to_value(errors).unwrap_or_else(|_| detail("Invalid input.")),
            ),
            Self::NotFound => (StatusCode::NOT_FOUND, detail("Not found.")),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, detail(msg.clone())),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, detail(msg.clone())),
            Self::Session(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, detail(INTERNAL))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.response_parts();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// =============================================================================
// Extractors with JSON rejections
// =============================================================================

/// JSON body extractor/response whose rejection is an [`AppError`].
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Path extractor; an unparseable ID is reported as not found.
#[derive(Debug, Clone, Copy, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        Self::NotFound
    }
}

/// Query string extractor whose rejection is an [`AppError`].
#[derive(Debug, Clone, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

// =============================================================================
// Sentry helpers
// =============================================================================

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use restcrud_core::CategoryId;

    use super::*;

    fn parts(err: AppError) -> (StatusCode, Value) {
        err.response_parts()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(parts(AppError::NotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(
            parts(AppError::Unauthorized("test".to_string())).0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            parts(AppError::BadRequest("test".to_string())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            parts(RepositoryError::Conflict("busy".to_string()).into()).0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            parts(AppError::Internal("test".to_string())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_reference_errors_are_field_errors() {
        let (status, body) = parts(RepositoryError::CategoryNotFound(CategoryId::new(9)).into());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "category_id": CATEGORY_NOT_FOUND }));
    }

    #[test]
    fn test_empty_cart_is_a_message_list() {
        let (status, body) = parts(RepositoryError::Checkout(CheckoutError::EmptyCart).into());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!([EMPTY_CART]));
    }

    #[test]
    fn test_oversized_total_is_a_client_error() {
        let (status, body) = parts(RepositoryError::Checkout(CheckoutError::TotalOverflow).into());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "detail": "order total must have at most 10 digits before the decimal point" })
        );
    }

    #[test]
    fn test_internal_details_do_not_leak() {
        let (status, body) =
            parts(RepositoryError::DataCorruption("secret column value".to_string()).into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "detail": INTERNAL }));
    }

    #[test]
    fn test_validation_body_is_flat() {
        let (_, body) = parts(FieldErrors::single("name", "This field is required.").into());
        assert_eq!(body, json!({ "name": "This field is required." }));
    }

    #[test]
    fn test_validation_error_message_names_fields() {
        let err = AppError::from(FieldErrors::single("price", "bad"));
        assert_eq!(err.to_string(), "Validation failed: invalid fields: price");
    }
}
