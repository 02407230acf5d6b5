//! User profile handlers. A user can only ever see their own profile.

use axum::extract::State;

use restcrud_core::UserId;

use crate::error::{AppError, Json, Path, Result};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::state::AppState;

/// GET /api/users
///
/// Lists the users visible to the caller, which is only the caller.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Vec<User>>> {
    Ok(Json(vec![state.store().get_user(current.id).await?]))
}

/// GET /api/users/me
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<User>> {
    Ok(Json(state.store().get_user(current.id).await?))
}

/// GET /api/users/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    if id != current.id {
        return Err(AppError::NotFound);
    }
    Ok(Json(state.store().get_user(id).await?))
}
