//! User management commands.

use restcrud_api::services::auth::AuthService;

use super::connect;

/// Create a user with a password.
///
/// # Errors
///
/// Returns an error if a field is invalid, the username is taken, or the
/// database is unreachable.
pub async fn create(
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = connect().await?;

    let user = AuthService::new(&store)
        .register(username, email, password)
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User created");
    Ok(())
}
