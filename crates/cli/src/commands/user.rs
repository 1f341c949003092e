//! Account management commands.

use thiserror::Error;

use mycoflora_core::UserId;
use mycoflora_web::db::{RepositoryError, UserRepository};
use mycoflora_web::services::auth::{AuthError, AuthService};

use super::{ConnectError, connect};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("No user with login: {0}")]
    UnknownLogin(String),
}

/// Create an account and return its id.
pub async fn create(
    login: &str,
    email: &str,
    password: &str,
    admin: bool,
) -> Result<UserId, UserError> {
    let pool = connect().await?;

    let user = AuthService::new(&pool)
        .register(login, email, password, admin)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Login: {}, Admin: {}",
        user.id,
        user.login,
        user.admin
    );
    Ok(user.id)
}

/// Set or clear the persistent admin attribute.
pub async fn set_admin(login: &str, admin: bool) -> Result<(), UserError> {
    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_login(login)
        .await?
        .ok_or_else(|| UserError::UnknownLogin(login.to_owned()))?;
    users.set_admin(user.id, admin).await?;

    if admin {
        tracing::info!("{} is now an admin", user.login);
    } else {
        tracing::info!("{} is no longer an admin", user.login);
    }
    Ok(())
}
