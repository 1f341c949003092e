//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use mycoflora_core::{Email, Locale, UserId};

use super::RepositoryError;

/// A site account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub login: String,
    /// Display name.
    pub name: String,
    /// Contact address, also the name-tracking recipient.
    pub email: Email,
    /// Persistent admin attribute. Elevation still needs session admin mode.
    pub admin: bool,
    /// Stored locale preference; `None` or blank means "no preference".
    pub locale: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithHash {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// Fields for a new account.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub login: &'a str,
    pub name: &'a str,
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub admin: bool,
}

const USER_COLUMNS: &str = "id, login, name, email, admin, locale, created_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by login name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_login(&self, login: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE login = ?"
        ))
        .bind(login.trim())
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        login: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHash>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE login = ?"
        ))
        .bind(login.trim())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the login is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewUser<'_>) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (login, name, email, password_hash, admin, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new.login.trim())
        .bind(new.name.trim())
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.admin)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "login already exists"))?;

        Ok(user)
    }

    /// Set or clear the persistent admin attribute.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    pub async fn set_admin(&self, id: UserId, admin: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET admin = ? WHERE id = ?")
            .bind(admin)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store a locale preference, or clear it with `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    pub async fn set_locale(
        &self,
        id: UserId,
        locale: Option<&Locale>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET locale = ? WHERE id = ?")
            .bind(locale.map(Locale::as_str))
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
