//! SQLite database operations
//!
//! All database access goes through this module.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

/// Turn a UNIQUE(email) violation into a conflict the caller can act on.
fn map_write_error(error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            AppError::Conflict("Email already in use".to_string())
        }
        _ => AppError::Database(error),
    }
}

impl Database {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Look a user up by ID
    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Look a user up by email (case-insensitive)
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Insert a new user
    ///
    /// # Errors
    /// `AppError::Conflict` if the email is already taken
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, name, password_hash, avatar_url, provider,
                is_verified, last_login, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.avatar_url)
        .bind(user.provider)
        .bind(user.is_verified)
        .bind(user.last_login)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    /// Persist the mutable fields of an existing user
    ///
    /// `provider`, `password_hash` and `created_at` are never written here.
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching user row exists.
    pub async fn save_user(&self, user: &User) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = ?, name = ?, avatar_url = ?, is_verified = ?,
                last_login = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.avatar_url)
        .bind(user.is_verified)
        .bind(user.last_login)
        .bind(user.updated_at)
        .bind(&user.id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(result.rows_affected() == 1)
    }

    /// Record a successful sign-in
    pub async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Resolve an OAuth identity to a user, creating one on first sign-in
    ///
    /// An existing account with the same email is reused as-is; its
    /// provider is left untouched.
    pub async fn find_or_create_oauth_user(
        &self,
        provider: Provider,
        email: &str,
        name: &str,
        avatar_url: Option<&str>,
    ) -> Result<User, AppError> {
        if let Some(user) = self.find_user_by_email(email).await? {
            return Ok(user);
        }

        let user = User::new_oauth(
            provider,
            email.to_string(),
            name.to_string(),
            avatar_url.map(ToOwned::to_owned),
        );

        match self.insert_user(&user).await {
            Ok(()) => Ok(user),
            // Lost a race with a concurrent first sign-in.
            Err(AppError::Conflict(_)) => self
                .find_user_by_email(email)
                .await?
                .ok_or_else(AppError::user_not_found),
            Err(error) => Err(error),
        }
    }

    /// Number of user rows
    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
