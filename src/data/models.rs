//! Data models
//!
//! Rust structs representing database entities and their
//! client-facing serializations.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// How an account was created
///
/// Fixed at creation; no update path writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Provider {
    Local,
    Google,
    Github,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::Google => "google",
            Provider::Github => "github",
        }
    }
}

/// A dashboard user as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Argon2 PHC string; `None` for OAuth-provisioned accounts
    pub password_hash: Option<String>,
    pub avatar_url: Option<String>,
    pub provider: Provider,
    pub is_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a local (email/password) account.
    pub fn new_local(email: String, name: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new().0,
            email,
            name,
            password_hash: Some(password_hash),
            avatar_url: None,
            provider: Provider::Local,
            is_verified: false,
            last_login: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Build an account provisioned by an OAuth provider.
    ///
    /// The provider has already verified the address.
    pub fn new_oauth(
        provider: Provider,
        email: String,
        name: String,
        avatar_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new().0,
            email,
            name,
            password_hash: None,
            avatar_url,
            provider,
            is_verified: true,
            last_login: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Client-safe view of this user (no password hash)
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            avatar: self.avatar_url.clone(),
            provider: self.provider,
            is_verified: self.is_verified,
            last_login: self.last_login,
            created_at: self.created_at,
        }
    }
}

/// Serialized user returned by the API and held by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub provider: Provider,
    pub is_verified: bool,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
