//! Request and response DTOs
//!
//! Every successful body carries `success: true`; failures are
//! rendered by `AppError` as `{ success: false, message }`.

use serde::{Deserialize, Serialize};

use crate::data::{User, UserResponse};

/// `{ success, user }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub success: bool,
    pub user: UserResponse,
}

impl UserEnvelope {
    pub fn new(user: &User) -> Self {
        Self {
            success: true,
            user: user.to_response(),
        }
    }
}

/// `{ success, message, user }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMessageEnvelope {
    pub success: bool,
    pub message: String,
    pub user: UserResponse,
}

/// `{ success, message, token, user }` returned by register and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

/// POST /api/auth/register
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// POST /api/auth/login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// PUT /api/user/profile
///
/// A field is applied when present in the payload, including the empty
/// string. Absent or `null` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }

    /// Apply the present fields to `user`.
    ///
    /// # Returns
    /// `true` if any stored value changed
    pub fn apply_to(self, user: &mut User) -> bool {
        let mut changed = false;

        if let Some(name) = self.name {
            changed |= user.name != name;
            user.name = name;
        }
        if let Some(email) = self.email {
            changed |= user.email != email;
            user.email = email;
        }

        changed
    }
}
