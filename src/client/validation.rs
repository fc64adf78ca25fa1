//! Form checks run before any request leaves the client

use super::error::ClientError;
use crate::auth::password::MIN_PASSWORD_LEN;

/// Sign-up form as entered by the user
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Sign-in form as entered by the user
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

fn invalid(message: impl Into<String>) -> ClientError {
    ClientError::Validation(message.into())
}

impl RegisterForm {
    /// First failing check wins.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.name.trim().is_empty() {
            return Err(invalid("Name is required"));
        }
        if self.email.trim().is_empty() {
            return Err(invalid("Email is required"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(invalid(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.password != self.confirm_password {
            return Err(invalid("Passwords do not match"));
        }
        Ok(())
    }
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.email.trim().is_empty() {
            return Err(invalid("Email is required"));
        }
        if self.password.is_empty() {
            return Err(invalid("Password is required"));
        }
        Ok(())
    }
}
