//! Email/password authentication endpoints
//!
//! The dashboard client consumes these for sign-up, sign-in and
//! validating a stored token at startup.

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};

use super::dto::{AuthResponse, LoginRequest, RegisterRequest, UserEnvelope};
use crate::AppState;
use crate::auth::password::{MIN_PASSWORD_LEN, hash_password, verify_password};
use crate::auth::{CurrentUser, issue_token, oauth_router};
use crate::data::User;
use crate::error::{AppError, report};
use crate::metrics::{AuthEvent, USERS_TOTAL, observe_auth_event};

/// Create auth router
///
/// Routes (relative to `/api/auth`):
/// - POST /register - Create a local account
/// - POST /login - Exchange credentials for a token
/// - GET /me - Resolve the bearer token to its user
/// - GET /google, /github (+ /callback) - OAuth sign-in
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .merge(oauth_router())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn validate_registration(request: &RegisterRequest) -> Result<(), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    let email = request.email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation(
            "Please provide a valid email".to_string(),
        ));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

// =============================================================================
// Register
// =============================================================================

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let result = match body {
        Ok(Json(request)) => create_account(&state, request).await,
        Err(rejection) => Err(rejection.into()),
    };
    observe_auth_event(AuthEvent::Register, result.is_ok());

    result
        .inspect_err(|error| report("Registration", error))
        .map(|response| (StatusCode::CREATED, Json(response)))
}

async fn create_account(
    state: &AppState,
    request: RegisterRequest,
) -> Result<AuthResponse, AppError> {
    validate_registration(&request)?;

    let email = normalize_email(&request.email);
    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "User already exists with this email".to_string(),
        ));
    }

    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;

    let user = User::new_local(email, request.name.trim().to_string(), password_hash);
    state.db.insert_user(&user).await?;
    USERS_TOTAL.inc();

    let token = issue_token(&user.id, &state.config.auth)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok(AuthResponse {
        success: true,
        message: "User registered successfully".to_string(),
        token,
        user: user.to_response(),
    })
}

// =============================================================================
// Login
// =============================================================================

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let result = match body {
        Ok(Json(request)) => authenticate(&state, request).await,
        Err(rejection) => Err(rejection.into()),
    };
    observe_auth_event(AuthEvent::Login, result.is_ok());

    result.inspect_err(|error| report("Login", error)).map(Json)
}

async fn authenticate(state: &AppState, request: LoginRequest) -> Result<AuthResponse, AppError> {
    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let mut user = state
        .db
        .find_user_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    // OAuth-provisioned accounts have no password to check against.
    let Some(password_hash) = user.password_hash.clone() else {
        return Err(AppError::InvalidCredentials);
    };

    let password = request.password;
    let verified =
        tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
    if !verified {
        return Err(AppError::InvalidCredentials);
    }

    let now = chrono::Utc::now();
    state.db.touch_last_login(&user.id, now).await?;
    user.last_login = Some(now);

    let token = issue_token(&user.id, &state.config.auth)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user: user.to_response(),
    })
}

// =============================================================================
// Me
// =============================================================================

/// GET /api/auth/me
async fn me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<UserEnvelope>, AppError> {
    let user = state
        .db
        .find_user_by_id(current.user_id())
        .await
        .and_then(|user| user.ok_or_else(AppError::user_not_found))
        .inspect_err(|error| report("Get current user", error))?;

    Ok(Json(UserEnvelope::new(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        }
    }

    fn message(result: Result<(), AppError>) -> String {
        match result {
            Err(AppError::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn registration_checks_run_in_order() {
        assert_eq!(message(validate_registration(&request(" ", "", ""))), "Name is required");
        assert_eq!(message(validate_registration(&request("Ada", " ", ""))), "Email is required");
        assert_eq!(
            message(validate_registration(&request("Ada", "ada", "secret1"))),
            "Please provide a valid email"
        );
        assert_eq!(
            message(validate_registration(&request("Ada", "ada@example.com", "12345"))),
            "Password must be at least 6 characters"
        );
        assert!(validate_registration(&request("Ada", "ada@example.com", "123456")).is_ok());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }
}
