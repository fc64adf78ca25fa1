//! Profile API
//!
//! Read and partially update the caller's own user record.

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    response::Json,
    routing::get,
};

use super::dto::{ProfileUpdate, UserEnvelope, UserMessageEnvelope};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::User;
use crate::error::{AppError, report};

/// Create profile router
///
/// Routes (relative to `/api/user`):
/// - GET /profile - Current user
/// - PUT /profile - Partial update of name/email
pub fn profile_router() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

async fn load_user(state: &AppState, user_id: &str) -> Result<User, AppError> {
    state
        .db
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(AppError::user_not_found)
}

/// GET /api/user/profile
async fn get_profile(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<UserEnvelope>, AppError> {
    let user = load_user(&state, current.user_id())
        .await
        .inspect_err(|error| report("Get profile", error))?;

    Ok(Json(UserEnvelope::new(&user)))
}

/// PUT /api/user/profile
///
/// One read, one write. Email format and uniqueness are left to the store.
async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserMessageEnvelope>, AppError> {
    let result = match body {
        Ok(Json(update)) => apply_update(&state, current.user_id(), update).await,
        Err(rejection) => Err(rejection.into()),
    };

    result
        .inspect_err(|error| report("Update profile", error))
        .map(Json)
}

async fn apply_update(
    state: &AppState,
    user_id: &str,
    update: ProfileUpdate,
) -> Result<UserMessageEnvelope, AppError> {
    let mut user = load_user(state, user_id).await?;

    if update.apply_to(&mut user) {
        user.updated_at = chrono::Utc::now();
    }

    if !state.db.save_user(&user).await? {
        return Err(AppError::user_not_found());
    }

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(UserMessageEnvelope {
        success: true,
        message: "Profile updated successfully".to_string(),
        user: user.to_response(),
    })
}
