//! Client authentication state

use crate::data::UserResponse;

/// Where the client currently stands with the API
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    /// Initial resolution of a stored or OAuth token is in flight
    #[default]
    Loading,
    Unauthenticated,
    Authenticated { user: UserResponse, token: String },
}

/// What a protected view should do for a given [`AuthState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGate {
    /// Render a placeholder until the state settles
    Loading,
    /// Redirect to the sign-in page
    SignIn,
    /// Render the protected content
    Allow,
}

impl AuthState {
    pub fn user(&self) -> Option<&UserResponse> {
        match self {
            AuthState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            AuthState::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    /// Never signs the user out while still loading.
    pub fn gate(&self) -> RouteGate {
        match self {
            AuthState::Loading => RouteGate::Loading,
            AuthState::Unauthenticated => RouteGate::SignIn,
            AuthState::Authenticated { .. } => RouteGate::Allow,
        }
    }
}
