//! HTTP client for the auth endpoints
//!
//! [`AuthApi`] is the seam the [`AuthStore`](super::AuthStore) talks
//! through; [`HttpAuthApi`] is the reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::error::ClientError;
use crate::data::{Provider, UserResponse};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A freshly issued token and the user it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSuccess {
    pub token: String,
    pub user: UserResponse,
}

/// Auth endpoints consumed by the client
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Resolve `token` to its user (`GET /api/auth/me`)
    async fn me(&self, token: &str) -> Result<UserResponse, ClientError>;

    /// `POST /api/auth/login`
    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ClientError>;

    /// `POST /api/auth/register`
    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSuccess, ClientError>;
}

/// `{ success, token?, user?, message? }` as returned by every auth endpoint
#[derive(Debug, Deserialize)]
struct AuthPayload {
    #[serde(default)]
    success: bool,
    token: Option<String>,
    user: Option<UserResponse>,
    message: Option<String>,
}

impl AuthPayload {
    fn rejection(self, fallback: &str) -> ClientError {
        ClientError::Rejected(self.message.unwrap_or_else(|| fallback.to_string()))
    }

    fn into_auth(self) -> Result<AuthSuccess, ClientError> {
        match self {
            AuthPayload {
                success: true,
                token: Some(token),
                user: Some(user),
                ..
            } => Ok(AuthSuccess { token, user }),
            payload => Err(payload.rejection("Authentication failed")),
        }
    }

    fn into_user(self) -> Result<UserResponse, ClientError> {
        match self {
            AuthPayload {
                success: true,
                user: Some(user),
                ..
            } => Ok(user),
            payload => Err(payload.rejection("Session is no longer valid")),
        }
    }
}

/// reqwest-backed [`AuthApi`]
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpAuthApi {
    /// Client for the API at `base_url` with [`DEFAULT_TIMEOUT`]
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Every request fails with [`ClientError::Network`] once `timeout` elapses.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// Where the browser goes to start an OAuth sign-in
    ///
    /// `None` for [`Provider::Local`], which has no redirect flow.
    pub fn oauth_login_url(&self, provider: Provider) -> Option<Url> {
        let path = match provider {
            Provider::Google => "api/auth/google",
            Provider::Github => "api/auth/github",
            Provider::Local => return None,
        };
        self.endpoint(path).ok()
    }

    pub fn login_with_google_url(&self) -> Option<Url> {
        self.oauth_login_url(Provider::Google)
    }

    pub fn login_with_github_url(&self) -> Option<Url> {
        self.oauth_login_url(Provider::Github)
    }

    async fn post_credentials(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<AuthSuccess, ClientError> {
        let payload: AuthPayload = self
            .client
            .post(self.endpoint(path)?)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        payload.into_auth()
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn me(&self, token: &str) -> Result<UserResponse, ClientError> {
        let response = self
            .client
            .get(self.endpoint("api/auth/me")?)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Rejected(format!(
                "Token rejected with status {status}"
            )));
        }

        response.json::<AuthPayload>().await?.into_user()
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ClientError> {
        self.post_credentials(
            "api/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSuccess, ClientError> {
        self.post_credentials(
            "api/auth/register",
            serde_json::json!({ "email": email, "password": password, "name": name }),
        )
        .await
    }
}
