//! Google and GitHub sign-in
//!
//! Implements the OAuth 2.0 authorization code flow. A successful
//! callback provisions (or reuses) the user, issues a session token and
//! hands it to the front end as a one-time `token` query parameter on
//! `{frontend_url}/auth/success`. Every failure lands on
//! `{frontend_url}/auth/error`.

use axum::{
    Router,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;

use super::session::issue_token;
use crate::AppState;
use crate::config::{AuthConfig, OAuthClientConfig};
use crate::data::Provider;
use crate::error::AppError;
use crate::metrics::{AuthEvent, observe_auth_event};

const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Create OAuth router
///
/// Routes (relative to `/api/auth`):
/// - GET /google - Redirect to Google
/// - GET /google/callback - Google callback
/// - GET /github - Redirect to GitHub
/// - GET /github/callback - GitHub callback
pub fn oauth_router() -> Router<AppState> {
    Router::new()
        .route("/google", get(google_redirect))
        .route("/google/callback", get(google_callback))
        .route("/github", get(github_redirect))
        .route("/github/callback", get(github_callback))
}

/// Supported identity providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    pub fn provider(self) -> Provider {
        match self {
            OAuthProvider::Google => Provider::Google,
            OAuthProvider::Github => Provider::Github,
        }
    }

    fn client_config(self, auth: &AuthConfig) -> Option<&OAuthClientConfig> {
        match self {
            OAuthProvider::Google => auth.google.as_ref(),
            OAuthProvider::Github => auth.github.as_ref(),
        }
    }

    fn authorize_endpoint(self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            OAuthProvider::Github => "https://github.com/login/oauth/authorize",
        }
    }

    fn token_endpoint(self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://oauth2.googleapis.com/token",
            OAuthProvider::Github => "https://github.com/login/oauth/access_token",
        }
    }

    fn scope(self) -> &'static str {
        match self {
            OAuthProvider::Google => "openid email profile",
            OAuthProvider::Github => "read:user user:email",
        }
    }

    fn callback_path(self) -> &'static str {
        match self {
            OAuthProvider::Google => "/api/auth/google/callback",
            OAuthProvider::Github => "/api/auth/github/callback",
        }
    }
}

/// Provider authorization URL the browser is sent to
pub fn authorize_url(
    provider: OAuthProvider,
    client_id: &str,
    redirect_uri: &str,
    csrf_state: &str,
) -> Result<String, AppError> {
    let mut params = vec![
        ("client_id", client_id),
        ("redirect_uri", redirect_uri),
        ("scope", provider.scope()),
        ("state", csrf_state),
    ];
    if provider == OAuthProvider::Google {
        params.push(("response_type", "code"));
    }

    let url = url::Url::parse_with_params(provider.authorize_endpoint(), &params)
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(url.into())
}

// =============================================================================
// Redirect
// =============================================================================

async fn google_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    begin_sign_in(OAuthProvider::Google, &state, jar)
}

async fn github_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    begin_sign_in(OAuthProvider::Github, &state, jar)
}

/// # Steps
/// 1. Generate CSRF state token
/// 2. Store state in cookie
/// 3. Redirect to the provider with client_id, redirect_uri, scope, state
fn begin_sign_in(
    provider: OAuthProvider,
    state: &AppState,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let client = provider
        .client_config(&state.config.auth)
        .ok_or_else(|| AppError::NotFound("OAuth provider not configured".to_string()))?;

    let csrf_state = generate_csrf_state();
    let redirect_uri = format!(
        "{}{}",
        state.config.server.base_url(),
        provider.callback_path()
    );
    let location = authorize_url(provider, &client.client_id, &redirect_uri, &csrf_state)?;

    let cookie = Cookie::build((OAUTH_STATE_COOKIE, csrf_state))
        .path("/")
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .same_site(SameSite::Lax);

    tracing::debug!(provider = provider.provider().as_str(), "Starting OAuth sign-in");
    Ok((jar.add(cookie), Redirect::to(&location)))
}

// =============================================================================
// Callback
// =============================================================================

/// Query parameters from the provider callback
#[derive(Debug, Default, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> impl IntoResponse {
    complete_sign_in(OAuthProvider::Google, &state, query, jar).await
}

async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> impl IntoResponse {
    complete_sign_in(OAuthProvider::Github, &state, query, jar).await
}

async fn complete_sign_in(
    provider: OAuthProvider,
    state: &AppState,
    query: CallbackQuery,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let expected_state = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_owned());
    let jar = jar.remove(Cookie::build(OAUTH_STATE_COOKIE).path("/"));

    match finish_sign_in(provider, state, query, expected_state.as_deref()).await {
        Ok(token) => {
            observe_auth_event(AuthEvent::OAuth, true);
            let location = format!(
                "{}?token={}",
                state.config.server.frontend_path("/auth/success"),
                urlencoding::encode(&token)
            );
            (jar, Redirect::to(&location))
        }
        Err(error) => {
            observe_auth_event(AuthEvent::OAuth, false);
            tracing::warn!(
                provider = provider.provider().as_str(),
                %error,
                "OAuth sign-in failed"
            );
            let location = state.config.server.frontend_path("/auth/error");
            (jar, Redirect::to(&location))
        }
    }
}

/// # Steps
/// 1. Verify CSRF state
/// 2. Exchange code for access token
/// 3. Fetch the provider identity
/// 4. Find or create the user
/// 5. Issue a session token
async fn finish_sign_in(
    provider: OAuthProvider,
    state: &AppState,
    query: CallbackQuery,
    expected_state: Option<&str>,
) -> Result<String, AppError> {
    verify_csrf_state(query.state.as_deref(), expected_state)?;

    if let Some(error) = query.error {
        return Err(AppError::Validation(format!("provider returned error: {error}")));
    }
    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::Validation("missing authorization code".to_string()))?;

    let client = provider
        .client_config(&state.config.auth)
        .ok_or_else(|| AppError::NotFound("OAuth provider not configured".to_string()))?;
    let redirect_uri = format!(
        "{}{}",
        state.config.server.base_url(),
        provider.callback_path()
    );

    let access_token =
        exchange_code(provider, &state.http_client, client, &code, &redirect_uri).await?;
    let identity = fetch_identity(provider, &state.http_client, &access_token).await?;

    let user = state
        .db
        .find_or_create_oauth_user(
            provider.provider(),
            &identity.email,
            &identity.name,
            identity.avatar_url.as_deref(),
        )
        .await?;
    state
        .db
        .touch_last_login(&user.id, chrono::Utc::now())
        .await?;

    tracing::info!(
        user_id = %user.id,
        provider = provider.provider().as_str(),
        "OAuth sign-in completed"
    );

    issue_token(&user.id, &state.config.auth)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

async fn exchange_code(
    provider: OAuthProvider,
    http: &reqwest::Client,
    client: &OAuthClientConfig,
    code: &str,
    redirect_uri: &str,
) -> Result<String, AppError> {
    let response: TokenResponse = http
        .post(provider.token_endpoint())
        .header(header::ACCEPT, "application/json")
        .form(&[
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(response.access_token)
}

/// Identity reported by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthIdentity {
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

async fn fetch_identity(
    provider: OAuthProvider,
    http: &reqwest::Client,
    access_token: &str,
) -> Result<OAuthIdentity, AppError> {
    match provider {
        OAuthProvider::Google => {
            let info: GoogleUserInfo = http
                .get("https://www.googleapis.com/oauth2/v3/userinfo")
                .bearer_auth(access_token)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            google_identity(info)
        }
        OAuthProvider::Github => {
            let user: GitHubUser = http
                .get("https://api.github.com/user")
                .bearer_auth(access_token)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            let email = match user.email {
                Some(email) => email,
                None => {
                    let emails: Vec<GitHubEmail> = http
                        .get("https://api.github.com/user/emails")
                        .bearer_auth(access_token)
                        .send()
                        .await?
                        .error_for_status()?
                        .json()
                        .await?;
                    primary_github_email(emails).ok_or_else(|| {
                        AppError::Validation("GitHub account has no verified email".to_string())
                    })?
                }
            };
            Ok(identity(email, user.name.or(Some(user.login)), user.avatar_url))
        }
    }
}

/// Only a Google-verified address may be linked to an account.
fn google_identity(info: GoogleUserInfo) -> Result<OAuthIdentity, AppError> {
    let email = info
        .email
        .ok_or_else(|| AppError::Validation("Google account has no email".to_string()))?;
    if info.email_verified != Some(true) {
        return Err(AppError::Validation(
            "Google account email is not verified".to_string(),
        ));
    }
    Ok(identity(email, info.name, info.picture))
}

fn primary_github_email(emails: Vec<GitHubEmail>) -> Option<String> {
    let mut fallback = None;
    for entry in emails.into_iter().filter(|entry| entry.verified) {
        if entry.primary {
            return Some(entry.email);
        }
        fallback.get_or_insert(entry.email);
    }
    fallback
}

fn identity(email: String, name: Option<String>, avatar_url: Option<String>) -> OAuthIdentity {
    let email = email.trim().to_ascii_lowercase();
    let name = name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    OAuthIdentity {
        email,
        name,
        avatar_url,
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Generate a random CSRF state token
fn generate_csrf_state() -> String {
    use base64::{Engine as _, engine::general_purpose};
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Verify CSRF state from cookie matches callback state
fn verify_csrf_state(received: Option<&str>, expected: Option<&str>) -> Result<(), AppError> {
    match (received, expected) {
        (Some(received), Some(expected)) if !expected.is_empty() && received == expected => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}
