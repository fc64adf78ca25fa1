//! Client auth store
//!
//! Owns the [`AuthState`] and the persisted token. One store per client
//! session, constructed explicitly and torn down with [`AuthStore::dispose`].

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::api::{AuthApi, AuthSuccess};
use super::callback::take_oauth_token;
use super::error::ClientError;
use super::state::AuthState;
use super::storage::TokenStorage;
use super::validation::{LoginForm, RegisterForm};
use crate::data::UserResponse;

pub struct AuthStore {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn TokenStorage>,
    state: watch::Sender<AuthState>,
    cancel: CancellationToken,
}

impl AuthStore {
    /// New store in [`AuthState::Loading`]; nothing happens until [`init`](Self::init).
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn TokenStorage>) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self {
            api,
            storage,
            state,
            cancel: CancellationToken::new(),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Resolve the starting state.
    ///
    /// A token on the OAuth success landing in `current_url` takes precedence
    /// and replaces whatever was persisted; the persisted token is then never
    /// sent. Otherwise the persisted token is validated, and without one the
    /// store settles on `Unauthenticated` without any request.
    pub async fn init(&self, current_url: Option<&mut Url>) -> Result<AuthState, ClientError> {
        self.commit(AuthState::Loading)?;

        if let Some(token) = current_url.and_then(take_oauth_token) {
            tracing::debug!("Using token from OAuth callback");
            self.adopt_token(token, true).await?;
            return Ok(self.state());
        }

        let stored = match self.storage.load() {
            Ok(stored) => stored,
            Err(error) => {
                tracing::warn!(%error, "Failed to read stored token");
                None
            }
        };

        match stored {
            Some(token) => self.adopt_token(token, false).await?,
            None => self.commit(AuthState::Unauthenticated)?,
        }
        Ok(self.state())
    }

    /// Consume the OAuth token in `url`, if any.
    ///
    /// Returns `false` when there was nothing to consume. The parameter is
    /// stripped from `url`, so a second call on the same URL is a no-op.
    pub async fn handle_oauth_callback(&self, url: &mut Url) -> Result<bool, ClientError> {
        let Some(token) = take_oauth_token(url) else {
            return Ok(false);
        };

        self.commit(AuthState::Loading)?;
        self.adopt_token(token, true).await?;
        Ok(true)
    }

    async fn adopt_token(&self, token: String, persist: bool) -> Result<(), ClientError> {
        if persist {
            self.ensure_live()?;
            if let Err(error) = self.storage.save(&token) {
                tracing::warn!(%error, "Failed to persist token");
            }
        }

        match self.guarded(self.api.me(&token)).await {
            Ok(user) => self.commit(AuthState::Authenticated { user, token }),
            Err(ClientError::Disposed) => Err(ClientError::Disposed),
            Err(error) => {
                tracing::debug!(%error, "Discarding token that no longer resolves to a user");
                self.ensure_live()?;
                self.clear_storage();
                self.commit(AuthState::Unauthenticated)
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// Invalid input is rejected before any request is sent. On failure the
    /// state is left as it was.
    pub async fn login(&self, form: &LoginForm) -> Result<UserResponse, ClientError> {
        form.validate()?;
        let auth = self
            .guarded(self.api.login(form.email.trim(), &form.password))
            .await?;
        self.sign_in(auth)
    }

    /// Create an account and sign in with it.
    pub async fn register(&self, form: &RegisterForm) -> Result<UserResponse, ClientError> {
        form.validate()?;
        let auth = self
            .guarded(
                self.api
                    .register(form.email.trim(), &form.password, form.name.trim()),
            )
            .await?;
        self.sign_in(auth)
    }

    fn sign_in(&self, auth: AuthSuccess) -> Result<UserResponse, ClientError> {
        self.ensure_live()?;
        self.storage.save(&auth.token)?;

        let user = auth.user.clone();
        tracing::info!(user_id = %user.id, "Signed in");
        self.commit(AuthState::Authenticated {
            user: auth.user,
            token: auth.token,
        })?;
        Ok(user)
    }

    /// Forget the token locally. No request is made.
    pub fn logout(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.clear_storage();
        self.state.send_replace(AuthState::Unauthenticated);
    }

    /// Cancel pending operations. The store never writes state or storage afterwards.
    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn guarded<T, F>(&self, operation: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        self.ensure_live()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClientError::Disposed),
            result = operation => result,
        }
    }

    fn ensure_live(&self) -> Result<(), ClientError> {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Disposed);
        }
        Ok(())
    }

    fn commit(&self, next: AuthState) -> Result<(), ClientError> {
        self.ensure_live()?;
        self.state.send_replace(next);
        Ok(())
    }

    fn clear_storage(&self) {
        if let Err(error) = self.storage.clear() {
            tracing::warn!(%error, "Failed to clear stored token");
        }
    }
}
