//! AuthStore state machine tests

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::api::{AuthApi, AuthSuccess, MockAuthApi};
use super::error::{ClientError, NETWORK_ERROR_MESSAGE};
use super::state::{AuthState, RouteGate};
use super::storage::{MemoryTokenStorage, TokenStorage};
use super::store::AuthStore;
use super::validation::{LoginForm, RegisterForm};
use crate::data::{User, UserResponse};

fn user(email: &str) -> UserResponse {
    User::new_local(email.to_string(), "Ada".to_string(), "hash".to_string()).to_response()
}

fn store(api: MockAuthApi, storage: &Arc<MemoryTokenStorage>) -> AuthStore {
    AuthStore::new(Arc::new(api), storage.clone())
}

fn register_form(password: &str, confirm: &str) -> RegisterForm {
    RegisterForm {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        password: password.to_string(),
        confirm_password: confirm.to_string(),
    }
}

#[tokio::test]
async fn init_without_token_skips_the_network() {
    let storage = Arc::new(MemoryTokenStorage::new());
    let mut api = MockAuthApi::new();
    api.expect_me().times(0);

    let store = store(api, &storage);
    assert!(store.state().is_loading());

    let state = store.init(None).await.unwrap();
    assert_eq!(state, AuthState::Unauthenticated);
    assert_eq!(state.gate(), RouteGate::SignIn);
}

#[tokio::test]
async fn init_with_valid_token_authenticates() {
    let storage = Arc::new(MemoryTokenStorage::with_token("stored"));
    let mut api = MockAuthApi::new();
    api.expect_me().times(1).returning(|token| {
        assert_eq!(token, "stored");
        Ok(user("ada@example.com"))
    });

    let store = store(api, &storage);
    let state = store.init(None).await.unwrap();

    assert_eq!(state.token(), Some("stored"));
    assert_eq!(state.user().unwrap().email, "ada@example.com");
    assert_eq!(storage.load().unwrap().as_deref(), Some("stored"));
}

#[tokio::test]
async fn init_with_invalid_token_clears_storage() {
    let storage = Arc::new(MemoryTokenStorage::with_token("expired"));
    let mut api = MockAuthApi::new();
    api.expect_me()
        .times(1)
        .returning(|_| Err(ClientError::Rejected("Unauthorized".to_string())));

    let store = store(api, &storage);
    let state = store.init(None).await.unwrap();

    assert_eq!(state, AuthState::Unauthenticated);
    assert_eq!(storage.load().unwrap(), None);
}

#[tokio::test]
async fn init_network_failure_clears_storage() {
    let storage = Arc::new(MemoryTokenStorage::with_token("stored"));
    let mut api = MockAuthApi::new();
    api.expect_me()
        .returning(|_| Err(ClientError::Network("timed out".to_string())));

    let store = store(api, &storage);
    assert_eq!(store.init(None).await.unwrap(), AuthState::Unauthenticated);
    assert_eq!(storage.load().unwrap(), None);
}

#[tokio::test]
async fn oauth_token_wins_over_stored_token() {
    let storage = Arc::new(MemoryTokenStorage::with_token("stale"));
    let mut api = MockAuthApi::new();
    api.expect_me().times(1).returning(|token| {
        assert_eq!(token, "fresh");
        Ok(user("ada@example.com"))
    });

    let store = store(api, &storage);
    let mut url = Url::parse("http://localhost:5173/auth/success?token=fresh").unwrap();
    let state = store.init(Some(&mut url)).await.unwrap();

    assert_eq!(state.token(), Some("fresh"));
    assert_eq!(storage.load().unwrap().as_deref(), Some("fresh"));
    assert_eq!(url.query(), None);
}

#[tokio::test]
async fn oauth_callback_consumed_once() {
    let storage = Arc::new(MemoryTokenStorage::new());
    let mut api = MockAuthApi::new();
    api.expect_me()
        .times(1)
        .returning(|_| Ok(user("ada@example.com")));

    let store = store(api, &storage);
    store.init(None).await.unwrap();

    let mut url = Url::parse("http://localhost:5173/auth/success?token=oauth").unwrap();
    assert!(store.handle_oauth_callback(&mut url).await.unwrap());
    assert!(!store.handle_oauth_callback(&mut url).await.unwrap());
    assert_eq!(store.state().token(), Some("oauth"));
}

#[tokio::test]
async fn rejected_oauth_token_ends_unauthenticated() {
    let storage = Arc::new(MemoryTokenStorage::new());
    let mut api = MockAuthApi::new();
    api.expect_me()
        .returning(|_| Err(ClientError::Rejected("User not found".to_string())));

    let store = store(api, &storage);
    let mut url = Url::parse("http://localhost:5173/auth/success?token=bad").unwrap();
    assert_eq!(
        store.init(Some(&mut url)).await.unwrap(),
        AuthState::Unauthenticated
    );
    assert_eq!(storage.load().unwrap(), None);
}

#[tokio::test]
async fn short_password_rejected_before_request() {
    let storage = Arc::new(MemoryTokenStorage::new());
    let mut api = MockAuthApi::new();
    api.expect_register().times(0);

    let store = store(api, &storage);
    store.init(None).await.unwrap();

    let error = store
        .register(&register_form("12345", "12345"))
        .await
        .unwrap_err();
    assert_eq!(error.user_message(), "Password must be at least 6 characters");
    assert_eq!(store.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn mismatched_passwords_rejected_before_request() {
    let storage = Arc::new(MemoryTokenStorage::new());
    let mut api = MockAuthApi::new();
    api.expect_register().times(0);

    let store = store(api, &storage);
    let error = store
        .register(&register_form("secret1", "secret2"))
        .await
        .unwrap_err();
    assert_eq!(error.user_message(), "Passwords do not match");
}

#[tokio::test]
async fn register_persists_token() {
    let storage = Arc::new(MemoryTokenStorage::new());
    let mut api = MockAuthApi::new();
    api.expect_register()
        .times(1)
        .returning(|email, _, name| {
            assert_eq!(name, "Ada");
            Ok(AuthSuccess {
                token: "issued".to_string(),
                user: user(email),
            })
        });

    let store = store(api, &storage);
    store.init(None).await.unwrap();

    let registered = store
        .register(&register_form("secret1", "secret1"))
        .await
        .unwrap();
    assert_eq!(registered.email, "ada@example.com");
    assert_eq!(store.state().gate(), RouteGate::Allow);
    assert_eq!(storage.load().unwrap().as_deref(), Some("issued"));
}

#[tokio::test]
async fn login_failure_keeps_state_and_message() {
    let storage = Arc::new(MemoryTokenStorage::new());
    let mut api = MockAuthApi::new();
    api.expect_login()
        .returning(|_, _| Err(ClientError::Rejected("Invalid email or password".to_string())));

    let store = store(api, &storage);
    store.init(None).await.unwrap();

    let form = LoginForm {
        email: "ada@example.com".to_string(),
        password: "wrong".to_string(),
    };
    let error = store.login(&form).await.unwrap_err();
    assert_eq!(error.user_message(), "Invalid email or password");
    assert_eq!(store.state(), AuthState::Unauthenticated);
    assert_eq!(storage.load().unwrap(), None);
}

#[tokio::test]
async fn login_network_failure_uses_generic_message() {
    let storage = Arc::new(MemoryTokenStorage::new());
    let mut api = MockAuthApi::new();
    api.expect_login()
        .returning(|_, _| Err(ClientError::Network("connection refused".to_string())));

    let store = store(api, &storage);
    let form = LoginForm {
        email: "ada@example.com".to_string(),
        password: "secret1".to_string(),
    };
    let error = store.login(&form).await.unwrap_err();
    assert_eq!(error.user_message(), NETWORK_ERROR_MESSAGE);
}

#[tokio::test]
async fn logout_clears_everything() {
    let storage = Arc::new(MemoryTokenStorage::with_token("stored"));
    let mut api = MockAuthApi::new();
    api.expect_me().returning(|_| Ok(user("ada@example.com")));

    let store = store(api, &storage);
    let mut changes = store.subscribe();
    store.init(None).await.unwrap();
    assert!(changes.borrow_and_update().is_authenticated());

    store.logout();
    assert!(changes.has_changed().unwrap());
    assert_eq!(*changes.borrow(), AuthState::Unauthenticated);
    assert_eq!(storage.load().unwrap(), None);
}

/// `me` that never completes
struct PendingApi;

#[async_trait]
impl AuthApi for PendingApi {
    async fn me(&self, _token: &str) -> Result<UserResponse, ClientError> {
        std::future::pending().await
    }

    async fn login(&self, _email: &str, _password: &str) -> Result<AuthSuccess, ClientError> {
        std::future::pending().await
    }

    async fn register(
        &self,
        _email: &str,
        _password: &str,
        _name: &str,
    ) -> Result<AuthSuccess, ClientError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn dispose_cancels_pending_init() {
    let storage = Arc::new(MemoryTokenStorage::with_token("stored"));
    let store = AuthStore::new(Arc::new(PendingApi), storage.clone());

    let (result, _) = tokio::join!(store.init(None), async {
        tokio::task::yield_now().await;
        store.dispose();
    });

    assert!(matches!(result, Err(ClientError::Disposed)));
    assert!(store.is_disposed());
    assert!(store.state().is_loading());
    assert_eq!(storage.load().unwrap().as_deref(), Some("stored"));

    store.logout();
    assert!(store.state().is_loading());
    assert_eq!(storage.load().unwrap().as_deref(), Some("stored"));
}
