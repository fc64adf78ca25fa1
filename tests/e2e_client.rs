//! E2E tests for the client auth library against a live server

mod common;

use std::sync::Arc;

use cloudbox::client::{
    AuthApi, AuthState, AuthStore, ClientError, HttpAuthApi, LoginForm, MemoryTokenStorage,
    RegisterForm, RouteGate, TokenStorage,
};
use common::{TEST_PASSWORD, TestServer};
use url::Url;

fn api(server: &TestServer) -> Arc<HttpAuthApi> {
    Arc::new(HttpAuthApi::new(&server.addr).unwrap())
}

#[tokio::test]
async fn test_register_then_restore_session() {
    let server = TestServer::new().await;
    let storage = Arc::new(MemoryTokenStorage::new());

    let store = AuthStore::new(api(&server), storage.clone());
    assert_eq!(store.init(None).await.unwrap(), AuthState::Unauthenticated);

    let form = RegisterForm {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        password: TEST_PASSWORD.to_string(),
        confirm_password: TEST_PASSWORD.to_string(),
    };
    let user = store.register(&form).await.unwrap();
    assert_eq!(user.name, "Ada");
    assert_eq!(store.state().gate(), RouteGate::Allow);

    // A fresh store picks the persisted token back up
    let restored = AuthStore::new(api(&server), storage.clone());
    let state = restored.init(None).await.unwrap();
    assert_eq!(state.user().map(|u| u.id.as_str()), Some(user.id.as_str()));

    restored.logout();
    assert_eq!(storage.load().unwrap(), None);
}

#[tokio::test]
async fn test_invalid_stored_token_is_discarded() {
    let server = TestServer::new().await;
    let storage = Arc::new(MemoryTokenStorage::with_token("forged.token"));

    let store = AuthStore::new(api(&server), storage.clone());
    assert_eq!(store.init(None).await.unwrap(), AuthState::Unauthenticated);
    assert_eq!(storage.load().unwrap(), None);
}

#[tokio::test]
async fn test_login_failure_surfaces_server_message() {
    let server = TestServer::new().await;
    server.register_user("ada@example.com", "Ada").await;

    let store = AuthStore::new(api(&server), Arc::new(MemoryTokenStorage::new()));
    store.init(None).await.unwrap();

    let form = LoginForm {
        email: "ada@example.com".to_string(),
        password: "wrong-password".to_string(),
    };
    let error = store.login(&form).await.unwrap_err();
    assert!(matches!(error, ClientError::Rejected(_)));
    assert_eq!(error.user_message(), "Invalid email or password");
    assert_eq!(store.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_oauth_landing_token_is_adopted() {
    let server = TestServer::new().await;
    let (token, user) = server.register_user("ada@example.com", "Ada").await;
    let storage = Arc::new(MemoryTokenStorage::new());

    let store = AuthStore::new(api(&server), storage.clone());
    let mut url = Url::parse("http://localhost:5173/auth/success").unwrap();
    url.query_pairs_mut().append_pair("token", &token);

    let state = store.init(Some(&mut url)).await.unwrap();
    assert_eq!(state.user().unwrap().email, user["email"]);
    assert_eq!(storage.load().unwrap(), Some(token));
    assert_eq!(url.as_str(), "http://localhost:5173/auth/success");
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let api = HttpAuthApi::new("http://127.0.0.1:9").unwrap();

    let error = api.login("ada@example.com", TEST_PASSWORD).await.unwrap_err();
    assert!(matches!(error, ClientError::Network(_)));
}

#[tokio::test]
async fn test_server_validation_reaches_user_as_rejection() {
    let server = TestServer::new().await;
    let api = HttpAuthApi::new(&server.addr).unwrap();

    let error = api
        .register("ada@example.com", "12345", "Ada")
        .await
        .unwrap_err();
    assert!(matches!(error, ClientError::Rejected(_)));
    assert_eq!(error.user_message(), "Password must be at least 6 characters");
}
