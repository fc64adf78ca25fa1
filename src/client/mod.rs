//! Front-end authentication library
//!
//! Everything a dashboard client needs to stay signed in against the
//! CloudBox API:
//!
//! - [`AuthStore`]: the `Loading` / `Unauthenticated` / `Authenticated`
//!   state machine, observable through a `watch` channel
//! - [`HttpAuthApi`]: reqwest client for `/api/auth/*`
//! - [`TokenStorage`]: where the session token survives restarts
//! - form validation and OAuth callback handling
//!
//! ```no_run
//! # async fn run() -> Result<(), cloudbox::client::ClientError> {
//! use std::sync::Arc;
//! use cloudbox::client::{AuthStore, HttpAuthApi, MemoryTokenStorage};
//!
//! let api = HttpAuthApi::new("http://localhost:3001")?;
//! let store = AuthStore::new(Arc::new(api), Arc::new(MemoryTokenStorage::new()));
//! let state = store.init(None).await?;
//! println!("{:?}", state.gate());
//! # Ok(())
//! # }
//! ```

mod api;
mod callback;
mod error;
mod state;
mod storage;
mod store;
mod validation;

#[cfg(test)]
mod store_test;

pub use api::{AuthApi, AuthSuccess, DEFAULT_TIMEOUT, HttpAuthApi};
pub use callback::{OAUTH_SUCCESS_PATH, OAUTH_TOKEN_PARAM, take_oauth_token};
pub use error::{ClientError, NETWORK_ERROR_MESSAGE};
pub use state::{AuthState, RouteGate};
pub use storage::{FileTokenStorage, MemoryTokenStorage, TOKEN_STORAGE_KEY, TokenStorage};
pub use store::AuthStore;
pub use validation::{LoginForm, RegisterForm};
