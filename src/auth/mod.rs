//! Authentication
//!
//! Handles:
//! - Signed session tokens
//! - Password hashing
//! - Bearer-token middleware
//! - Google/GitHub OAuth flow

mod middleware;
pub mod oauth;
pub mod password;
pub mod session;

pub use middleware::{CurrentUser, require_auth};
pub use oauth::oauth_router;
pub use session::{Session, create_session_token, issue_token, verify_session_token};
