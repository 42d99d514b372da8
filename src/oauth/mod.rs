//! OAuth 2.0 authorization-code flow
//!
//! Features:
//! - Authorization URL construction with comma-joined access scopes
//! - Redirect parsing with typed `error` handling
//! - Code exchange and refresh, proving the client secret with a
//!   SHA-256 hash instead of sending it
//! - Token revocation
//! - Loopback callback listener and on-disk token storage for CLIs

mod callback;
mod flow;
mod scope;
mod storage;
mod types;

pub use callback::CallbackListener;
pub use flow::OAuthFlow;
pub use scope::{AccessScope, ScopeSet};
pub use storage::TokenStorage;
pub use types::{AuthorizationResult, Token};
