//! Spreadsheet API OAuth Client
//!
//! Obtains user-delegated access tokens for the hosted spreadsheet API
//! through the OAuth2 authorization-code grant.
//!
//! # Features
//!
//! - **Authorization URLs**: scope sets rendered in a stable order
//! - **Redirect parsing**: server-reported errors mapped to typed variants
//! - **Token exchange & refresh**: client secret proven by hash, never sent
//! - **Revocation**: invalidate an access token at the token endpoint
//! - **Pluggable transport**: any [`transport::HttpTransport`], reqwest by default
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> gridsheet_oauth::Result<()> {
//! use gridsheet_oauth::config::Config;
//! use gridsheet_oauth::oauth::{AccessScope, OAuthFlow, ScopeSet};
//!
//! let config = Config::load(None)?;
//! let flow = OAuthFlow::from_config(&config)?;
//!
//! let scopes = ScopeSet::from([AccessScope::ReadSheets, AccessScope::WriteSheets]);
//! let url = flow.new_authorization_url(&scopes, Some("csrf-state"))?;
//! println!("Visit {url}");
//!
//! // ... the user is redirected back to the registered redirect URI ...
//! let result = flow.extract_authorization_result("https://app.example.com/cb?code=ABC&state=csrf-state")?;
//! let token = flow.obtain_new_token(&result).await?;
//! let token = flow.refresh_token(&token).await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod oauth;
pub mod transport;

pub use error::{AuthorizationCodeError, Error, Result, TokenError};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        Some("json") => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    installed.map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))
}
