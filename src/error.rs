//! Error types for the OAuth client
//!
//! Two OAuth failure families sit under the crate-wide [`Error`]:
//! [`AuthorizationCodeError`] comes from parsing the redirect, and
//! [`TokenError`] comes from the token endpoint's `error` field.

use std::io;

use thiserror::Error;

/// Result type alias for the OAuth client
pub type Result<T> = std::result::Result<T, Error>;

/// OAuth client errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (fatal, reported at construction)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required argument was missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The authorization server redirected back with an error
    #[error("Authorization error: {0}")]
    AuthorizationCode(#[from] AuthorizationCodeError),

    /// The token endpoint rejected the request
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Errors reported through the `error` query parameter of the redirect
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationCodeError {
    /// The user (or server) denied the request
    #[error("access_denied: {0}")]
    AccessDenied(String),

    /// `response_type=code` is not supported for this client
    #[error("unsupported_response_type: {0}")]
    UnsupportedResponseType(String),

    /// One of the requested scopes is unknown or not allowed
    #[error("invalid_scope: {0}")]
    InvalidScope(String),

    /// Any other error code
    #[error("{code}: {description}")]
    Other {
        /// Raw `error` value
        code: String,
        /// Human-readable description
        description: String,
    },
}

impl AuthorizationCodeError {
    /// Classify an `error` code from the redirect query
    pub fn from_code(code: &str, description: impl Into<String>) -> Self {
        let description = description.into();
        match code {
            "access_denied" => Self::AccessDenied(description),
            "unsupported_response_type" => Self::UnsupportedResponseType(description),
            "invalid_scope" => Self::InvalidScope(description),
            other => Self::Other {
                code: other.to_string(),
                description,
            },
        }
    }

    /// The OAuth error code this variant stands for
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::AccessDenied(_) => "access_denied",
            Self::UnsupportedResponseType(_) => "unsupported_response_type",
            Self::InvalidScope(_) => "invalid_scope",
            Self::Other { code, .. } => code,
        }
    }

    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::AccessDenied(d) | Self::UnsupportedResponseType(d) | Self::InvalidScope(d) => d,
            Self::Other { description, .. } => description,
        }
    }
}

/// Errors reported by the token endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed request (missing parameter, bad hash, ...)
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    /// Client authentication failed
    #[error("invalid_client: {0}")]
    InvalidClient(String),

    /// Code or refresh token is invalid, expired or revoked
    #[error("invalid_grant: {0}")]
    InvalidGrant(String),

    /// Grant type not supported by the server
    #[error("unsupported_grant_type: {0}")]
    UnsupportedGrantType(String),

    /// Anything else, including responses without an `error` field
    #[error("{0}")]
    Other(String),
}

impl TokenError {
    /// Classify an `error` code from a token endpoint response
    pub fn from_code(code: Option<&str>, description: impl Into<String>) -> Self {
        let description = description.into();
        match code {
            Some("invalid_request") => Self::InvalidRequest(description),
            Some("invalid_client") => Self::InvalidClient(description),
            Some("invalid_grant") => Self::InvalidGrant(description),
            Some("unsupported_grant_type") => Self::UnsupportedGrantType(description),
            _ => Self::Other(description),
        }
    }

    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::InvalidRequest(d)
            | Self::InvalidClient(d)
            | Self::InvalidGrant(d)
            | Self::UnsupportedGrantType(d)
            | Self::Other(d) => d,
        }
    }
}
