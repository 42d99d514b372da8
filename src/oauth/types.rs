//! Values produced by the authorization flow

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Seconds before the real expiry at which a token counts as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Outcome of a successful authorization redirect
///
/// Consumed by [`OAuthFlow::obtain_new_token`](super::OAuthFlow::obtain_new_token).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResult {
    /// One-time authorization code
    pub code: Option<String>,

    /// `state` echoed back by the server
    pub state: Option<String>,

    /// Lifetime of the code in seconds (0 when not reported)
    #[serde(default)]
    pub expires_in: u64,
}

/// Access token issued by the token endpoint
///
/// Missing response fields stay `None`/0. A refresh yields a new `Token`;
/// the old one is never modified.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Bearer credential for API calls
    #[serde(default)]
    pub access_token: Option<String>,

    /// Token type (usually "bearer")
    #[serde(default)]
    pub token_type: Option<String>,

    /// Long-lived credential for [`OAuthFlow::refresh_token`](super::OAuthFlow::refresh_token)
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Lifetime in seconds (0 when not reported)
    #[serde(default)]
    pub expires_in: u64,

    /// When the flow received the token
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Token")
            .field("access_token", &redact(&self.access_token))
            .field("token_type", &self.token_type)
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expires_in", &self.expires_in)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

impl Token {
    /// Build a token from a decoded token endpoint body
    pub(crate) fn from_json(body: &Map<String, Value>, issued_at: DateTime<Utc>) -> Self {
        Self {
            access_token: string_field(body, "access_token"),
            token_type: string_field(body, "token_type"),
            refresh_token: string_field(body, "refresh_token"),
            expires_in: u64_field(body, "expires_in").unwrap_or(0),
            issued_at: Some(issued_at),
        }
    }

    /// Absolute expiry, if both lifetime and issue time are known
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.expires_in == 0 {
            return None;
        }
        let lifetime = i64::try_from(self.expires_in).ok()?;
        self.issued_at
            .and_then(|at| at.checked_add_signed(Duration::seconds(lifetime)))
    }

    /// Check if the token is expired (with 60 second buffer)
    ///
    /// Tokens without a known expiry never count as expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at().is_some_and(|expires_at| {
            Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= expires_at
        })
    }

    /// `Authorization` header value for API calls
    #[must_use]
    pub fn bearer_header(&self) -> Option<String> {
        self.access_token.as_ref().map(|t| format!("Bearer {t}"))
    }
}

/// Read a string field; numbers are rendered as text
pub(crate) fn string_field(body: &Map<String, Value>, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read an unsigned integer that may be sent as a number or a numeric string
fn u64_field(body: &Map<String, Value>, key: &str) -> Option<u64> {
    match body.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
