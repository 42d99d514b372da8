//! Authorization-code flow
//!
//! Builds the authorization URL, parses the redirect, and trades codes and
//! refresh tokens for access tokens. The flow keeps no per-call state; one
//! instance can serve any number of concurrent exchanges.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;
use url::{Url, form_urlencoded};

use super::scope::ScopeSet;
use super::types::{AuthorizationResult, Token, string_field};
use crate::config::{ClientConfig, Config};
use crate::error::{AuthorizationCodeError, TokenError};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
use crate::{Error, Result};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Grant types understood by the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrantType {
    AuthorizationCode,
    RefreshToken,
}

impl GrantType {
    fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        }
    }

    /// Query parameter carrying the grant material
    fn material_param(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "code",
            Self::RefreshToken => "refresh_token",
        }
    }
}

/// OAuth2 authorization-code flow against a fixed pair of endpoints
#[derive(Clone)]
pub struct OAuthFlow {
    /// Client registration (validated, never mutated)
    config: Arc<ClientConfig>,

    /// Transport used for token endpoint calls
    transport: Arc<dyn HttpTransport>,
}

impl OAuthFlow {
    /// Create a flow
    ///
    /// Fails with [`Error::Config`] when the client id, secret or redirect
    /// URI is empty, or an endpoint is not an absolute URL.
    pub fn new(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }

    /// Create a flow with the reqwest transport configured from `config.http`
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.http)?;
        Self::new(config.client.clone(), transport)
    }

    /// Client configuration in use
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the URL the user visits to grant access
    ///
    /// Scope names are comma-joined in insertion order. A missing `state`
    /// is sent as an empty value.
    pub fn new_authorization_url(&self, scopes: &ScopeSet, state: Option<&str>) -> Result<String> {
        if scopes.is_empty() {
            return Err(Error::invalid_argument("at least one access scope is required"));
        }

        Ok(append_query(
            &self.config.authorization_url,
            &[
                ("response_type", "code".to_string()),
                ("client_id", encode(&self.config.client_id)),
                ("redirect_uri", encode(&self.config.redirect_uri)),
                ("state", encode(state.unwrap_or_default())),
                ("scope", scopes.to_param()),
            ],
        ))
    }

    /// Parse the URL the authorization server redirected the user to
    ///
    /// An `error` parameter becomes an [`AuthorizationCodeError`]; nothing
    /// is sent over the network.
    pub fn extract_authorization_result(&self, redirect_url: &str) -> Result<AuthorizationResult> {
        let redirect_url = redirect_url.trim();
        if redirect_url.is_empty() {
            return Err(Error::invalid_argument("redirect URL must not be empty"));
        }

        let url = Url::parse(redirect_url)
            .map_err(|e| Error::invalid_argument(format!("redirect URL is not a valid URL: {e}")))?;

        // Later duplicates overwrite earlier ones
        let mut params: HashMap<String, String> = url.query_pairs().into_owned().collect();

        if let Some(code) = params.remove("error") {
            let description = params
                .remove("error_description")
                .unwrap_or_else(|| code.clone());
            return Err(AuthorizationCodeError::from_code(&code, description).into());
        }

        let expires_in = match params.get("expires_in") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::invalid_argument(format!("expires_in is not a number: {raw}"))
            })?,
            None => 0,
        };

        Ok(AuthorizationResult {
            code: params.remove("code"),
            state: params.remove("state"),
            expires_in,
        })
    }

    /// Exchange an authorization code for a token
    pub async fn obtain_new_token(&self, result: &AuthorizationResult) -> Result<Token> {
        // A missing code is left for the server to reject
        let code = result.code.as_deref().unwrap_or_default();
        self.request_token(GrantType::AuthorizationCode, code).await
    }

    /// Trade a token's refresh token for a new token
    pub async fn refresh_token(&self, token: &Token) -> Result<Token> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::invalid_argument("token has no refresh token"))?;
        self.request_token(GrantType::RefreshToken, refresh_token).await
    }

    /// Revoke a token's access token at the token endpoint
    pub async fn revoke_access_token(&self, token: &Token) -> Result<()> {
        let access_token = token
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::invalid_argument("token has no access token"))?;

        let request = HttpRequest::new(Method::DELETE, self.config.token_url.clone())
            .header("Authorization", format!("Bearer {access_token}"));

        debug!(endpoint = %self.config.token_url, "Revoking access token");
        let response = self.transport.send(request).await?;

        if response.status == 200 {
            debug!("Access token revoked");
            Ok(())
        } else {
            Err(classify_error(&response).into())
        }
    }

    /// URL for a token endpoint call; every parameter travels in the query
    fn token_url(&self, grant: GrantType, material: &str) -> String {
        let hash = verification_hash(&self.config.client_secret, material);
        append_query(
            &self.config.token_url,
            &[
                ("grant_type", grant.as_str().to_string()),
                ("client_id", encode(&self.config.client_id)),
                (grant.material_param(), encode(material)),
                ("redirect_uri", encode(&self.config.redirect_uri)),
                ("hash", hash),
            ],
        )
    }

    /// POST to the token endpoint and decode the answer
    async fn request_token(&self, grant: GrantType, material: &str) -> Result<Token> {
        let request = HttpRequest::new(Method::POST, self.token_url(grant, material))
            .header("Content-Type", FORM_CONTENT_TYPE);

        debug!(grant_type = grant.as_str(), endpoint = %self.config.token_url, "Requesting token");
        let response = self.transport.send(request).await?;

        if response.status != 200 {
            return Err(classify_error(&response).into());
        }

        let body: Map<String, Value> = serde_json::from_slice(&response.body)?;
        let token = Token::from_json(&body, Utc::now());

        debug!(
            grant_type = grant.as_str(),
            expires_in = token.expires_in,
            has_refresh_token = token.refresh_token.is_some(),
            "Token received"
        );
        Ok(token)
    }
}

/// Lowercase hex SHA-256 of `secret|material`
fn verification_hash(secret: &str, material: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b"|");
    hasher.update(material.as_bytes());
    hex::encode(hasher.finalize().as_slice())
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Append already-encoded pairs to `base`, keeping their order
fn append_query(base: &str, params: &[(&str, String)]) -> String {
    let query = params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{query}")
}

/// Map a non-200 token endpoint response to a [`TokenError`]
fn classify_error(response: &HttpResponse) -> TokenError {
    let Ok(body) = serde_json::from_slice::<Map<String, Value>>(&response.body) else {
        return TokenError::Other(format!("HTTP {}: {}", response.status, response.text().trim()));
    };

    let code = string_field(&body, "error");
    debug!(status = response.status, error = ?code, "Token endpoint returned an error");

    let description = string_field(&body, "error_description")
        .or_else(|| code.clone())
        .unwrap_or_else(|| format!("HTTP {}", response.status));

    TokenError::from_code(code.as_deref(), description)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::oauth::AccessScope;

    /// Transport that must never be reached
    struct Unreachable;

    #[async_trait]
    impl HttpTransport for Unreachable {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse> {
            Err(Error::Transport("unexpected network call".to_string()))
        }
    }

    fn flow() -> OAuthFlow {
        let config = ClientConfig::new("client-1", "s3cr3t", "https://app.example.com/cb?x=1")
            .with_endpoints("https://auth.example.com/authorize", "https://api.example.com/token");
        OAuthFlow::new(config, Arc::new(Unreachable)).unwrap()
    }

    #[test]
    fn verification_hash_matches_known_vector() {
        assert_eq!(
            verification_hash("s3cr3t", "abc123"),
            "c964e1bddb3922a0498d5a1ba36ff7d4747d60e2d291e9a936db0ef76b4a5b20"
        );
    }

    #[test]
    fn append_query_respects_existing_query() {
        assert_eq!(
            append_query("https://h/p", &[("a", "1".to_string())]),
            "https://h/p?a=1"
        );
        assert_eq!(
            append_query("https://h/p?x=y", &[("a", "1".to_string()), ("b", "2".to_string())]),
            "https://h/p?x=y&a=1&b=2"
        );
    }

    #[test]
    fn authorization_url_layout() {
        let scopes = ScopeSet::from([AccessScope::ReadSheets, AccessScope::WriteSheets]);
        let url = flow().new_authorization_url(&scopes, Some("xyz")).unwrap();

        assert_eq!(
            url,
            "https://auth.example.com/authorize?response_type=code&client_id=client-1\
             &redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb%3Fx%3D1&state=xyz\
             &scope=READ_SHEETS,WRITE_SHEETS"
        );
    }

    #[test]
    fn authorization_url_without_state_sends_empty_state() {
        let scopes = ScopeSet::from([AccessScope::ReadSheets]);
        let url = flow().new_authorization_url(&scopes, None).unwrap();
        assert!(url.contains("&state=&scope=READ_SHEETS"));
        assert!(!url.ends_with(','));
    }

    #[test]
    fn authorization_url_requires_scopes() {
        let result = flow().new_authorization_url(&ScopeSet::new(), Some("xyz"));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn token_url_layout() {
        let url = flow().token_url(GrantType::AuthorizationCode, "abc123");
        assert_eq!(
            url,
            "https://api.example.com/token?grant_type=authorization_code&client_id=client-1\
             &code=abc123&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb%3Fx%3D1\
             &hash=c964e1bddb3922a0498d5a1ba36ff7d4747d60e2d291e9a936db0ef76b4a5b20"
        );

        let url = flow().token_url(GrantType::RefreshToken, "RT");
        assert!(url.contains("grant_type=refresh_token&client_id=client-1&refresh_token=RT&"));
        assert!(url.ends_with(&format!("hash={}", verification_hash("s3cr3t", "RT"))));
    }

    #[test]
    fn redirect_with_code() {
        let result = flow()
            .extract_authorization_result("https://app/cb?code=ABC&state=xyz&expires_in=600")
            .unwrap();
        assert_eq!(
            result,
            AuthorizationResult {
                code: Some("ABC".to_string()),
                state: Some("xyz".to_string()),
                expires_in: 600,
            }
        );
    }

    #[test]
    fn redirect_without_expiry_defaults_to_zero() {
        let result = flow().extract_authorization_result("https://app/cb?code=ABC").unwrap();
        assert_eq!(result.expires_in, 0);
        assert_eq!(result.state, None);
    }

    #[test]
    fn redirect_duplicate_key_last_wins() {
        let result = flow()
            .extract_authorization_result("https://app/cb?code=first&code=second")
            .unwrap();
        assert_eq!(result.code.as_deref(), Some("second"));
    }

    #[test]
    fn redirect_errors_are_typed() {
        let flow = flow();
        let cases = [
            ("access_denied", "access_denied"),
            ("unsupported_response_type", "unsupported_response_type"),
            ("invalid_scope", "invalid_scope"),
            ("server_error", "server_error"),
        ];
        for (raw, expected) in cases {
            let err = flow
                .extract_authorization_result(&format!("https://app/cb?error={raw}"))
                .unwrap_err();
            match err {
                Error::AuthorizationCode(e) => assert_eq!(e.code(), expected),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn redirect_error_uses_description_when_present() {
        let err = flow()
            .extract_authorization_result(
                "https://app/cb?error=access_denied&error_description=User+said+no",
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AuthorizationCode(AuthorizationCodeError::AccessDenied(ref d)) if d == "User said no"
        ));
    }

    #[test]
    fn redirect_rejects_bad_input() {
        let flow = flow();
        assert!(matches!(
            flow.extract_authorization_result(""),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            flow.extract_authorization_result("not a url"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            flow.extract_authorization_result("https://app/cb?code=A&expires_in=soon"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn classify_non_json_body() {
        let err = classify_error(&HttpResponse::new(502, "Bad Gateway"));
        assert_eq!(err, TokenError::Other("HTTP 502: Bad Gateway".to_string()));
    }

    #[test]
    fn classify_without_description_falls_back_to_code() {
        let err = classify_error(&HttpResponse::new(400, r#"{"error":"invalid_client"}"#));
        assert_eq!(err, TokenError::InvalidClient("invalid_client".to_string()));

        let err = classify_error(&HttpResponse::new(500, "{}"));
        assert_eq!(err, TokenError::Other("HTTP 500".to_string()));
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_fails_before_io() {
        let result = flow().refresh_token(&Token::default()).await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn revoke_without_access_token_fails_before_io() {
        let result = flow().revoke_access_token(&Token::default()).await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn flow_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<OAuthFlow>();
    }
}
