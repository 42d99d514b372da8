//! Configuration management

use std::{env, fmt, path::Path, path::PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Authorization endpoint of the hosted service
pub const DEFAULT_AUTHORIZATION_URL: &str = "https://app.smartsheet.com/b/authorize";

/// Token endpoint of the hosted service
pub const DEFAULT_TOKEN_URL: &str = "https://api.smartsheet.com/2.0/token";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OAuth client registration
    pub client: ClientConfig,
    /// HTTP transport settings
    pub http: HttpConfig,
    /// Where the CLI keeps the current token (default `~/.gridsheet/token.json`)
    pub token_file: Option<PathBuf>,
}

/// OAuth client registration and endpoints
///
/// Immutable once handed to [`OAuthFlow`](crate::oauth::OAuthFlow).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Client identifier issued by the developer portal
    pub client_id: String,

    /// Client secret. Supports a literal value or `env:VAR_NAME`
    pub client_secret: String,

    /// Redirect URI registered for the client
    pub redirect_uri: String,

    /// Authorization endpoint URL
    pub authorization_url: String,

    /// Token endpoint URL
    pub token_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            authorization_url: DEFAULT_AUTHORIZATION_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

// Keeps the secret out of logs and panic messages
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("authorization_url", &self.authorization_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl ClientConfig {
    /// Create a client configuration against the default endpoints
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            ..Self::default()
        }
    }

    /// Override the authorization and token endpoints
    #[must_use]
    pub fn with_endpoints(
        mut self,
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.authorization_url = authorization_url.into();
        self.token_url = token_url.into();
        self
    }

    /// Check the invariants the flow relies on
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("redirect_uri", &self.redirect_uri),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{name} must not be empty")));
            }
        }

        for (name, value) in [
            ("authorization_url", &self.authorization_url),
            ("token_url", &self.token_url),
        ] {
            let url = Url::parse(value)
                .map_err(|e| Error::Config(format!("{name} is not a valid URL ({value}): {e}")))?;
            // Query parameters are appended to the end of the URL
            if url.fragment().is_some() {
                return Err(Error::Config(format!("{name} must not contain a fragment ({value})")));
            }
        }

        Ok(())
    }

    /// Expand an `env:VAR_NAME` client secret
    fn resolve_secret(&mut self) -> Result<()> {
        if let Some(var_name) = self.client_secret.strip_prefix("env:") {
            self.client_secret = env::var(var_name).map_err(|_| {
                Error::Config(format!("client_secret refers to unset variable {var_name}"))
            })?;
        }
        Ok(())
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("gridsheet-oauth/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Environment variables use the `GRIDSHEET_` prefix and `__` as the
    /// nesting separator, e.g. `GRIDSHEET_CLIENT__CLIENT_ID`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed("GRIDSHEET_").split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.client.resolve_secret()?;

        Ok(config)
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.client.validate()?;
        if self.http.timeout_secs == 0 {
            return Err(Error::Config("http.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Token file location, falling back to `~/.gridsheet/token.json`
    pub fn token_file_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.token_file {
            return Ok(path.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(".gridsheet").join("token.json"))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn valid_client() -> ClientConfig {
        ClientConfig::new("client-1", "s3cr3t", "https://app.example.com/callback")
    }

    #[test]
    fn defaults_point_at_hosted_endpoints() {
        let config = Config::default();
        assert_eq!(config.client.authorization_url, DEFAULT_AUTHORIZATION_URL);
        assert_eq!(config.client.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.http.timeout_secs, 30);
        assert!(config.http.user_agent.starts_with("gridsheet-oauth/"));
    }

    #[test]
    fn valid_client_passes() {
        assert!(valid_client().validate().is_ok());
    }

    #[test]
    fn empty_fields_are_config_errors() {
        let mut client = valid_client();
        client.client_id = String::new();
        assert!(matches!(client.validate(), Err(Error::Config(m)) if m.contains("client_id")));

        let mut client = valid_client();
        client.client_secret = "  ".to_string();
        assert!(matches!(client.validate(), Err(Error::Config(m)) if m.contains("client_secret")));

        let mut client = valid_client();
        client.redirect_uri = String::new();
        assert!(matches!(client.validate(), Err(Error::Config(m)) if m.contains("redirect_uri")));
    }

    #[test]
    fn relative_endpoint_is_rejected() {
        let client = valid_client().with_endpoints("/authorize", DEFAULT_TOKEN_URL);
        assert!(matches!(client.validate(), Err(Error::Config(m)) if m.contains("authorization_url")));
    }

    #[test]
    fn endpoint_with_fragment_is_rejected() {
        let client = valid_client()
            .with_endpoints(DEFAULT_AUTHORIZATION_URL, "https://api.example.com/token#frag");
        assert!(matches!(client.validate(), Err(Error::Config(m)) if m.contains("fragment")));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let rendered = format!("{:?}", valid_client());
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn load_reads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "client:\n  client_id: yaml-id\n  client_secret: yaml-secret\n  redirect_uri: https://app.example.com/cb\nhttp:\n  timeout_secs: 5\ntoken_file: /tmp/gridsheet-token.json"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.client.client_id, "yaml-id");
        assert_eq!(config.client.client_secret, "yaml-secret");
        assert_eq!(config.client.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(
            config.token_file_path().unwrap(),
            PathBuf::from("/tmp/gridsheet-token.json")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_missing_file_fails() {
        let result = Config::load(Some(Path::new("/nonexistent/gridsheet.yaml")));
        assert!(matches!(result, Err(Error::Config(m)) if m.contains("not found")));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = Config {
            client: valid_client(),
            http: HttpConfig {
                timeout_secs: 0,
                ..HttpConfig::default()
            },
            token_file: None,
        };
        assert!(config.validate().is_err());
    }
}
