//! OAuth Callback Listener
//!
//! A minimal loopback HTTP server that receives the browser redirect and
//! hands the full redirect URL back to the caller, which feeds it to
//! [`OAuthFlow::extract_authorization_result`](super::OAuthFlow::extract_authorization_result).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{OriginalUri, State},
    response::Html,
    routing::get,
};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info};
use url::{Url, form_urlencoded};

use crate::{Error, Result};

/// State shared with the callback handler
struct CallbackState {
    /// `scheme://host:port` prefix for rebuilding the redirect URL
    origin: String,
    tx: Option<oneshot::Sender<String>>,
}

/// A bound, not yet serving, callback listener
pub struct CallbackListener {
    listener: TcpListener,
    origin: String,
    path: String,
}

impl CallbackListener {
    /// Bind to the host, port and path of a loopback redirect URI
    ///
    /// The redirect URI must be plain `http` on `127.0.0.1`, `localhost`
    /// or `[::1]`. Port 0 binds an ephemeral port; read the real one back
    /// from [`redirect_uri`](Self::redirect_uri).
    pub async fn bind(redirect_uri: &str) -> Result<Self> {
        let url = Url::parse(redirect_uri)
            .map_err(|e| Error::Config(format!("Invalid redirect URI {redirect_uri}: {e}")))?;

        if url.scheme() != "http" {
            return Err(Error::Config(format!(
                "Callback listener needs an http:// redirect URI, got {redirect_uri}"
            )));
        }

        let ip: IpAddr = match url.host_str() {
            Some("127.0.0.1" | "localhost") => Ipv4Addr::LOCALHOST.into(),
            Some("[::1]") => Ipv6Addr::LOCALHOST.into(),
            _ => {
                return Err(Error::Config(format!(
                    "Callback listener needs a loopback redirect URI, got {redirect_uri}"
                )));
            }
        };
        let port = url.port_or_known_default().unwrap_or(80);

        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let actual_port = listener.local_addr()?.port();

        let host = url.host_str().unwrap_or("127.0.0.1");
        let origin = format!("http://{host}:{actual_port}");
        let path = url.path().to_string();

        info!(url = %format!("{origin}{path}"), "OAuth callback listener bound");
        Ok(Self {
            listener,
            origin,
            path,
        })
    }

    /// Redirect URI served by this listener, with the bound port
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}{}", self.origin, self.path)
    }

    /// Serve until the first redirect arrives and return its full URL
    pub async fn wait_for_redirect(self, timeout: Duration) -> Result<String> {
        let (tx, rx) = oneshot::channel();

        let state = Arc::new(Mutex::new(CallbackState {
            origin: self.origin,
            tx: Some(tx),
        }));

        let app = Router::new()
            .route(&self.path, get(handle_callback))
            .with_state(state);

        let listener = self.listener;
        let server = tokio::spawn(async move { axum::serve(listener, app).await });

        let result = tokio::time::timeout(timeout, rx).await;
        server.abort();

        match result {
            Ok(Ok(redirect)) => Ok(redirect),
            Ok(Err(_)) => Err(Error::Transport(
                "Callback channel closed unexpectedly".to_string(),
            )),
            Err(_) => Err(Error::Transport(format!(
                "No authorization redirect within {}s",
                timeout.as_secs()
            ))),
        }
    }
}

/// Handle the OAuth callback
async fn handle_callback(
    State(state): State<Arc<Mutex<CallbackState>>>,
    OriginalUri(uri): OriginalUri,
) -> Html<String> {
    let mut state = state.lock().await;
    let redirect = format!("{}{}", state.origin, uri);

    let error = uri.query().and_then(|q| {
        form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == "error")
            .map(|(_, v)| v.into_owned())
    });
    debug!(has_error = error.is_some(), "Received OAuth redirect");

    if let Some(tx) = state.tx.take() {
        let _ = tx.send(redirect);
    }

    match error {
        Some(code) => Html(error_page(&code)),
        None => Html(success_page()),
    }
}

fn success_page() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>Authorization Received</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 4rem;">
    <h1>Authorization Received</h1>
    <p>You can close this window and return to the terminal.</p>
</body>
</html>"#
        .to_string()
}

fn error_page(error: &str) -> String {
    let error = html_escape(error);
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Authorization Failed</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 4rem;">
    <h1>Authorization Failed</h1>
    <p>Error: <code>{error}</code></p>
</body>
</html>"#
    )
}

fn html_escape(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '&' => "&amp;".to_string(),
            '"' => "&quot;".to_string(),
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_loopback_redirect() {
        let result = CallbackListener::bind("https://app.example.com/cb").await;
        assert!(matches!(result, Err(Error::Config(_))));

        let result = CallbackListener::bind("http://example.com:8080/cb").await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn ephemeral_port_is_reported() {
        let listener = CallbackListener::bind("http://127.0.0.1:0/oauth/callback")
            .await
            .unwrap();
        let uri = listener.redirect_uri();
        assert!(uri.starts_with("http://127.0.0.1:"));
        assert!(uri.ends_with("/oauth/callback"));
        assert!(!uri.contains(":0/"));
    }

    #[test]
    fn error_page_escapes_markup() {
        let page = error_page("<script>");
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }
}
