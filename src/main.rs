//! gridsheet-oauth - OAuth2 helper for the hosted spreadsheet API

use std::process::ExitCode;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use clap::Parser;
use tracing::info;
use url::Url;

use gridsheet_oauth::{
    Error, Result,
    cli::{Cli, Command},
    config::Config,
    oauth::{AccessScope, CallbackListener, OAuthFlow, ScopeSet, Token, TokenStorage},
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<()> {
    config.validate()?;
    let flow = OAuthFlow::from_config(config)?;
    let storage = TokenStorage::new(config.token_file_path()?);

    match command {
        Command::AuthorizeUrl { scope, state } => {
            let url = flow.new_authorization_url(&to_scope_set(scope), state.as_deref())?;
            println!("{url}");
        }
        Command::ParseRedirect { url } => {
            let result = flow.extract_authorization_result(&url)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Exchange { url } => {
            let result = flow.extract_authorization_result(&url)?;
            let token = flow.obtain_new_token(&result).await?;
            store_and_print(&storage, &token)?;
        }
        Command::Refresh { refresh_token } => {
            let current = match refresh_token {
                Some(refresh_token) => Token {
                    refresh_token: Some(refresh_token),
                    ..Token::default()
                },
                None => load_stored(&storage)?,
            };
            let token = flow.refresh_token(&current).await?;
            store_and_print(&storage, &token)?;
        }
        Command::Revoke { access_token } => match access_token {
            Some(access_token) => {
                let token = Token {
                    access_token: Some(access_token),
                    ..Token::default()
                };
                flow.revoke_access_token(&token).await?;
                println!("Access token revoked");
            }
            None => {
                flow.revoke_access_token(&load_stored(&storage)?).await?;
                storage.delete()?;
                println!("Access token revoked; removed {}", storage.path().display());
            }
        },
        Command::Login { scope, timeout } => {
            let token = login(&flow, to_scope_set(scope), Duration::from_secs(timeout)).await?;
            store_and_print(&storage, &token)?;
        }
    }

    Ok(())
}

/// Full browser flow through a loopback redirect URI
async fn login(flow: &OAuthFlow, scopes: ScopeSet, timeout: Duration) -> Result<Token> {
    let redirect_uri = &flow.config().redirect_uri;

    // The server only redirects to the registered URI, so an ephemeral port cannot work
    if Url::parse(redirect_uri).ok().and_then(|u| u.port()) == Some(0) {
        return Err(Error::Config(format!(
            "redirect_uri {redirect_uri} must name a fixed loopback port"
        )));
    }
    let listener = CallbackListener::bind(redirect_uri).await?;

    let state = generate_state();
    let url = flow.new_authorization_url(&scopes, Some(&state))?;

    println!("\nAuthorize this client by visiting:\n{url}\n");
    info!(timeout_secs = timeout.as_secs(), "Waiting for authorization redirect");

    let redirect = listener.wait_for_redirect(timeout).await?;
    let result = flow.extract_authorization_result(&redirect)?;

    if result.state.as_deref() != Some(state.as_str()) {
        return Err(Error::invalid_argument("State mismatch - possible CSRF attack"));
    }

    flow.obtain_new_token(&result).await
}

fn to_scope_set(scopes: Vec<AccessScope>) -> ScopeSet {
    scopes.into_iter().collect()
}

fn load_stored(storage: &TokenStorage) -> Result<Token> {
    storage.load()?.ok_or_else(|| {
        Error::invalid_argument(format!(
            "no stored token at {}; run `login` or `exchange` first",
            storage.path().display()
        ))
    })
}

fn store_and_print(storage: &TokenStorage, token: &Token) -> Result<()> {
    storage.save(token)?;
    println!("{}", serde_json::to_string_pretty(token)?);
    Ok(())
}

/// Generate a random state parameter
fn generate_state() -> String {
    let state_bytes: [u8; 16] = rand::random();
    URL_SAFE_NO_PAD.encode(state_bytes)
}
