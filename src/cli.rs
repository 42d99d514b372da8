//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::oauth::AccessScope;

/// OAuth2 helper for the hosted spreadsheet API
#[derive(Parser, Debug)]
#[command(name = "gridsheet-oauth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "GRIDSHEET_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "warn",
        env = "GRIDSHEET_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "GRIDSHEET_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the URL the user visits to grant access
    AuthorizeUrl {
        /// Access scopes to request (comma separated, e.g. READ_SHEETS,WRITE_SHEETS)
        #[arg(short, long, required = true, value_delimiter = ',')]
        scope: Vec<AccessScope>,

        /// Opaque value echoed back in the redirect
        #[arg(long)]
        state: Option<String>,
    },

    /// Parse a redirect URL and print the authorization result as JSON
    ParseRedirect {
        /// Full URL the browser was redirected to
        #[arg(required = true)]
        url: String,
    },

    /// Exchange the code in a redirect URL for a token and store it
    Exchange {
        /// Full URL the browser was redirected to
        #[arg(required = true)]
        url: String,
    },

    /// Refresh the stored token
    Refresh {
        /// Refresh token to use instead of the stored one
        #[arg(long)]
        refresh_token: Option<String>,
    },

    /// Revoke the stored access token and forget it
    Revoke {
        /// Access token to revoke instead of the stored one
        #[arg(long)]
        access_token: Option<String>,
    },

    /// Run the whole flow through a loopback redirect URI
    Login {
        /// Access scopes to request (comma separated)
        #[arg(short, long, required = true, value_delimiter = ',')]
        scope: Vec<AccessScope>,

        /// Seconds to wait for the browser redirect
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
}
