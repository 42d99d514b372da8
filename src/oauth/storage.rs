//! OAuth Token Storage
//!
//! Persists the current token to disk so the CLI can refresh or revoke it
//! in a later invocation.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Token;
use crate::Result;

/// Token storage backed by a single JSON file
pub struct TokenStorage {
    path: PathBuf,
}

impl TokenStorage {
    /// Storage at `path`; parent directories are created on first save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backing this storage
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored token, if any
    pub fn load(&self) -> Result<Option<Token>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No stored token found");
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let token: Token = serde_json::from_str(&content)?;

        debug!(path = %self.path.display(), expired = token.is_expired(), "Loaded stored token");
        Ok(Some(token))
    }

    /// Save a token, replacing any previous one
    pub fn save(&self, token: &Token) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(token)?;
        fs::write(&self.path, content)?;

        // Set restrictive permissions (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        info!(path = %self.path.display(), "Saved OAuth token");
        Ok(())
    }

    /// Delete the stored token
    pub fn delete(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!(path = %self.path.display(), "Deleted OAuth token");
        }
        Ok(())
    }
}
