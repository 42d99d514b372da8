//! Access scopes requested during authorization

use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A permission grant requested from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessScope {
    /// Read sheets, reports and their attachments/discussions
    ReadSheets,
    /// Edit sheet contents
    WriteSheets,
    /// Share sheets
    ShareSheets,
    /// Delete sheets
    DeleteSheets,
    /// Create sheets, folders and workspaces
    CreateSheets,
    /// Read user and group listings
    ReadUsers,
    /// Add and remove users
    AdminUsers,
    /// Manage sheet structure and properties
    AdminSheets,
    /// Manage workspaces
    AdminWorkspaces,
    /// Manage webhooks
    AdminWebhooks,
    /// Read contacts
    ReadContacts,
    /// Read the account event stream
    ReadEvents,
}

impl AccessScope {
    /// Every scope, in declaration order
    pub const ALL: [Self; 12] = [
        Self::ReadSheets,
        Self::WriteSheets,
        Self::ShareSheets,
        Self::DeleteSheets,
        Self::CreateSheets,
        Self::ReadUsers,
        Self::AdminUsers,
        Self::AdminSheets,
        Self::AdminWorkspaces,
        Self::AdminWebhooks,
        Self::ReadContacts,
        Self::ReadEvents,
    ];

    /// Wire name sent in the `scope` parameter
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadSheets => "READ_SHEETS",
            Self::WriteSheets => "WRITE_SHEETS",
            Self::ShareSheets => "SHARE_SHEETS",
            Self::DeleteSheets => "DELETE_SHEETS",
            Self::CreateSheets => "CREATE_SHEETS",
            Self::ReadUsers => "READ_USERS",
            Self::AdminUsers => "ADMIN_USERS",
            Self::AdminSheets => "ADMIN_SHEETS",
            Self::AdminWorkspaces => "ADMIN_WORKSPACES",
            Self::AdminWebhooks => "ADMIN_WEBHOOKS",
            Self::ReadContacts => "READ_CONTACTS",
            Self::ReadEvents => "READ_EVENTS",
        }
    }
}

impl fmt::Display for AccessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessScope {
    type Err = Error;

    /// Accepts the wire name in any case, with `-` or `_` separators
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str() == normalized)
            .ok_or_else(|| Error::invalid_argument(format!("unknown access scope: {s}")))
    }
}

/// Insertion-ordered set of scopes
///
/// Duplicates are ignored; iteration and the rendered `scope` parameter
/// follow first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(IndexSet<AccessScope>);

impl ScopeSet {
    /// Empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scope; returns false if it was already present
    pub fn insert(&mut self, scope: AccessScope) -> bool {
        self.0.insert(scope)
    }

    /// Whether the set holds `scope`
    #[must_use]
    pub fn contains(&self, scope: AccessScope) -> bool {
        self.0.contains(&scope)
    }

    /// Number of scopes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no scope was added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Scopes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = AccessScope> + '_ {
        self.0.iter().copied()
    }

    /// Comma-joined wire names, no trailing comma
    #[must_use]
    pub fn to_param(&self) -> String {
        self.iter()
            .map(AccessScope::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<AccessScope> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = AccessScope>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[AccessScope; N]> for ScopeSet {
    fn from(scopes: [AccessScope; N]) -> Self {
        scopes.into_iter().collect()
    }
}
