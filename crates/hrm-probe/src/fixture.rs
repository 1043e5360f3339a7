//! Fixture Data
//!
//! One spreadsheet record keyed by column name, plus the credential pair the
//! login step pulls out of it. Column lookup tolerates case differences and a
//! set of known header aliases, since fixture files are hand-edited.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::result::{ProbeError, ProbeResult};

/// Header aliases accepted for the username column
pub const USERNAME_KEYS: [&str; 4] = ["Username", "UserName", "USER_NAME", "username"];

/// Header aliases accepted for the password column
pub const PASSWORD_KEYS: [&str; 4] = ["Password", "PASS", "PWD", "password"];

/// One fixture record: column name to cell text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: BTreeMap<String, String>,
}

impl Row {
    /// Create an empty row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs
    #[must_use]
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value for `key`: exact match first, then case-insensitive
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells
            .get(key)
            .or_else(|| {
                self.cells
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    /// First value found for any of `keys`.
    ///
    /// All aliases are tried exactly before any is tried case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::MissingCredential`] when no alias resolves.
    pub fn get_any(&self, keys: &[&str]) -> ProbeResult<&str> {
        let exact = keys.iter().find_map(|k| self.cells.get(*k));
        let loose = || {
            keys.iter().find_map(|key| {
                self.cells
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
        };

        exact
            .or_else(loose)
            .map(String::as_str)
            .ok_or_else(|| ProbeError::MissingCredential {
                keys: keys.iter().map(|k| (*k).to_string()).collect(),
                available: self.columns().map(str::to_string).collect(),
            })
    }

    /// Whether both credential columns resolve to non-blank values
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        let present = |keys: &[&str]| self.get_any(keys).is_ok_and(|v| !v.trim().is_empty());
        present(&USERNAME_KEYS[..]) && present(&PASSWORD_KEYS[..])
    }

    /// Column names in sorted order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Number of columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no columns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether every cell is blank
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }
}

/// Login credentials resolved from a [`Row`]
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials directly
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Resolve username and password through their alias lists
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::MissingCredential`] for the first column that
    /// does not resolve.
    pub fn from_row(row: &Row) -> ProbeResult<Self> {
        Ok(Self {
            username: row.get_any(&USERNAME_KEYS)?.to_string(),
            password: row.get_any(&PASSWORD_KEYS)?.to_string(),
        })
    }
}

// Password stays out of logs and reports.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}
