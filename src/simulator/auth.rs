//! Bind authentication against a static credential table.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::config::ConfigError;

/// ESME credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// System ID
    pub system_id: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            password: password.into(),
        }
    }

    /// Parse a comma separated `system_id:password` table.
    ///
    /// Blank entries are skipped. Everything after the first `:` is the
    /// password, so passwords may contain colons and may be empty.
    pub fn parse_table(table: &str) -> Result<Vec<Self>, ConfigError> {
        let mut credentials = Vec::new();

        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (system_id, password) = entry
                .split_once(':')
                .ok_or_else(|| ConfigError::MalformedCredential(entry.to_string()))?;

            if system_id.is_empty() {
                return Err(ConfigError::MalformedCredential(entry.to_string()));
            }

            credentials.push(Self::new(system_id, password));
        }

        Ok(credentials)
    }
}

/// Credential store trait.
pub trait CredentialStore: Send + Sync {
    /// Succeeds only when the system_id is known and the password matches
    /// exactly (case-sensitive).
    fn authenticate(&self, system_id: &str, password: &str) -> bool;
}

/// In-memory credential store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    credentials: HashMap<String, String>,
}

impl InMemoryCredentialStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add credentials. A later entry for the same system_id replaces the earlier one.
    pub fn add(&mut self, creds: Credentials) {
        self.credentials.insert(creds.system_id, creds.password);
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl FromIterator<Credentials> for InMemoryCredentialStore {
    fn from_iter<I: IntoIterator<Item = Credentials>>(iter: I) -> Self {
        let mut store = Self::new();
        for creds in iter {
            store.add(creds);
        }
        store
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn authenticate(&self, system_id: &str, password: &str) -> bool {
        let granted = self
            .credentials
            .get(system_id)
            .is_some_and(|expected| expected == password);
        debug!(system_id = %system_id, granted, "credential check");
        granted
    }
}
