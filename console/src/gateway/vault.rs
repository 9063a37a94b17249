//! In-memory credential vault

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use secrecy::SecretString;

use crate::storage::settings::VaultEntry;

/// Login for one appliance
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Appliance credentials indexed by IP
///
/// Contents live only as long as the gateway process.
#[derive(Debug, Default)]
pub struct CredentialVault {
    entries: RwLock<HashMap<String, Arc<Credentials>>>,
}

impl CredentialVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vault from configured entries; later entries win
    pub fn from_entries(entries: &[VaultEntry]) -> Self {
        let vault = Self::new();
        for entry in entries {
            vault.insert(
                &entry.ip,
                Credentials {
                    username: entry.username.clone(),
                    password: SecretString::from(entry.password.clone()),
                },
            );
        }
        vault
    }

    pub fn get(&self, ip: &str) -> Option<Arc<Credentials>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(ip).cloned()
    }

    /// Insert or overwrite the credentials for `ip`
    pub fn insert(&self, ip: &str, credentials: Credentials) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(ip.to_string(), Arc::new(credentials));
    }

    pub fn remove(&self, ip: &str) -> Option<Arc<Credentials>> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(ip)
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
