//! OS keyring backend.
//!
//! Each blob lives in its own keyring entry:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! Keyrings cannot be enumerated portably, so the backend keeps its own
//! JSON list of keys under `__vault_index__`.

use std::sync::Mutex;

use super::{SecureStorage, INDEX_KEY};
use crate::errors::{Result, VaultError};

/// Service name used in the OS keyring.
const SERVICE_NAME: &str = "credvault";

pub struct KeyringStorage {
    namespace: String,
    /// Serializes read-modify-write cycles on the index.
    index_lock: Mutex<()>,
}

impl KeyringStorage {
    /// `namespace` separates vaults sharing one keyring (usually the
    /// vault's canonical directory).
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            index_lock: Mutex::new(()),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(SERVICE_NAME, &format!("{}:{key}", self.namespace)).map_err(|e| {
            VaultError::Storage(format!("failed to create keyring entry for '{key}': {e}"))
        })
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.entry(key)?.get_secret() {
            Ok(data) => Ok(Some(data)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(VaultError::Storage(format!(
                "failed to read '{key}' from keyring: {e}"
            ))),
        }
    }

    fn set(&self, key: &str, data: &[u8]) -> Result<()> {
        self.entry(key)?.set_secret(data).map_err(|e| {
            VaultError::Storage(format!("failed to store '{key}' in keyring: {e}"))
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(VaultError::Storage(format!(
                "failed to delete '{key}' from keyring: {e}"
            ))),
        }
    }

    fn read_index(&self) -> Result<Vec<String>> {
        match self.get(INDEX_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| VaultError::Storage(format!("corrupt keyring index: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    fn write_index(&self, keys: &[String]) -> Result<()> {
        let bytes = serde_json::to_vec(keys)
            .map_err(|e| VaultError::Serialization(format!("keyring index: {e}")))?;
        self.set(INDEX_KEY, &bytes)
    }

    fn update_index(&self, f: impl FnOnce(&mut Vec<String>) -> bool) -> Result<()> {
        let _guard = self
            .index_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut keys = self.read_index()?;
        if f(&mut keys) {
            self.write_index(&keys)?;
        }
        Ok(())
    }
}

impl SecureStorage for KeyringStorage {
    fn store(&self, key: &str, data: &[u8]) -> Result<()> {
        self.set(key, data)?;
        if key == INDEX_KEY {
            return Ok(());
        }
        self.update_index(|keys| {
            if keys.iter().any(|k| k == key) {
                false
            } else {
                keys.push(key.to_string());
                true
            }
        })
    }

    fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.get(key)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.delete(key)?;
        if key == INDEX_KEY {
            return Ok(());
        }
        self.update_index(|keys| {
            let before = keys.len();
            keys.retain(|k| k != key);
            keys.len() != before
        })
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        self.read_index()
    }
}
