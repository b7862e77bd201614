use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// Which `SecureStorage` implementation backs the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One file per identifier under `storage_dir`.
    File,
    /// The OS credential store (requires the `keyring-store` feature).
    Keyring,
}

/// Vault configuration, loaded from `credvault.toml`.
///
/// Every field has a sensible default so CredVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// PBKDF2 iteration count for the vault key (default: 100 000).
    #[serde(default = "default_key_iterations")]
    pub key_iterations: u32,

    /// PBKDF2 iteration count for export files (default: 100 000).
    #[serde(default = "default_key_iterations")]
    pub export_iterations: u32,

    /// Generated passwords are never shorter than this.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Always include upper-case letters in generated passwords.
    #[serde(default)]
    pub require_mixed_case: bool,

    /// Always include digits in generated passwords.
    #[serde(default)]
    pub require_numbers: bool,

    /// Always include symbols in generated passwords.
    #[serde(default)]
    pub require_special_chars: bool,

    /// Idle seconds before an unlocked vault locks itself (0 = never).
    #[serde(default = "default_auto_lock_timeout_secs")]
    pub auto_lock_timeout_secs: u64,

    /// Credentials untouched for this many days are reported as expired.
    #[serde(default = "default_password_expiry_days")]
    pub password_expiry_days: u32,

    /// Enables `check_expired_credentials`.
    #[serde(default = "default_true")]
    pub notify_on_password_expiry: bool,

    /// Maximum number of previous secrets kept per credential.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Storage backend selected by `open_storage`.
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,

    /// Directory (relative to the base dir) used by the file backend.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_key_iterations() -> u32 {
    100_000
}

fn default_min_password_length() -> usize {
    12
}

fn default_auto_lock_timeout_secs() -> u64 {
    300 // 5 minutes
}

fn default_password_expiry_days() -> u32 {
    90
}

fn default_true() -> bool {
    true
}

fn default_history_limit() -> usize {
    10
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::File
}

fn default_storage_dir() -> String {
    ".credvault".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_iterations: default_key_iterations(),
            export_iterations: default_key_iterations(),
            min_password_length: default_min_password_length(),
            require_mixed_case: false,
            require_numbers: false,
            require_special_chars: false,
            auto_lock_timeout_secs: default_auto_lock_timeout_secs(),
            password_expiry_days: default_password_expiry_days(),
            notify_on_password_expiry: default_true(),
            history_limit: default_history_limit(),
            storage_backend: default_storage_backend(),
            storage_dir: default_storage_dir(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the base directory.
    const FILE_NAME: &'static str = "credvault.toml";

    /// Load settings from `<base_dir>/credvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(base_dir: &Path) -> Result<Self> {
        let config_path = base_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Full path of the file backend's directory.
    ///
    /// Example: `base_dir/.credvault`
    pub fn storage_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.storage_dir)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
