use thiserror::Error;

/// All errors that can occur in CredVault.
///
/// Messages name identifiers and operations only; secret material never
/// appears in an error.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Lifecycle errors ---
    #[error("Vault is not initialized")]
    NotInitialized,

    #[error("Vault is already initialized")]
    AlreadyInitialized,

    #[error("Invalid master passphrase")]
    InvalidPassphrase,

    #[error("Vault is locked")]
    VaultLocked,

    // --- Crypto errors ---
    #[error("Authentication failed: wrong key or tampered data")]
    AuthenticationFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    // --- Format errors ---
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- Storage errors ---
    #[error("Storage backend error: {0}")]
    Storage(String),

    // --- Caller errors ---
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, VaultError>;
