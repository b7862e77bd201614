//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 passphrase key derivation (`kdf`)
//! - AES-256-GCM sealing and opening with detached tags (`cipher`)
//! - Self-wiping buffers for secret material (`buffer`)

pub mod buffer;
pub mod cipher;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{derive_key, seal, open, SecureBuffer, ...};
pub use buffer::SecureBuffer;
pub use cipher::{generate_nonce, open, seal, Sealed, NONCE_LEN, TAG_LEN};
pub use kdf::{derive_key, generate_salt, VaultKey, DEFAULT_ITERATIONS, KEY_LEN, SALT_LEN};
