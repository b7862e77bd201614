//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The master passphrase and a random 16-byte salt are stretched into a
//! 256-bit `VaultKey`.  The iteration count is stored in the vault
//! metadata so the exact same derivation is repeated on unlock.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use hmac::Hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{Result, VaultError};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Iteration count used when a caller passes zero.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// A 32-byte symmetric key that zeroes its memory when dropped.
///
/// Not `Clone`: a session owns exactly one live key, and replacing it
/// drops (and wipes) the previous one.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
}

impl VaultKey {
    /// Wrap raw key bytes.  The caller should wipe its own copy.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to build a cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey([REDACTED])")
    }
}

/// Derive a `VaultKey` from a passphrase and salt.
///
/// Deterministic: the same passphrase, salt and iteration count always
/// produce the same key.  An iteration count of zero is replaced with
/// `DEFAULT_ITERATIONS` and reported as a warning, not an error.
pub fn derive_key(passphrase: &[u8], salt: &[u8], iterations: u32) -> Result<VaultKey> {
    let iterations = effective_iterations(iterations);

    let mut out = [0u8; KEY_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(passphrase, salt, iterations, &mut out)
        .map_err(|e| VaultError::KeyDerivation(format!("PBKDF2 failed: {e}")))?;

    let key = VaultKey::new(out);
    out.zeroize();

    tracing::trace!(iterations, "derived vault key via PBKDF2");
    Ok(key)
}

/// Resolve the iteration count actually used for derivation.
pub fn effective_iterations(iterations: u32) -> u32 {
    if iterations == 0 {
        tracing::warn!(
            default = DEFAULT_ITERATIONS,
            "invalid PBKDF2 iteration count 0, using default"
        );
        DEFAULT_ITERATIONS
    } else {
        iterations
    }
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| VaultError::KeyDerivation(format!("salt generation failed: {e}")))?;
    Ok(salt)
}
