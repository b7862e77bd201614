//! AES-256-GCM authenticated encryption with detached tags.
//!
//! `seal` returns the ciphertext and the 16-byte tag separately so the
//! envelope layer can store them as distinct fields.  `open` verifies the
//! tag before any plaintext is produced; on mismatch the caller only ever
//! sees `AuthenticationFailed`.
//!
//! Every `seal` must use a fresh nonce from `generate_nonce`.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{AeadInPlace, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use zeroize::Zeroizing;

use super::kdf::VaultKey;
use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Output of a `seal` call.
#[derive(Debug, Clone)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

/// Generate a random 12-byte nonce from the OS CSPRNG.
pub fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| VaultError::Encryption(format!("nonce generation failed: {e}")))?;
    Ok(nonce)
}

/// Encrypt `plaintext` under `key` and `nonce`.
pub fn seal(key: &VaultKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Sealed> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Encryption(format!("invalid key length: {e}")))?;

    let mut buffer = Zeroizing::new(plaintext.to_vec());
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), b"", buffer.as_mut_slice())
        .map_err(|e| VaultError::Encryption(format!("encryption error: {e}")))?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&tag);

    Ok(Sealed {
        ciphertext: std::mem::take(&mut *buffer),
        tag: tag_bytes,
    })
}

/// Decrypt `ciphertext` and verify `tag`.
///
/// The returned plaintext is wiped when dropped.
pub fn open(
    key: &VaultKey,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Result<Zeroizing<Vec<u8>>> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| VaultError::AuthenticationFailed)?;

    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            b"",
            buffer.as_mut_slice(),
            Tag::from_slice(tag),
        )
        .map_err(|_| VaultError::AuthenticationFailed)?;

    Ok(buffer)
}
