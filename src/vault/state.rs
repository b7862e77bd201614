//! VaultState: the lock/unlock state machine and the decrypted cache.
//!
//! ```text
//! Uninitialized --initialize--> Unlocked <--unlock/lock--> Locked
//! ```
//!
//! The live `VaultKey` and every decrypted record exist only inside an
//! unlocked `Session`.  Dropping the session (on `lock`) wipes both.
//! `VaultState` is not synchronized itself; `VaultService` keeps it behind
//! a `RwLock`.

use std::collections::HashMap;

use subtle::ConstantTimeEq;

use super::codec;
use super::format::{VaultMetadata, FORMAT_VERSION};
use super::record::CredentialRecord;
use crate::crypto::{self, kdf, VaultKey};
use crate::errors::{Result, VaultError};
use crate::storage::{SecureStorage, INIT_KEY};

/// Externally visible phase of the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultStatus {
    Uninitialized,
    Locked,
    Unlocked,
}

/// The unlocked half of the state: live key plus decrypted records.
pub(crate) struct Session {
    pub(crate) key: VaultKey,
    pub(crate) cache: HashMap<String, CredentialRecord>,
}

impl Session {
    fn new(key: VaultKey) -> Self {
        Self {
            key,
            cache: HashMap::new(),
        }
    }

    fn wipe(&mut self) {
        for record in self.cache.values_mut() {
            record.wipe();
        }
        self.cache.clear();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.wipe();
    }
}

enum Phase {
    Uninitialized,
    Locked,
    Unlocked(Session),
}

pub struct VaultState {
    phase: Phase,
}

impl VaultState {
    /// Inspect `storage`: `Locked` if vault metadata exists, otherwise
    /// `Uninitialized`.
    pub fn detect(storage: &dyn SecureStorage) -> Result<Self> {
        let phase = if storage.retrieve(INIT_KEY)?.is_some() {
            Phase::Locked
        } else {
            Phase::Uninitialized
        };
        Ok(Self { phase })
    }

    pub fn status(&self) -> VaultStatus {
        match self.phase {
            Phase::Uninitialized => VaultStatus::Uninitialized,
            Phase::Locked => VaultStatus::Locked,
            Phase::Unlocked(_) => VaultStatus::Unlocked,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.phase, Phase::Unlocked(_))
    }

    /// Create vault metadata and enter `Unlocked`.
    ///
    /// On failure nothing is persisted and the derived key is dropped
    /// (and wiped) before returning.
    pub fn initialize(
        &mut self,
        storage: &dyn SecureStorage,
        passphrase: &[u8],
        iterations: u32,
    ) -> Result<()> {
        if !matches!(self.phase, Phase::Uninitialized) {
            return Err(VaultError::AlreadyInitialized);
        }
        if passphrase.is_empty() {
            return Err(VaultError::InvalidArgument("passphrase must not be empty".into()));
        }
        if storage.retrieve(INIT_KEY)?.is_some() {
            self.phase = Phase::Locked;
            return Err(VaultError::AlreadyInitialized);
        }

        let (metadata, key) = new_metadata(passphrase, iterations)?;
        storage.store(INIT_KEY, &metadata.to_bytes()?)?;

        tracing::info!(iterations = metadata.iterations, "vault initialized");
        self.phase = Phase::Unlocked(Session::new(key));
        Ok(())
    }

    /// Verify `passphrase` and enter `Unlocked`.  A no-op when already
    /// unlocked.  Records are decrypted lazily on first access.
    pub fn unlock(&mut self, storage: &dyn SecureStorage, passphrase: &[u8]) -> Result<()> {
        if self.is_unlocked() {
            return Ok(());
        }

        let (_, key) = verify_passphrase(storage, passphrase)?;
        tracing::info!("vault unlocked");
        self.phase = Phase::Unlocked(Session::new(key));
        Ok(())
    }

    /// Wipe the session and enter `Locked`.  Never fails; an
    /// uninitialized vault stays uninitialized.
    pub fn lock(&mut self) {
        if let Phase::Unlocked(session) = &mut self.phase {
            session.wipe();
            self.phase = Phase::Locked;
            tracing::info!("vault locked");
        }
    }

    pub(crate) fn session(&self) -> Result<&Session> {
        match &self.phase {
            Phase::Unlocked(session) => Ok(session),
            Phase::Locked => Err(VaultError::VaultLocked),
            Phase::Uninitialized => Err(VaultError::NotInitialized),
        }
    }

    pub(crate) fn session_mut(&mut self) -> Result<&mut Session> {
        match &mut self.phase {
            Phase::Unlocked(session) => Ok(session),
            Phase::Locked => Err(VaultError::VaultLocked),
            Phase::Uninitialized => Err(VaultError::NotInitialized),
        }
    }

    /// Enter `Unlocked` with an already verified key, keeping any cache.
    pub(crate) fn install_key(&mut self, key: VaultKey) {
        if let Phase::Unlocked(session) = &mut self.phase {
            // The previous key is dropped here and wipes itself.
            session.key = key;
            return;
        }
        self.phase = Phase::Unlocked(Session::new(key));
    }
}

/// The fixed plaintext sealed into the metadata.
fn verifier(version: &str) -> String {
    format!("CREDVAULT_VERIFICATION_{version}")
}

/// Fresh salt, key and sealed verifier for `passphrase`.
pub(crate) fn new_metadata(passphrase: &[u8], iterations: u32) -> Result<(VaultMetadata, VaultKey)> {
    let iterations = kdf::effective_iterations(iterations);
    let salt = crypto::generate_salt()?;
    let key = crypto::derive_key(passphrase, &salt, iterations)?;
    let sealed = codec::seal_envelope(&key, verifier(FORMAT_VERSION).as_bytes())?;

    let metadata = VaultMetadata {
        version: FORMAT_VERSION.to_string(),
        iterations,
        salt: salt.to_vec(),
        verifier: sealed,
    };
    Ok((metadata, key))
}

/// Re-derive the key from stored metadata and check the verifier.
///
/// Bad passphrase, wrong salt and corrupt metadata all come back as
/// `InvalidPassphrase`.  Only a missing vault or a failing backend is
/// reported differently.
pub(crate) fn verify_passphrase(
    storage: &dyn SecureStorage,
    passphrase: &[u8],
) -> Result<(VaultMetadata, VaultKey)> {
    let bytes = storage.retrieve(INIT_KEY)?.ok_or(VaultError::NotInitialized)?;

    let metadata = VaultMetadata::from_bytes(&bytes).map_err(|e| {
        tracing::warn!(error = %e, "vault metadata unreadable");
        VaultError::InvalidPassphrase
    })?;
    let salt = metadata.salt().map_err(|_| VaultError::InvalidPassphrase)?;
    let key = crypto::derive_key(passphrase, &salt, metadata.iterations)?;

    let plaintext =
        codec::open_envelope(&metadata.verifier, &key).map_err(|_| VaultError::InvalidPassphrase)?;
    let expected = verifier(&metadata.version);
    if !bool::from(plaintext.as_slice().ct_eq(expected.as_bytes())) {
        return Err(VaultError::InvalidPassphrase);
    }

    Ok((metadata, key))
}
