//! Pluggable persistence for encrypted blobs.
//!
//! The vault only ever hands ciphertext envelopes to a `SecureStorage`;
//! backends never see plaintext secrets or key material.  Backends are
//! chosen at runtime by `open_storage`.

pub mod file;
#[cfg(feature = "keyring-store")]
pub mod keyring;
pub mod memory;

use std::path::Path;

use crate::config::{Settings, StorageBackend};
use crate::errors::Result;

pub use file::FileStorage;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringStorage;
pub use memory::MemoryStorage;

/// Identifier holding the serialized `VaultMetadata`.
pub const INIT_KEY: &str = "__vault_init__";

/// Identifier some backends use for their own key index.
pub const INDEX_KEY: &str = "__vault_index__";

/// `true` for identifiers user code may never read or write directly.
pub fn is_reserved(key: &str) -> bool {
    key == INIT_KEY || key == INDEX_KEY
}

/// Key/value persistence for opaque byte blobs.
///
/// Implementations must give per-key read-your-writes consistency and
/// must be usable from several threads at once.
pub trait SecureStorage: Send + Sync {
    /// Insert or overwrite `key`.
    fn store(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Fetch `key`, or `None` if it was never stored or has been removed.
    fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Remove `key`.  Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<()>;

    /// Every key currently stored, in no particular order.
    fn list_keys(&self) -> Result<Vec<String>>;
}

/// Build the backend selected in `settings`.
///
/// `base_dir` anchors the file backend's directory and namespaces keyring
/// entries so two vaults on one machine do not collide.
pub fn open_storage(settings: &Settings, base_dir: &Path) -> Result<Box<dyn SecureStorage>> {
    match settings.storage_backend {
        StorageBackend::File => {
            let dir = settings.storage_path(base_dir);
            tracing::debug!(dir = %dir.display(), "using file storage");
            Ok(Box::new(FileStorage::open(&dir)?))
        }
        #[cfg(feature = "keyring-store")]
        StorageBackend::Keyring => {
            let namespace = base_dir
                .canonicalize()
                .unwrap_or_else(|_| base_dir.to_path_buf());
            tracing::debug!(namespace = %namespace.display(), "using keyring storage");
            Ok(Box::new(KeyringStorage::new(&namespace.to_string_lossy())))
        }
        #[cfg(not(feature = "keyring-store"))]
        StorageBackend::Keyring => Err(crate::errors::VaultError::Config(
            "storage_backend = \"keyring\" requires the keyring-store feature".into(),
        )),
    }
}
