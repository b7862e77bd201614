//! File-fallback backend: one file per key inside a directory.
//!
//! File names are the URL-safe base64 of the key plus a `.blob` suffix, so
//! any identifier maps to a valid file name and `list_keys` can recover
//! the original key exactly.
//!
//! Writes go to a temp file in the same directory and are renamed over the
//! target, so readers never see a half-written blob.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use super::SecureStorage;
use crate::errors::{Result, VaultError};

const SUFFIX: &str = ".blob";

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir`, creating it (owner-only on Unix) if needed.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                VaultError::Storage(format!("cannot create {}: {e}", dir.display()))
            })?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(dir, fs::Permissions::from_mode(0o700)).map_err(|e| {
                    VaultError::Storage(format!("cannot restrict {}: {e}", dir.display()))
                })?;
            }
        } else if !dir.is_dir() {
            return Err(VaultError::Storage(format!(
                "{} exists and is not a directory",
                dir.display()
            )));
        }

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}{SUFFIX}", URL_SAFE_NO_PAD.encode(key.as_bytes())))
    }

    fn key_for(file_name: &str) -> Option<String> {
        let encoded = file_name.strip_suffix(SUFFIX)?;
        let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        String::from_utf8(bytes).ok()
    }
}

impl SecureStorage for FileStorage {
    fn store(&self, key: &str, data: &[u8]) -> Result<()> {
        write_private(&self.path_for(key), data)
            .map_err(|e| VaultError::Storage(format!("failed to write '{key}': {e}")))
    }

    fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::Storage(format!("failed to read '{key}': {e}"))),
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VaultError::Storage(format!("failed to remove '{key}': {e}"))),
        }
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            VaultError::Storage(format!("cannot list {}: {e}", self.dir.display()))
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VaultError::Storage(format!("cannot list entry: {e}")))?;
            // Temp files start with '.', which is outside the base64 alphabet.
            if let Some(key) = entry.file_name().to_str().and_then(Self::key_for) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// Atomically replace `path` with `data`, owner-only on Unix.
///
/// The bytes go to `.<name>.tmp` next to the target, are synced, and the
/// temp file is renamed over `path`.
pub(crate) fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    let write = || -> std::io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    };

    write().inspect_err(|_| {
        let _ = fs::remove_file(&tmp_path);
    })
}
