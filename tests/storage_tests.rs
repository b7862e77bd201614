//! Integration tests for the storage backends.

use std::fs;

use credvault::config::Settings;
use credvault::storage::{open_storage, FileStorage, MemoryStorage, SecureStorage};

fn exercise(storage: &dyn SecureStorage) {
    assert!(storage.retrieve("github").unwrap().is_none());

    storage.store("github", b"blob-1").unwrap();
    storage.store("team/ops db", b"blob-2").unwrap();
    assert_eq!(storage.retrieve("github").unwrap().as_deref(), Some(&b"blob-1"[..]));

    storage.store("github", b"blob-3").unwrap();
    assert_eq!(storage.retrieve("github").unwrap().as_deref(), Some(&b"blob-3"[..]));

    let mut keys = storage.list_keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["github", "team/ops db"]);

    storage.remove("github").unwrap();
    storage.remove("github").unwrap();
    assert!(storage.retrieve("github").unwrap().is_none());
    assert_eq!(storage.list_keys().unwrap(), vec!["team/ops db"]);
}

#[test]
fn memory_backend_contract() {
    exercise(&MemoryStorage::new());
}

#[test]
fn file_backend_contract() {
    let dir = tempfile::TempDir::new().unwrap();
    let storage = FileStorage::open(&dir.path().join("store")).unwrap();
    exercise(&storage);
}

#[test]
fn file_backend_persists_across_instances() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("store");

    FileStorage::open(&path).unwrap().store("k", b"v").unwrap();

    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.retrieve("k").unwrap().as_deref(), Some(&b"v"[..]));
}

#[test]
fn open_storage_uses_configured_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    let settings = Settings {
        storage_dir: "vault-data".into(),
        ..Settings::default()
    };

    let storage = open_storage(&settings, dir.path()).unwrap();
    storage.store("k", b"v").unwrap();

    assert!(dir.path().join("vault-data").is_dir());
    assert_eq!(fs::read_dir(dir.path().join("vault-data")).unwrap().count(), 1);
}

#[cfg(not(feature = "keyring-store"))]
#[test]
fn keyring_backend_requires_feature() {
    let dir = tempfile::TempDir::new().unwrap();
    let settings = Settings {
        storage_backend: credvault::config::StorageBackend::Keyring,
        ..Settings::default()
    };
    assert!(open_storage(&settings, dir.path()).is_err());
}
