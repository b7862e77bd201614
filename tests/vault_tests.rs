//! Integration tests for `VaultService`.

use std::fs;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use credvault::config::Settings;
use credvault::crypto::SecureBuffer;
use credvault::errors::{Result, VaultError};
use credvault::storage::{MemoryStorage, SecureStorage};
use credvault::vault::record::now;
use credvault::vault::{Category, CredentialRecord, HistoryEntry, VaultService, VaultStatus};

const PASSPHRASE: &str = "Tr0ub4dor&3";

fn fast_settings() -> Settings {
    Settings {
        key_iterations: 1_000,
        export_iterations: 1_000,
        ..Settings::default()
    }
}

fn service_with(storage: impl SecureStorage + 'static) -> VaultService {
    VaultService::new(Box::new(storage), fast_settings()).expect("service")
}

fn unlocked_service() -> VaultService {
    let vault = service_with(MemoryStorage::new());
    vault.initialize(PASSPHRASE).expect("initialize");
    vault
}

/// Counts calls and can be told to fail `store` for one identifier.
#[derive(Clone, Default)]
struct ProbeStorage {
    inner: Arc<MemoryStorage>,
    calls: Arc<AtomicUsize>,
    fail_store_for: Arc<std::sync::Mutex<Option<String>>>,
}

impl ProbeStorage {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail_store(&self, key: &str) {
        *self.fail_store_for.lock().unwrap() = Some(key.to_string());
    }
}

impl SecureStorage for ProbeStorage {
    fn store(&self, key: &str, data: &[u8]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_store_for.lock().unwrap().as_deref() == Some(key) {
            return Err(VaultError::Storage(format!("injected failure for {key}")));
        }
        self.inner.store(key, data)
    }

    fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.retrieve(key)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key)
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_keys()
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn new_vault_is_uninitialized() {
    let vault = service_with(MemoryStorage::new());
    assert_eq!(vault.status(), VaultStatus::Uninitialized);
    assert!(!vault.is_initialized());
    assert!(vault.is_locked());
}

#[test]
fn operations_before_initialize_fail() {
    let vault = service_with(MemoryStorage::new());
    assert!(matches!(
        vault.unlock(PASSPHRASE).unwrap_err(),
        VaultError::NotInitialized
    ));
    assert!(vault.retrieve_credential("github").is_err());
}

#[test]
fn initialize_leaves_vault_unlocked() {
    let vault = unlocked_service();
    assert_eq!(vault.status(), VaultStatus::Unlocked);
    assert!(vault.is_initialized());
}

#[test]
fn initialize_twice_fails() {
    let vault = unlocked_service();
    assert!(matches!(
        vault.initialize("other").unwrap_err(),
        VaultError::AlreadyInitialized
    ));
}

#[test]
fn initialize_rejects_empty_passphrase() {
    let vault = service_with(MemoryStorage::new());
    assert!(matches!(
        vault.initialize("").unwrap_err(),
        VaultError::InvalidArgument(_)
    ));
    assert_eq!(vault.status(), VaultStatus::Uninitialized);
}

#[test]
fn failed_initialize_stays_uninitialized() {
    let storage = ProbeStorage::default();
    storage.fail_store("__vault_init__");
    let vault = service_with(storage);

    assert!(matches!(
        vault.initialize(PASSPHRASE).unwrap_err(),
        VaultError::Storage(_)
    ));
    assert_eq!(vault.status(), VaultStatus::Uninitialized);
    assert!(matches!(
        vault.unlock(PASSPHRASE).unwrap_err(),
        VaultError::NotInitialized
    ));
}

#[test]
fn end_to_end_store_lock_unlock_retrieve() {
    let vault = unlocked_service();
    vault
        .store_credential("github", CredentialRecord::new("p@ss1").with_identity("alice"))
        .unwrap();

    vault.lock();
    assert_eq!(vault.status(), VaultStatus::Locked);

    vault.unlock(PASSPHRASE).unwrap();
    let record = vault.retrieve_credential("github").unwrap().expect("present");
    assert_eq!(record.secret.as_str(), Some("p@ss1"));
    assert_eq!(record.identity, "alice");
}

#[test]
fn wrong_passphrase_is_rejected_and_vault_stays_locked() {
    let vault = unlocked_service();
    vault.lock();

    assert!(matches!(
        vault.unlock("wrong").unwrap_err(),
        VaultError::InvalidPassphrase
    ));
    assert_eq!(vault.status(), VaultStatus::Locked);

    vault.unlock(PASSPHRASE).unwrap();
    assert_eq!(vault.status(), VaultStatus::Unlocked);
}

#[test]
fn lock_is_idempotent() {
    let vault = unlocked_service();
    vault.store_credential("a", CredentialRecord::new("1")).unwrap();

    vault.lock();
    vault.lock();
    assert_eq!(vault.status(), VaultStatus::Locked);
    assert!(matches!(
        vault.retrieve_credential("a").unwrap_err(),
        VaultError::VaultLocked
    ));
}

#[test]
fn unlock_when_unlocked_is_a_noop() {
    let vault = unlocked_service();
    vault.unlock(PASSPHRASE).unwrap();
    assert_eq!(vault.status(), VaultStatus::Unlocked);
}

#[test]
fn locked_vault_rejects_credential_operations() {
    let vault = unlocked_service();
    vault.lock();

    let locked = |r: Result<_>| matches!(r, Err(VaultError::VaultLocked));
    assert!(locked(vault.store_credential("a", CredentialRecord::new("1")).map(|_| ())));
    assert!(locked(vault.delete_credential("a")));
    assert!(locked(vault.list_identifiers().map(|_| ())));
    assert!(locked(vault.search_credentials("").map(|_| ())));
    assert!(locked(vault.generate_password(16, true, true, true).map(|_| ())));
}

#[test]
fn persisted_vault_reopens_locked() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(
        dir.path().join("credvault.toml"),
        "key_iterations = 1000\nexport_iterations = 1000\n",
    )
    .unwrap();

    {
        let vault = VaultService::open(dir.path()).unwrap();
        vault.initialize(PASSPHRASE).unwrap();
        vault.store_credential("db", CredentialRecord::new("s3cret")).unwrap();
    }

    let vault = VaultService::open(dir.path()).unwrap();
    assert_eq!(vault.status(), VaultStatus::Locked);
    vault.unlock(PASSPHRASE).unwrap();
    let record = vault.retrieve_credential("db").unwrap().unwrap();
    assert_eq!(record.secret.as_str(), Some("s3cret"));
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[test]
fn reserved_identifier_rejected_before_any_storage_call() {
    let storage = ProbeStorage::default();
    let vault = service_with(storage.clone());
    vault.initialize(PASSPHRASE).unwrap();

    let before = storage.calls();
    let err = vault
        .store_credential("__vault_init__", CredentialRecord::new("x"))
        .unwrap_err();
    assert!(matches!(err, VaultError::InvalidArgument(_)));
    assert_eq!(storage.calls(), before);
}

#[test]
fn empty_identifier_rejected() {
    let vault = unlocked_service();
    assert!(matches!(
        vault.store_credential("", CredentialRecord::new("x")).unwrap_err(),
        VaultError::InvalidArgument(_)
    ));
}

#[test]
fn retrieve_missing_is_none() {
    let vault = unlocked_service();
    assert!(vault.retrieve_credential("nothing").unwrap().is_none());
}

#[test]
fn delete_is_idempotent() {
    let vault = unlocked_service();
    vault.store_credential("a", CredentialRecord::new("1")).unwrap();

    vault.delete_credential("a").unwrap();
    vault.delete_credential("a").unwrap();

    assert!(vault.retrieve_credential("a").unwrap().is_none());
    assert!(vault.list_identifiers().unwrap().is_empty());
}

#[test]
fn delete_rejects_reserved_identifier() {
    let vault = unlocked_service();
    assert!(vault.delete_credential("__vault_init__").is_err());
    // Metadata is untouched.
    vault.lock();
    vault.unlock(PASSPHRASE).unwrap();
}

#[test]
fn failed_store_leaves_cache_untouched() {
    let storage = ProbeStorage::default();
    let vault = service_with(storage.clone());
    vault.initialize(PASSPHRASE).unwrap();
    vault.store_credential("a", CredentialRecord::new("old")).unwrap();

    storage.fail_store("a");
    assert!(matches!(
        vault.store_credential("a", CredentialRecord::new("new")).unwrap_err(),
        VaultError::Storage(_)
    ));

    let record = vault.retrieve_credential("a").unwrap().unwrap();
    assert_eq!(record.secret.as_str(), Some("old"));
}

#[test]
fn list_identifiers_is_sorted_and_hides_metadata() {
    let vault = unlocked_service();
    for id in ["zeta", "alpha", "mid"] {
        vault.store_credential(id, CredentialRecord::new("x")).unwrap();
    }
    assert_eq!(vault.list_identifiers().unwrap(), vec!["alpha", "mid", "zeta"]);
}

#[test]
fn search_matches_fields_case_insensitively() {
    let vault = unlocked_service();
    vault
        .store_credential(
            "github",
            CredentialRecord::new("1")
                .with_identity("Alice")
                .with_locator("https://github.com"),
        )
        .unwrap();
    vault
        .store_credential("bank", CredentialRecord::new("2").with_tag("Money"))
        .unwrap();
    vault
        .store_credential("mail", CredentialRecord::new("3").with_title("Work Mail"))
        .unwrap();

    assert_eq!(vault.search_credentials("ALICE").unwrap(), vec!["github"]);
    assert_eq!(vault.search_credentials("github.COM").unwrap(), vec!["github"]);
    assert_eq!(vault.search_credentials("money").unwrap(), vec!["bank"]);
    assert_eq!(vault.search_credentials("work").unwrap(), vec!["mail"]);
    assert_eq!(vault.search_credentials("").unwrap().len(), 3);
    assert!(vault.search_credentials("nomatch").unwrap().is_empty());
}

#[test]
fn search_does_not_match_secrets() {
    let vault = unlocked_service();
    vault
        .store_credential("a", CredentialRecord::new("findme"))
        .unwrap();
    assert!(vault.search_credentials("findme").unwrap().is_empty());
}

#[test]
fn filter_by_category_after_relock() {
    let vault = unlocked_service();
    vault
        .store_credential("bank", CredentialRecord::new("1").with_category(Category::Finance))
        .unwrap();
    vault
        .store_credential("jira", CredentialRecord::new("2").with_category(Category::Work))
        .unwrap();
    vault.store_credential("misc", CredentialRecord::new("3")).unwrap();

    // Force records to be loaded from storage rather than the cache.
    vault.lock();
    vault.unlock(PASSPHRASE).unwrap();

    assert_eq!(vault.filter_by_category(Category::Finance).unwrap(), vec!["bank"]);
    assert_eq!(vault.filter_by_category(Category::General).unwrap(), vec!["misc"]);
    assert!(vault.filter_by_category(Category::Social).unwrap().is_empty());
}

#[test]
fn all_fields_survive_storage() {
    let vault = unlocked_service();
    let expires = now() + chrono::Duration::days(30);
    let record = CredentialRecord::new("p@ss1")
        .with_title("GitHub")
        .with_identity("alice")
        .with_locator("https://github.com")
        .with_notes("2FA enabled")
        .with_category(Category::Work)
        .with_tag("dev")
        .with_expires(expires)
        .with_custom_field("pin", "1234", true);
    vault.store_credential("github", record).unwrap();
    let stored = vault.retrieve_credential("github").unwrap().unwrap();

    vault.lock();
    vault.unlock(PASSPHRASE).unwrap();
    let reloaded = vault.retrieve_credential("github").unwrap().unwrap();

    assert_eq!(reloaded, stored);
    assert_eq!(reloaded.title, "GitHub");
    assert_eq!(reloaded.custom_fields[0].value.as_str(), Some("1234"));
    assert!(reloaded.custom_fields[0].protected);
    assert_eq!(reloaded.expires, Some(expires));
}

#[test]
fn caller_history_survives_relock_unchanged() {
    let vault = unlocked_service();
    let mut record = CredentialRecord::new("current");
    record.history.push(HistoryEntry {
        secret: SecureBuffer::from("older"),
        changed_at: chrono::Utc::now(),
    });
    vault.store_credential("a", record).unwrap();
    let cached = vault.retrieve_credential("a").unwrap().unwrap();

    vault.lock();
    vault.unlock(PASSPHRASE).unwrap();
    let reloaded = vault.retrieve_credential("a").unwrap().unwrap();

    assert_eq!(cached, reloaded);
    assert_eq!(reloaded.history[0].secret.as_str(), Some("older"));
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

#[test]
fn explicit_expiry_is_reported() {
    let vault = unlocked_service();
    vault
        .store_credential(
            "old",
            CredentialRecord::new("1").with_expires(now() - chrono::Duration::days(1)),
        )
        .unwrap();
    vault
        .store_credential(
            "fresh",
            CredentialRecord::new("2").with_expires(now() + chrono::Duration::days(1)),
        )
        .unwrap();
    vault.store_credential("none", CredentialRecord::new("3")).unwrap();

    assert_eq!(vault.check_expired_credentials().unwrap(), vec!["old"]);
}

#[test]
fn expiry_check_respects_notify_setting() {
    let vault = unlocked_service();
    vault
        .store_credential(
            "old",
            CredentialRecord::new("1").with_expires(now() - chrono::Duration::days(1)),
        )
        .unwrap();
    vault.update_settings(Settings {
        notify_on_password_expiry: false,
        ..vault.settings()
    });
    assert!(vault.check_expired_credentials().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

#[test]
fn rotation_preserves_content() {
    let vault = unlocked_service();
    vault
        .store_credential("github", CredentialRecord::new("p@ss1").with_identity("alice"))
        .unwrap();
    vault
        .store_credential("bank", CredentialRecord::new("hunter2").with_category(Category::Finance))
        .unwrap();
    let before_github = vault.retrieve_credential("github").unwrap().unwrap();
    let before_bank = vault.retrieve_credential("bank").unwrap().unwrap();

    let report = vault.rotate_master_password(PASSPHRASE, "n3w-Passphrase").unwrap();
    assert!(report.is_complete());
    assert_eq!(report.migrated, 2);

    vault.lock();
    assert!(matches!(
        vault.unlock(PASSPHRASE).unwrap_err(),
        VaultError::InvalidPassphrase
    ));
    vault.unlock("n3w-Passphrase").unwrap();

    assert_eq!(vault.retrieve_credential("github").unwrap().unwrap(), before_github);
    assert_eq!(vault.retrieve_credential("bank").unwrap().unwrap(), before_bank);
}

#[test]
fn rotation_with_wrong_current_fails() {
    let vault = unlocked_service();
    assert!(matches!(
        vault.rotate_master_password("wrong", "n3w-Passphrase").unwrap_err(),
        VaultError::InvalidPassphrase
    ));
    vault.lock();
    vault.unlock(PASSPHRASE).unwrap();
}

#[test]
fn rotation_rejects_empty_new_passphrase() {
    let vault = unlocked_service();
    assert!(matches!(
        vault.rotate_master_password(PASSPHRASE, "").unwrap_err(),
        VaultError::InvalidArgument(_)
    ));
}

#[test]
fn rotation_to_same_passphrase_is_noop() {
    let vault = unlocked_service();
    vault.store_credential("a", CredentialRecord::new("1")).unwrap();
    let report = vault.rotate_master_password(PASSPHRASE, PASSPHRASE).unwrap();
    assert_eq!(report.migrated, 0);
    assert!(report.is_complete());

    vault.lock();
    vault.unlock(PASSPHRASE).unwrap();
    assert!(vault.retrieve_credential("a").unwrap().is_some());
}

#[test]
fn rotation_unlocks_a_locked_vault() {
    let vault = unlocked_service();
    vault.store_credential("a", CredentialRecord::new("1")).unwrap();
    vault.lock();

    let report = vault.rotate_master_password(PASSPHRASE, "n3w-Passphrase").unwrap();
    assert_eq!(report.migrated, 1);
    assert_eq!(vault.status(), VaultStatus::Unlocked);
}

#[test]
fn partial_rotation_reports_failures() {
    let storage = ProbeStorage::default();
    let vault = service_with(storage.clone());
    vault.initialize(PASSPHRASE).unwrap();
    vault.store_credential("a", CredentialRecord::new("1")).unwrap();
    vault.store_credential("b", CredentialRecord::new("2")).unwrap();

    storage.fail_store("b");
    let report = vault.rotate_master_password(PASSPHRASE, "n3w-Passphrase").unwrap();
    assert_eq!(report.migrated, 1);
    assert_eq!(report.failed, vec!["b"]);
    assert!(!report.is_complete());

    // The new passphrase is authoritative even though "b" was not migrated.
    vault.lock();
    vault.unlock("n3w-Passphrase").unwrap();
    assert!(vault.retrieve_credential("a").unwrap().is_some());
    assert!(vault.retrieve_credential("b").is_err());
}

#[test]
fn rotation_keeps_old_passphrase_when_metadata_write_fails() {
    let storage = ProbeStorage::default();
    let vault = service_with(storage.clone());
    vault.initialize(PASSPHRASE).unwrap();
    vault.store_credential("a", CredentialRecord::new("1")).unwrap();

    storage.fail_store("__vault_init__");
    assert!(matches!(
        vault
            .rotate_master_password(PASSPHRASE, "n3w-Passphrase")
            .unwrap_err(),
        VaultError::Storage(_)
    ));
    let cached = vault.retrieve_credential("a").unwrap().unwrap();
    assert_eq!(cached.secret.as_str(), Some("1"));

    vault.lock();
    assert!(matches!(
        vault.unlock("n3w-Passphrase").unwrap_err(),
        VaultError::InvalidPassphrase
    ));
    vault.unlock(PASSPHRASE).unwrap();
    let reloaded = vault.retrieve_credential("a").unwrap().unwrap();
    assert_eq!(reloaded.secret.as_str(), Some("1"));
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

#[test]
fn export_then_import_into_fresh_vault() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("backup.json");

    let source = unlocked_service();
    source
        .store_credential("github", CredentialRecord::new("p@ss1").with_identity("alice"))
        .unwrap();
    source.store_credential("bank", CredentialRecord::new("hunter2")).unwrap();
    assert_eq!(source.export_vault(&path, "export-pass").unwrap(), 2);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("CREDVAULT_EXPORT"));
    assert!(!text.contains("p@ss1"));
    assert!(!text.contains("alice"));

    let target = service_with(MemoryStorage::new());
    target.initialize("another-master").unwrap();
    let report = target.import_vault(&path, "export-pass").unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 0);

    assert_eq!(
        target.retrieve_credential("github").unwrap().unwrap(),
        source.retrieve_credential("github").unwrap().unwrap()
    );
}

#[test]
fn import_overwrites_existing_identifier() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("backup.json");

    let source = unlocked_service();
    source.store_credential("a", CredentialRecord::new("from-export")).unwrap();
    source.export_vault(&path, "export-pass").unwrap();

    let target = unlocked_service();
    target.store_credential("a", CredentialRecord::new("local")).unwrap();
    target.import_vault(&path, "export-pass").unwrap();

    let record = target.retrieve_credential("a").unwrap().unwrap();
    assert_eq!(record.secret.as_str(), Some("from-export"));
}

#[test]
fn import_over_existing_keeps_created_and_records_history() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("backup.json");

    // The export is older than the local credential it replaces.
    let source = unlocked_service();
    source.store_credential("a", CredentialRecord::new("from-export")).unwrap();
    source.export_vault(&path, "export-pass").unwrap();
    thread::sleep(Duration::from_millis(20));

    let target = unlocked_service();
    target.store_credential("a", CredentialRecord::new("local")).unwrap();
    let before = target.retrieve_credential("a").unwrap().unwrap();

    target.import_vault(&path, "export-pass").unwrap();
    let after = target.retrieve_credential("a").unwrap().unwrap();

    assert_eq!(after.secret.as_str(), Some("from-export"));
    assert_eq!(after.created, before.created);
    assert!(after.modified >= before.modified);
    assert_eq!(after.history.len(), 1);
    assert_eq!(after.history[0].secret.as_str(), Some("local"));

    target.lock();
    target.unlock(PASSPHRASE).unwrap();
    assert_eq!(target.retrieve_credential("a").unwrap().unwrap(), after);
}

#[test]
fn import_of_new_identifier_keeps_exported_timestamps() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("backup.json");

    let source = unlocked_service();
    source.store_credential("a", CredentialRecord::new("1")).unwrap();
    let exported = source.retrieve_credential("a").unwrap().unwrap();
    source.export_vault(&path, "export-pass").unwrap();

    let target = unlocked_service();
    target.import_vault(&path, "export-pass").unwrap();
    let imported = target.retrieve_credential("a").unwrap().unwrap();
    assert_eq!(imported.created, exported.created);
    assert_eq!(imported.modified, exported.modified);
}

#[test]
fn import_rejects_empty_passphrase() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("backup.json");

    let source = unlocked_service();
    source.store_credential("a", CredentialRecord::new("1")).unwrap();
    source.export_vault(&path, "export-pass").unwrap();

    let target = unlocked_service();
    assert!(matches!(
        target.import_vault(&path, "").unwrap_err(),
        VaultError::InvalidArgument(_)
    ));
}

#[test]
fn import_with_wrong_passphrase_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("backup.json");

    let source = unlocked_service();
    source.store_credential("a", CredentialRecord::new("1")).unwrap();
    source.export_vault(&path, "export-pass").unwrap();

    let target = unlocked_service();
    assert!(matches!(
        target.import_vault(&path, "wrong").unwrap_err(),
        VaultError::InvalidPassphrase
    ));
    assert!(target.list_identifiers().unwrap().is_empty());
}

#[test]
fn import_rejects_non_export_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("not-an-export.json");
    fs::write(&path, r#"{"hello":"world"}"#).unwrap();

    let vault = unlocked_service();
    assert!(vault.import_vault(&path, "export-pass").is_err());
}

#[test]
fn export_requires_unlocked_vault() {
    let dir = tempfile::TempDir::new().unwrap();
    let vault = unlocked_service();
    vault.lock();
    assert!(matches!(
        vault.export_vault(&dir.path().join("x.json"), "pw").unwrap_err(),
        VaultError::VaultLocked
    ));
}

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

#[test]
fn generated_password_meets_constraints() {
    let vault = unlocked_service();
    for _ in 0..50 {
        let pw = vault.generate_password(20, true, true, true).unwrap();
        assert_eq!(pw.chars().count(), 20);
        assert!(pw.chars().any(|c| c.is_ascii_lowercase()));
        assert!(pw.chars().any(|c| c.is_ascii_uppercase()));
        assert!(pw.chars().any(|c| c.is_ascii_digit()));
        assert!(pw.chars().any(|c| c.is_ascii_punctuation()));
    }
}

#[test]
fn generated_password_is_raised_to_minimum_length() {
    let vault = unlocked_service();
    let min = vault.settings().min_password_length;
    let pw = vault.generate_password(4, false, false, false).unwrap();
    assert_eq!(pw.len(), min);
}

#[test]
fn strength_ranks_weak_below_strong() {
    let vault = unlocked_service();
    assert!(
        vault.evaluate_password_strength("aaaaaaaa")
            < vault.evaluate_password_strength("aB3!aB3!aB3!aB3!")
    );
}

// ---------------------------------------------------------------------------
// Activity and auto-lock
// ---------------------------------------------------------------------------

#[test]
fn idle_vault_auto_locks() {
    let vault = unlocked_service();
    vault.store_credential("a", CredentialRecord::new("1")).unwrap();
    vault.update_settings(Settings {
        auto_lock_timeout_secs: 1,
        ..vault.settings()
    });

    thread::sleep(Duration::from_millis(1_100));

    assert_eq!(vault.status(), VaultStatus::Locked);
    assert!(matches!(
        vault.retrieve_credential("a").unwrap_err(),
        VaultError::VaultLocked
    ));

    vault.unlock(PASSPHRASE).unwrap();
    assert!(vault.retrieve_credential("a").unwrap().is_some());
}

#[test]
fn activity_callback_fires_on_operations() {
    let vault = unlocked_service();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    vault.set_activity_callback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    vault.store_credential("a", CredentialRecord::new("1")).unwrap();
    vault.retrieve_credential("a").unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_readers_and_writers() {
    let vault = Arc::new(unlocked_service());
    let done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let vault = Arc::clone(&vault);
            thread::spawn(move || {
                for i in 0..10 {
                    let id = format!("t{t}-{i}");
                    vault
                        .store_credential(&id, CredentialRecord::new(SecureBuffer::from(id.as_str())))
                        .unwrap();
                }
            })
        })
        .collect();

    let reader = {
        let vault = Arc::clone(&vault);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                if let Some(record) = vault.retrieve_credential("t0-0").unwrap() {
                    assert_eq!(record.secret.as_str(), Some("t0-0"));
                }
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    reader.join().unwrap();

    assert_eq!(vault.list_identifiers().unwrap().len(), 40);
}
