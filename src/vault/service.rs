//! VaultService: the thread-safe façade over state, codec and storage.
//!
//! Locking:
//! - `state` (`RwLock<VaultState>`) guards the phase, the live key and the
//!   decrypted cache.  Every mutating operation holds it exclusively for
//!   its whole duration, storage calls included.
//! - `settings` is read with a short-lived shared lock and never held
//!   across a `state` acquisition.
//! - `activity` (idle timer + callback) is innermost.  The callback runs
//!   after every other lock has been released.

use std::collections::BTreeSet;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::time::{Duration, Instant};

use zeroize::Zeroizing;

use super::codec;
use super::format::{ExportEnvelope, EXPORT_FORMAT, FORMAT_VERSION};
use super::record::{self, Category, CredentialRecord};
use super::state::{self, Session, VaultState, VaultStatus};
use crate::config::Settings;
use crate::crypto::{self, kdf, VaultKey};
use crate::errors::{Result, VaultError};
use crate::password::{self, CharClasses, Strength};
use crate::storage::{self, file::write_private, SecureStorage, INIT_KEY};

/// Longest identifier accepted by `store_credential`.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Invoked whenever the vault records user activity.
pub type ActivityCallback = Arc<dyn Fn() + Send + Sync>;

/// Outcome of `rotate_master_password`.
///
/// Rotation is not atomic: once the new metadata is persisted the new
/// passphrase is authoritative.  Identifiers in `failed` could not be
/// re-encrypted; while the vault stays unlocked their decrypted copies
/// remain cached and can be stored again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationReport {
    pub migrated: usize,
    pub failed: Vec<String>,
}

impl RotationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of `import_vault`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

struct Activity {
    last: Instant,
    callback: Option<ActivityCallback>,
}

#[derive(Clone, Copy)]
enum StoreMode {
    /// Caller update: keeps `created`, stamps `modified`, records history.
    Update,
    /// Import: new identifiers are taken as-is; existing ones keep
    /// `created` and record the replaced secret.
    Import,
}

pub struct VaultService {
    storage: Box<dyn SecureStorage>,
    state: RwLock<VaultState>,
    settings: RwLock<Settings>,
    activity: Mutex<Activity>,
}

impl VaultService {
    /// Wrap `storage`.  The vault starts `Locked` if it already holds
    /// metadata and `Uninitialized` otherwise.
    pub fn new(storage: Box<dyn SecureStorage>, settings: Settings) -> Result<Self> {
        let state = VaultState::detect(storage.as_ref())?;
        Ok(Self {
            storage,
            state: RwLock::new(state),
            settings: RwLock::new(settings),
            activity: Mutex::new(Activity {
                last: Instant::now(),
                callback: None,
            }),
        })
    }

    /// Load `credvault.toml` from `base_dir` and open the configured backend.
    pub fn open(base_dir: &Path) -> Result<Self> {
        let settings = Settings::load(base_dir)?;
        let storage = storage::open_storage(&settings, base_dir)?;
        Self::new(storage, settings)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create the vault.  It is unlocked on success.
    pub fn initialize(&self, passphrase: &str) -> Result<()> {
        let iterations = self.read_settings().key_iterations;
        self.write_state()
            .initialize(self.storage.as_ref(), passphrase.as_bytes(), iterations)?;
        self.touch();
        Ok(())
    }

    pub fn unlock(&self, passphrase: &str) -> Result<()> {
        {
            let mut state = self.write_state();
            self.expire_if_idle(&mut state);
            state.unlock(self.storage.as_ref(), passphrase.as_bytes())?;
        }
        self.touch();
        Ok(())
    }

    /// Wipe the key and every cached record.  Safe to call in any state.
    pub fn lock(&self) {
        self.write_state().lock();
    }

    /// Current phase.  An unlocked vault past its idle timeout reports
    /// `Locked`; the wipe itself happens on the next operation.
    pub fn status(&self) -> VaultStatus {
        let status = self.read_state().status();
        if status == VaultStatus::Unlocked && self.idle_expired() {
            VaultStatus::Locked
        } else {
            status
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.status() != VaultStatus::Uninitialized
    }

    pub fn is_locked(&self) -> bool {
        self.status() != VaultStatus::Unlocked
    }

    // ------------------------------------------------------------------
    // Settings and activity
    // ------------------------------------------------------------------

    pub fn settings(&self) -> Settings {
        self.read_settings().clone()
    }

    pub fn update_settings(&self, settings: Settings) {
        *self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// Register `callback` to run on every activity refresh.  A panic in
    /// the callback is logged and otherwise ignored.
    pub fn set_activity_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.activity().callback = Some(Arc::new(callback));
    }

    // ------------------------------------------------------------------
    // Credentials
    // ------------------------------------------------------------------

    /// Insert or overwrite `identifier`.
    ///
    /// `created` is kept from an existing record, `modified` is set to now
    /// and a changed secret pushes the previous one onto `history`.  The
    /// cache only changes after the backend accepted the write.
    pub fn store_credential(&self, identifier: &str, record: CredentialRecord) -> Result<()> {
        validate_identifier(identifier)?;
        let history_limit = self.read_settings().history_limit;
        {
            let mut state = self.unlocked_write()?;
            let session = state.session_mut()?;
            self.store_locked(session, identifier, record, StoreMode::Update, history_limit)?;
        }
        self.touch();
        Ok(())
    }

    /// Return a copy of `identifier`, or `None` if it does not exist.
    pub fn retrieve_credential(&self, identifier: &str) -> Result<Option<CredentialRecord>> {
        validate_identifier(identifier)?;

        let cached = {
            let state = self.read_state();
            if state.is_unlocked() && !self.idle_expired() {
                state.session()?.cache.get(identifier).cloned()
            } else {
                None
            }
        };

        let record = match cached {
            Some(record) => Some(record),
            None => {
                let mut state = self.unlocked_write()?;
                let session = state.session_mut()?;
                let hit = session.cache.get(identifier).cloned();
                if hit.is_some() {
                    hit
                } else {
                    let fetched = self.fetch(&session.key, identifier)?;
                    if let Some(record) = &fetched {
                        session.cache.insert(identifier.to_string(), record.clone());
                    }
                    fetched
                }
            }
        };

        self.touch();
        Ok(record)
    }

    /// Remove `identifier`.  Removing an absent identifier succeeds.
    pub fn delete_credential(&self, identifier: &str) -> Result<()> {
        validate_identifier(identifier)?;
        {
            let mut state = self.unlocked_write()?;
            let session = state.session_mut()?;
            self.storage.remove(identifier)?;
            // The dropped record wipes its own secrets.
            session.cache.remove(identifier);
        }
        tracing::debug!(identifier, "credential deleted");
        self.touch();
        Ok(())
    }

    /// Every stored identifier, sorted.
    pub fn list_identifiers(&self) -> Result<Vec<String>> {
        let identifiers = {
            let state = self.unlocked_write()?;
            self.known_identifiers(state.session()?)?
        };
        self.touch();
        Ok(identifiers)
    }

    /// Identifiers whose identifier, title, identity, locator or tags
    /// contain `query` (case-insensitive).  An empty query matches all.
    pub fn search_credentials(&self, query: &str) -> Result<Vec<String>> {
        let needle = query.to_lowercase();
        let matches = {
            let mut state = self.unlocked_write()?;
            let session = state.session_mut()?;
            if needle.is_empty() {
                self.known_identifiers(session)?
            } else {
                let (readable, _) = self.load_all(session)?;
                readable
                    .into_iter()
                    .filter(|id| {
                        session
                            .cache
                            .get(id)
                            .is_some_and(|record| record.matches(id, &needle))
                    })
                    .collect()
            }
        };
        self.touch();
        Ok(matches)
    }

    pub fn filter_by_category(&self, category: Category) -> Result<Vec<String>> {
        self.select(|record| record.category == category)
    }

    /// Identifiers past their explicit expiry or not modified within
    /// `password_expiry_days` (0 disables the age check).  Empty when
    /// `notify_on_password_expiry` is off.
    pub fn check_expired_credentials(&self) -> Result<Vec<String>> {
        let (enabled, days) = {
            let settings = self.read_settings();
            (settings.notify_on_password_expiry, settings.password_expiry_days)
        };
        if !enabled {
            drop(self.unlocked_write()?);
            return Ok(Vec::new());
        }

        let now = record::now();
        let max_age = if days == 0 {
            chrono::Duration::MAX
        } else {
            chrono::Duration::days(i64::from(days))
        };
        self.select(|record| record.is_expired(now, max_age))
    }

    // ------------------------------------------------------------------
    // Master passphrase
    // ------------------------------------------------------------------

    /// Re-key the vault under `new`.
    ///
    /// `current` is verified against the stored metadata even if the vault
    /// is already unlocked, and a locked vault is unlocked by it.  An
    /// identical `new` is a successful no-op.  See `RotationReport` for
    /// what happens when some records cannot be re-encrypted.
    pub fn rotate_master_password(&self, current: &str, new: &str) -> Result<RotationReport> {
        if new.is_empty() {
            return Err(VaultError::InvalidArgument(
                "new passphrase must not be empty".into(),
            ));
        }
        let iterations = self.read_settings().key_iterations;

        let report = {
            let mut state = self.write_state();
            self.expire_if_idle(&mut state);

            let (_, current_key) = state::verify_passphrase(self.storage.as_ref(), current.as_bytes())?;
            if !state.is_unlocked() {
                state.install_key(current_key);
            }

            if current == new {
                RotationReport::default()
            } else {
                self.rekey_locked(state.session_mut()?, new, iterations)?
            }
        };

        self.touch();
        Ok(report)
    }

    fn rekey_locked(&self, session: &mut Session, new: &str, iterations: u32) -> Result<RotationReport> {
        let (readable, unreadable) = self.load_all(session)?;

        let (metadata, new_key) = state::new_metadata(new.as_bytes(), iterations)?;
        self.storage.store(INIT_KEY, &metadata.to_bytes()?)?;
        // From here on the new passphrase is authoritative.  The old key is
        // wiped as it is replaced.
        session.key = new_key;

        let mut report = RotationReport {
            migrated: 0,
            failed: unreadable,
        };
        for identifier in readable {
            let Some(record) = session.cache.get(&identifier) else {
                continue;
            };
            let result = codec::encode(record, &session.key)
                .and_then(|blob| self.storage.store(&identifier, &blob));
            match result {
                Ok(()) => report.migrated += 1,
                Err(e) => {
                    tracing::error!(identifier = %identifier, error = %e, "credential not re-encrypted");
                    report.failed.push(identifier);
                }
            }
        }

        tracing::info!(
            migrated = report.migrated,
            failed = report.failed.len(),
            "master passphrase rotated"
        );
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Export / import
    // ------------------------------------------------------------------

    /// Write every readable credential to `path`, sealed under a key
    /// derived from `passphrase`.  Returns the number exported.
    pub fn export_vault(&self, path: &Path, passphrase: &str) -> Result<usize> {
        if passphrase.is_empty() {
            return Err(VaultError::InvalidArgument(
                "export passphrase must not be empty".into(),
            ));
        }
        let iterations = kdf::effective_iterations(self.read_settings().export_iterations);

        let (count, snapshot) = {
            let mut state = self.unlocked_write()?;
            let session = state.session_mut()?;
            let (readable, _) = self.load_all(session)?;
            let entries = readable
                .iter()
                .filter_map(|id| session.cache.get(id).map(|record| (id.as_str(), record)));
            (readable.len(), codec::encode_snapshot(entries)?)
        };

        let salt = crypto::generate_salt()?;
        let key = crypto::derive_key(passphrase.as_bytes(), &salt, iterations)?;
        let envelope = ExportEnvelope {
            format: EXPORT_FORMAT.to_string(),
            version: FORMAT_VERSION.to_string(),
            iterations,
            salt: salt.to_vec(),
            payload: codec::seal_envelope(&key, &snapshot)?,
        };
        write_private(path, envelope.to_pretty_json()?.as_bytes())?;

        tracing::info!(path = %path.display(), count, "vault exported");
        self.touch();
        Ok(count)
    }

    /// Load an export file, overwriting identifiers that already exist.
    ///
    /// An overwritten credential keeps its local `created`, and its local
    /// secret is pushed onto the imported history if it differs.
    ///
    /// A wrong export passphrase is `InvalidPassphrase`.  Entries with an
    /// unusable identifier or that fail to persist are skipped.
    pub fn import_vault(&self, path: &Path, passphrase: &str) -> Result<ImportReport> {
        if passphrase.is_empty() {
            return Err(VaultError::InvalidArgument(
                "export passphrase must not be empty".into(),
            ));
        }
        let history_limit = self.read_settings().history_limit;
        drop(self.unlocked_write()?);

        let text = fs::read_to_string(path)?;
        let envelope = ExportEnvelope::from_json(&text)?;
        let key = crypto::derive_key(passphrase.as_bytes(), &envelope.salt()?, envelope.iterations)?;
        let plaintext = codec::open_envelope(&envelope.payload, &key).map_err(|e| match e {
            VaultError::AuthenticationFailed => VaultError::InvalidPassphrase,
            other => other,
        })?;
        let entries = codec::decode_snapshot(&plaintext)?;

        let report = {
            let mut state = self.unlocked_write()?;
            let session = state.session_mut()?;
            let mut report = ImportReport::default();
            for (identifier, record) in entries {
                let result = validate_identifier(&identifier).and_then(|()| {
                    self.store_locked(session, &identifier, record, StoreMode::Import, history_limit)
                });
                match result {
                    Ok(()) => report.imported += 1,
                    Err(e) => {
                        tracing::warn!(identifier = %identifier, error = %e, "skipping imported credential");
                        report.skipped += 1;
                    }
                }
            }
            report
        };

        tracing::info!(
            path = %path.display(),
            imported = report.imported,
            skipped = report.skipped,
            "vault imported"
        );
        self.touch();
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Passwords
    // ------------------------------------------------------------------

    /// Generate a password.  Classes forced by the settings are added to
    /// the requested ones; the length is raised to `min_password_length`
    /// and zero means `password::DEFAULT_LENGTH`.
    pub fn generate_password(
        &self,
        length: usize,
        include_special: bool,
        include_numbers: bool,
        include_mixed_case: bool,
    ) -> Result<Zeroizing<String>> {
        drop(self.unlocked_write()?);
        let settings = self.settings();

        let classes = CharClasses {
            special: include_special || settings.require_special_chars,
            numbers: include_numbers || settings.require_numbers,
            mixed_case: include_mixed_case || settings.require_mixed_case,
        };
        let requested = if length == 0 {
            password::DEFAULT_LENGTH
        } else {
            length
        };
        let generated = password::generate(requested.max(settings.min_password_length), classes);

        self.touch();
        Ok(generated)
    }

    /// Heuristic strength of `password`; see `password::strength`.
    pub fn evaluate_password_strength(&self, password: &str) -> Strength {
        password::evaluate(password)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn read_state(&self) -> RwLockReadGuard<'_, VaultState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, VaultState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_settings(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn activity(&self) -> MutexGuard<'_, Activity> {
        self.activity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn idle_expired(&self) -> bool {
        let timeout = self.read_settings().auto_lock_timeout_secs;
        timeout > 0 && self.activity().last.elapsed() >= Duration::from_secs(timeout)
    }

    /// Lock an unlocked vault that has been idle too long.  Returns `true`
    /// if it did.
    fn expire_if_idle(&self, state: &mut VaultState) -> bool {
        if state.is_unlocked() && self.idle_expired() {
            tracing::info!("auto-locking idle vault");
            state.lock();
            return true;
        }
        false
    }

    /// Exclusive access to a vault that is unlocked and not idle.
    fn unlocked_write(&self) -> Result<RwLockWriteGuard<'_, VaultState>> {
        let mut state = self.write_state();
        if self.expire_if_idle(&mut state) {
            return Err(VaultError::VaultLocked);
        }
        state.session()?;
        Ok(state)
    }

    /// Refresh the idle timer and notify the callback.
    fn touch(&self) {
        let callback = {
            let mut activity = self.activity();
            activity.last = Instant::now();
            activity.callback.clone()
        };
        if let Some(callback) = callback {
            if panic::catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                tracing::warn!("activity callback panicked");
            }
        }
    }

    fn fetch(&self, key: &VaultKey, identifier: &str) -> Result<Option<CredentialRecord>> {
        match self.storage.retrieve(identifier)? {
            Some(blob) => codec::decode(&blob, key).map(Some),
            None => Ok(None),
        }
    }

    fn known_identifiers(&self, session: &Session) -> Result<Vec<String>> {
        let mut identifiers: BTreeSet<String> = self
            .storage
            .list_keys()?
            .into_iter()
            .filter(|key| !storage::is_reserved(key))
            .collect();
        identifiers.extend(session.cache.keys().cloned());
        Ok(identifiers.into_iter().collect())
    }

    /// Decrypt every stored record into the cache.
    ///
    /// Returns `(readable, unreadable)` identifiers, both sorted.  Records
    /// that fail to decrypt are logged and left out of the cache.
    fn load_all(&self, session: &mut Session) -> Result<(Vec<String>, Vec<String>)> {
        let mut readable = Vec::new();
        let mut unreadable = Vec::new();

        for identifier in self.known_identifiers(session)? {
            if !session.cache.contains_key(&identifier) {
                match self.fetch(&session.key, &identifier) {
                    Ok(Some(record)) => {
                        session.cache.insert(identifier.clone(), record);
                    }
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::warn!(identifier = %identifier, error = %e, "credential unreadable");
                        unreadable.push(identifier);
                        continue;
                    }
                }
            }
            readable.push(identifier);
        }
        Ok((readable, unreadable))
    }

    fn select(&self, predicate: impl Fn(&CredentialRecord) -> bool) -> Result<Vec<String>> {
        let selected = {
            let mut state = self.unlocked_write()?;
            let session = state.session_mut()?;
            let (readable, _) = self.load_all(session)?;
            readable
                .into_iter()
                .filter(|id| session.cache.get(id).is_some_and(&predicate))
                .collect()
        };
        self.touch();
        Ok(selected)
    }

    fn store_locked(
        &self,
        session: &mut Session,
        identifier: &str,
        mut record: CredentialRecord,
        mode: StoreMode,
        history_limit: usize,
    ) -> Result<()> {
        record.truncate_timestamps();
        let now = record::now();
        let previous = self.existing(session, identifier)?;

        match (mode, previous) {
            (StoreMode::Update, Some(mut previous)) => {
                record.created = previous.created;
                record.history = std::mem::take(&mut previous.history);
                if previous.secret != record.secret {
                    record.push_history(previous.secret.take(), now, history_limit);
                }
                record.modified = now;
            }
            (StoreMode::Update, None) => {
                record.created = record.created.min(now);
                record.modified = now;
            }
            (StoreMode::Import, Some(mut previous)) => {
                // The imported history is kept; the replaced local secret joins it.
                record.created = previous.created;
                if previous.secret != record.secret {
                    record.push_history(previous.secret.take(), now, history_limit);
                }
                record.modified = record.modified.max(now);
            }
            (StoreMode::Import, None) => {
                if record.modified < record.created {
                    record.modified = record.created;
                }
            }
        }

        let blob = codec::encode(&record, &session.key)?;
        self.storage.store(identifier, &blob)?;
        session.cache.insert(identifier.to_string(), record);
        tracing::debug!(identifier, "credential stored");
        Ok(())
    }

    /// The current record for `identifier`, if any.  A blob that no longer
    /// decrypts is treated as absent so it can be overwritten.
    fn existing(&self, session: &Session, identifier: &str) -> Result<Option<CredentialRecord>> {
        if let Some(record) = session.cache.get(identifier) {
            return Ok(Some(record.clone()));
        }
        match self.fetch(&session.key, identifier) {
            Ok(record) => Ok(record),
            Err(e @ VaultError::Storage(_)) => Err(e),
            Err(e) => {
                tracing::warn!(identifier, error = %e, "replacing unreadable credential");
                Ok(None)
            }
        }
    }
}

fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(VaultError::InvalidArgument("identifier must not be empty".into()));
    }
    if storage::is_reserved(identifier) {
        return Err(VaultError::InvalidArgument(format!(
            "'{identifier}' is a reserved identifier"
        )));
    }
    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(VaultError::InvalidArgument(format!(
            "identifier longer than {MAX_IDENTIFIER_LEN} bytes"
        )));
    }
    Ok(())
}
