//! CredentialCodec: `CredentialRecord` <-> encrypted envelope bytes.
//!
//! Records are first mapped onto plain serde DTOs (timestamps as epoch
//! milliseconds), serialized to JSON inside a wiping buffer, and sealed
//! under the vault key with a fresh nonce.  The DTOs zero their strings on
//! drop, so the only long-lived copies of a secret are the `SecureBuffer`s
//! inside the record itself.

use std::io;
use std::mem;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::format::{Envelope, FORMAT_VERSION};
use super::record::{Category, CredentialRecord, CustomField, HistoryEntry};
use crate::crypto::{self, SecureBuffer, VaultKey};
use crate::errors::{Result, VaultError};

/// Encrypt `record` under `key` and return the serialized envelope.
pub fn encode(record: &CredentialRecord, key: &VaultKey) -> Result<Vec<u8>> {
    let dto = RecordDto::from_record(record)?;
    let plaintext = to_json(&dto, "record")?;
    seal_envelope(key, &plaintext)?.to_bytes()
}

/// Parse, authenticate and decrypt an envelope produced by `encode`.
///
/// Wrong key and tampered ciphertext both surface as
/// `AuthenticationFailed`; structural problems as `MalformedEnvelope`.
pub fn decode(blob: &[u8], key: &VaultKey) -> Result<CredentialRecord> {
    let envelope = Envelope::from_bytes(blob)?;
    let plaintext = open_envelope(&envelope, key)?;
    let mut dto: RecordDto = from_json(&plaintext, "record")?;
    dto.take_record()
}

/// Seal arbitrary bytes under a fresh nonce.
pub fn seal_envelope(key: &VaultKey, plaintext: &[u8]) -> Result<Envelope> {
    let nonce = crypto::generate_nonce()?;
    let sealed = crypto::seal(key, &nonce, plaintext)?;
    Ok(Envelope::new(nonce, sealed))
}

/// Verify and decrypt an envelope.  Size checks run before any crypto.
pub fn open_envelope(envelope: &Envelope, key: &VaultKey) -> Result<Zeroizing<Vec<u8>>> {
    let nonce = envelope.nonce()?;
    let tag = envelope.tag()?;
    crypto::open(key, &nonce, &envelope.data, &tag)
}

/// Serialize a full export snapshot (identifier + record pairs).
pub(crate) fn encode_snapshot<'a, I>(entries: I) -> Result<Zeroizing<Vec<u8>>>
where
    I: IntoIterator<Item = (&'a str, &'a CredentialRecord)>,
{
    let entries = entries
        .into_iter()
        .map(|(identifier, record)| {
            Ok(SnapshotEntryDto {
                identifier: identifier.to_string(),
                record: RecordDto::from_record(record)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let snapshot = SnapshotDto {
        version: FORMAT_VERSION.to_string(),
        entries,
    };
    to_json(&snapshot, "export snapshot")
}

/// Inverse of `encode_snapshot`.
pub(crate) fn decode_snapshot(plaintext: &[u8]) -> Result<Vec<(String, CredentialRecord)>> {
    let mut snapshot: SnapshotDto = from_json(plaintext, "export snapshot")?;

    snapshot
        .entries
        .iter_mut()
        .map(|entry| Ok((mem::take(&mut entry.identifier), entry.record.take_record()?)))
        .collect()
}

/// Serialize into a buffer allocated once at its final size, so no
/// reallocation leaves a stale copy of the plaintext on the heap.
fn to_json<T: Serialize>(value: &T, what: &str) -> Result<Zeroizing<Vec<u8>>> {
    let err = |e: serde_json::Error| VaultError::Serialization(format!("{what}: {e}"));

    let mut counter = ByteCounter(0);
    serde_json::to_writer(&mut counter, value).map_err(err)?;

    let mut out = Zeroizing::new(Vec::with_capacity(counter.0));
    serde_json::to_writer(&mut *out, value).map_err(err)?;
    Ok(out)
}

/// `io::Write` sink that only counts bytes.
struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn from_json<T: for<'de> Deserialize<'de>>(bytes: &[u8], what: &str) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| VaultError::MalformedEnvelope(format!("{what}: {e}")))
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct SnapshotDto {
    #[zeroize(skip)]
    version: String,
    entries: Vec<SnapshotEntryDto>,
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct SnapshotEntryDto {
    identifier: String,
    record: RecordDto,
}

#[derive(Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct RecordDto {
    secret: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    identity: String,
    #[serde(default)]
    locator: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    #[zeroize(skip)]
    category: Category,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    custom_fields: Vec<CustomFieldDto>,
    created: i64,
    modified: i64,
    #[serde(default)]
    expires: Option<i64>,
    #[serde(default)]
    history: Vec<HistoryDto>,
}

#[derive(Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct HistoryDto {
    secret: String,
    changed_at: i64,
}

#[derive(Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct CustomFieldDto {
    name: String,
    value: String,
    #[serde(default)]
    protected: bool,
}

impl RecordDto {
    fn from_record(record: &CredentialRecord) -> Result<Self> {
        Ok(Self {
            secret: secret_string(&record.secret, "secret")?,
            title: record.title.clone(),
            identity: record.identity.clone(),
            locator: record.locator.clone(),
            notes: record.notes.clone(),
            category: record.category,
            tags: record.tags.clone(),
            custom_fields: record
                .custom_fields
                .iter()
                .map(|f| {
                    Ok(CustomFieldDto {
                        name: f.name.clone(),
                        value: secret_string(&f.value, "custom field")?,
                        protected: f.protected,
                    })
                })
                .collect::<Result<_>>()?,
            created: record.created.timestamp_millis(),
            modified: record.modified.timestamp_millis(),
            expires: record.expires.map(|t| t.timestamp_millis()),
            history: record
                .history
                .iter()
                .map(|h| {
                    Ok(HistoryDto {
                        secret: secret_string(&h.secret, "history")?,
                        changed_at: h.changed_at.timestamp_millis(),
                    })
                })
                .collect::<Result<_>>()?,
        })
    }

    /// Move the fields out into a record.  Strings are moved, not copied,
    /// so the secret bytes end up only in `SecureBuffer`s.
    fn take_record(&mut self) -> Result<CredentialRecord> {
        let created = millis(self.created, "created")?;
        let modified = millis(self.modified, "modified")?;
        let expires = self.expires.map(|ms| millis(ms, "expires")).transpose()?;

        let history = self
            .history
            .iter_mut()
            .map(|h| {
                Ok(HistoryEntry {
                    changed_at: millis(h.changed_at, "history")?,
                    secret: SecureBuffer::from(mem::take(&mut h.secret)),
                })
            })
            .collect::<Result<_>>()?;

        let custom_fields = self
            .custom_fields
            .iter_mut()
            .map(|f| CustomField {
                name: mem::take(&mut f.name),
                value: SecureBuffer::from(mem::take(&mut f.value)),
                protected: f.protected,
            })
            .collect();

        Ok(CredentialRecord {
            secret: SecureBuffer::from(mem::take(&mut self.secret)),
            title: mem::take(&mut self.title),
            identity: mem::take(&mut self.identity),
            locator: mem::take(&mut self.locator),
            notes: mem::take(&mut self.notes),
            category: self.category,
            tags: mem::take(&mut self.tags),
            custom_fields,
            created,
            modified,
            expires,
            history,
        })
    }
}

/// Secrets travel as JSON strings, so they must be valid UTF-8.
fn secret_string(buffer: &SecureBuffer, what: &str) -> Result<String> {
    buffer
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| VaultError::Serialization(format!("{what} is not valid UTF-8")))
}

fn millis(ms: i64, field: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| VaultError::MalformedEnvelope(format!("{field}: timestamp out of range")))
}
