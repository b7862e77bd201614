//! Wire envelopes stored through `SecureStorage` and written to export files.
//!
//! Every envelope is JSON with base64 (standard, padded) byte fields:
//!
//! ```text
//! record    { "iv", "tag", "data" }
//! metadata  { "version", "iterations", "salt", "iv", "tag", "data" }
//! export    { "format", "version", "iterations", "salt", "iv", "tag", "data" }
//! ```
//!
//! Field sizes are only checked when the raw arrays are requested, so a
//! structurally valid JSON document with a 5-byte nonce still parses and
//! then fails with `MalformedEnvelope` at the point of use.

use serde::{Deserialize, Serialize};

use crate::crypto::{Sealed, NONCE_LEN, SALT_LEN, TAG_LEN};
use crate::errors::{Result, VaultError};

/// Version string written into metadata and exports.
pub const FORMAT_VERSION: &str = "1";

/// Discriminator for export files; never appears in live metadata.
pub const EXPORT_FORMAT: &str = "CREDVAULT_EXPORT";

/// Nonce, tag and ciphertext of one AES-256-GCM seal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub iv: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub tag: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub data: Vec<u8>,
}

impl Envelope {
    pub fn new(nonce: [u8; NONCE_LEN], sealed: Sealed) -> Self {
        Self {
            iv: nonce.to_vec(),
            tag: sealed.tag.to_vec(),
            data: sealed.ciphertext,
        }
    }

    pub fn nonce(&self) -> Result<[u8; NONCE_LEN]> {
        fixed(&self.iv, "iv")
    }

    pub fn tag(&self) -> Result<[u8; TAG_LEN]> {
        fixed(&self.tag, "tag")
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| VaultError::Serialization(format!("record envelope: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| VaultError::MalformedEnvelope(format!("record envelope: {e}")))
    }
}

/// Persisted under `__vault_init__`.  Replaced wholesale on rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultMetadata {
    pub version: String,

    pub iterations: u32,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// The sealed verifier string.
    #[serde(flatten)]
    pub verifier: Envelope,
}

impl VaultMetadata {
    pub fn salt(&self) -> Result<[u8; SALT_LEN]> {
        fixed(&self.salt, "salt")
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| VaultError::Serialization(format!("metadata: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| VaultError::MalformedEnvelope(format!("metadata: {e}")))
    }
}

/// Self-describing export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub format: String,

    pub version: String,

    pub iterations: u32,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    #[serde(flatten)]
    pub payload: Envelope,
}

impl ExportEnvelope {
    pub fn salt(&self) -> Result<[u8; SALT_LEN]> {
        fixed(&self.salt, "salt")
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::Serialization(format!("export envelope: {e}")))
    }

    /// Parse an export file, rejecting anything whose `format` is not
    /// `EXPORT_FORMAT` (live metadata in particular).
    pub fn from_json(text: &str) -> Result<Self> {
        let envelope: Self = serde_json::from_str(text)
            .map_err(|e| VaultError::MalformedEnvelope(format!("export file: {e}")))?;

        if envelope.format != EXPORT_FORMAT {
            return Err(VaultError::MalformedEnvelope(format!(
                "export file: unexpected format '{}'",
                envelope.format
            )));
        }
        Ok(envelope)
    }
}

fn fixed<const N: usize>(bytes: &[u8], field: &str) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        VaultError::MalformedEnvelope(format!(
            "{field}: expected {N} bytes, found {}",
            bytes.len()
        ))
    })
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(s.as_bytes()).map_err(serde::de::Error::custom)
}
