//! Vault module — encrypted credential storage.
//!
//! This module provides:
//! - `CredentialRecord` and friends (`record`)
//! - JSON wire envelopes with base64 fields (`format`)
//! - Record encryption and decryption (`codec`)
//! - The lock/unlock state machine (`state`)
//! - The thread-safe `VaultService` façade (`service`)

pub mod codec;
pub mod format;
pub mod record;
pub mod service;
pub mod state;

// Re-export the most commonly used items.
pub use format::{Envelope, ExportEnvelope, VaultMetadata};
pub use record::{Category, CredentialRecord, CustomField, HistoryEntry};
pub use service::{ImportReport, RotationReport, VaultService};
pub use state::{VaultState, VaultStatus};
