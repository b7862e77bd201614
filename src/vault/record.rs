//! `CredentialRecord` and its parts.
//!
//! A record holds one secret plus descriptive metadata.  The secret, every
//! historical secret and every custom field value live in `SecureBuffer`s,
//! so dropping a record wipes all of its sensitive bytes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::SecureBuffer;
use crate::errors::{Result, VaultError};

/// Current time truncated to millisecond precision, the resolution used
/// on the wire.  Records stamped with this survive an encode/decode cycle
/// unchanged.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Broad grouping used by `filter_by_category`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Finance,
    Work,
    Personal,
    Social,
    Entertainment,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::General,
        Category::Finance,
        Category::Work,
        Category::Personal,
        Category::Social,
        Category::Entertainment,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Finance => "finance",
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Social => "social",
            Category::Entertainment => "entertainment",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| VaultError::InvalidArgument(format!("unknown category '{s}'")))
    }
}

/// A previous value of a record's secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub secret: SecureBuffer,
    pub changed_at: DateTime<Utc>,
}

/// An extra named value attached to a record.
///
/// `protected` marks values a UI should mask; every value is stored in a
/// `SecureBuffer` regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomField {
    pub name: String,
    pub value: SecureBuffer,
    pub protected: bool,
}

/// One stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub secret: SecureBuffer,
    pub title: String,
    pub identity: String,
    pub locator: String,
    pub notes: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub custom_fields: Vec<CustomField>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    /// Prior secrets, newest last.
    pub history: Vec<HistoryEntry>,
}

impl CredentialRecord {
    /// A new record stamped with the current time.
    pub fn new(secret: impl Into<SecureBuffer>) -> Self {
        let ts = now();
        Self {
            secret: secret.into(),
            title: String::new(),
            identity: String::new(),
            locator: String::new(),
            notes: String::new(),
            category: Category::default(),
            tags: Vec::new(),
            custom_fields: Vec::new(),
            created: ts,
            modified: ts,
            expires: None,
            history: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = locator.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_custom_field(
        mut self,
        name: impl Into<String>,
        value: impl Into<SecureBuffer>,
        protected: bool,
    ) -> Self {
        self.custom_fields.push(CustomField {
            name: name.into(),
            value: value.into(),
            protected,
        });
        self
    }

    /// Case-insensitive substring match over identifier, title, identity,
    /// locator and tags.  `needle` must already be lower-case.
    pub(crate) fn matches(&self, identifier: &str, needle: &str) -> bool {
        let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

        contains(identifier)
            || contains(&self.title)
            || contains(&self.identity)
            || contains(&self.locator)
            || self.tags.iter().any(|t| contains(t))
    }

    /// `true` if the explicit expiry has passed or the secret has not
    /// changed for longer than `max_age`.
    pub fn is_expired(&self, at: DateTime<Utc>, max_age: Duration) -> bool {
        if self.expires.is_some_and(|exp| exp <= at) {
            return true;
        }
        at - self.modified >= max_age
    }

    /// Append `previous` to the history, dropping the oldest entries
    /// beyond `limit`.
    pub(crate) fn push_history(&mut self, previous: SecureBuffer, at: DateTime<Utc>, limit: usize) {
        self.history.push(HistoryEntry {
            secret: previous,
            changed_at: at,
        });
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            // Dropped entries wipe themselves.
            self.history.drain(..excess);
        }
    }

    /// Truncate every timestamp to the millisecond resolution of the wire
    /// format, so a cached record equals its decoded copy.
    pub(crate) fn truncate_timestamps(&mut self) {
        self.created = self.created.trunc_subsecs(3);
        self.modified = self.modified.trunc_subsecs(3);
        self.expires = self.expires.map(|t| t.trunc_subsecs(3));
        for entry in &mut self.history {
            entry.changed_at = entry.changed_at.trunc_subsecs(3);
        }
    }

    /// Wipe every secret byte held by this record.
    pub fn wipe(&mut self) {
        self.secret.clear();
        for entry in &mut self.history {
            entry.secret.clear();
        }
        for field in &mut self.custom_fields {
            field.value.clear();
        }
        self.history.clear();
    }
}
