//! Owned buffers for sensitive bytes.
//!
//! `SecureBuffer` holds a secret (a password, a decrypted payload) and
//! overwrites it with zeros when it is dropped or cleared.  The wipe goes
//! through `zeroize`, which uses volatile writes plus a compiler fence so
//! it cannot be optimized away.
//!
//! The type is deliberately not `Copy`.  `Clone` exists for the few places
//! that must hand out a deep copy (returning a record to a caller); moving
//! a buffer transfers ownership and `take` leaves an empty buffer behind.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A heap buffer that is zeroed before its memory is released.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureBuffer {
    bytes: Vec<u8>,
}

impl SecureBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `bytes` into a new buffer.  The caller is responsible for
    /// wiping its own copy.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Raw access to the secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The secret as UTF-8 text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Wipe the contents and truncate to zero length.
    ///
    /// `Vec::zeroize` also clears the spare capacity, so bytes left over
    /// from earlier reallocations inside this allocation are covered too.
    pub fn clear(&mut self) {
        self.bytes.zeroize();
    }

    /// Move the contents out, leaving this buffer empty.
    pub fn take(&mut self) -> SecureBuffer {
        std::mem::take(self)
    }
}

impl From<Vec<u8>> for SecureBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// Takes ownership of the string's allocation; no copy is made.
impl From<String> for SecureBuffer {
    fn from(s: String) -> Self {
        Self {
            bytes: s.into_bytes(),
        }
    }
}

impl From<&str> for SecureBuffer {
    fn from(s: &str) -> Self {
        Self::from_slice(s.as_bytes())
    }
}

/// Constant-time comparison so equality checks do not leak how many
/// leading bytes matched.
impl PartialEq for SecureBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for SecureBuffer {}

impl fmt::Debug for SecureBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureBuffer([REDACTED; {}])", self.bytes.len())
    }
}
