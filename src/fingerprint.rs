use std::fmt;
use std::hash::{Hash, Hasher};

use crate::hash::{EMPTY_BYTE, fingerprint_bytes};

/// Longest supported fingerprint, in bytes.
pub const MAX_FINGERPRINT_LEN: usize = 8;

/// A short digest of a key, stored in place of the key itself.
///
/// Occupied slots hold fingerprints whose bytes are all non-zero; the
/// all-zero fingerprint marks an empty slot. Equality is byte-wise, so two
/// different keys may compare equal.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    bytes: [u8; MAX_FINGERPRINT_LEN],
    len: u8,
}

impl Fingerprint {
    /// The fingerprint of an empty slot.
    pub(crate) fn empty(len: usize) -> Self {
        debug_assert!((1..=MAX_FINGERPRINT_LEN).contains(&len));
        Self {
            bytes: [EMPTY_BYTE; MAX_FINGERPRINT_LEN],
            len: len as u8,
        }
    }

    /// Derive a `len`-byte fingerprint from a folded hash code.
    pub(crate) fn derive(code: i32, len: usize) -> Self {
        let mut fingerprint = Self::empty(len);
        fingerprint_bytes(code, &mut fingerprint.bytes[..len]);
        fingerprint
    }

    /// Returns `true` for the empty-slot marker.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().iter().all(|&b| b == EMPTY_BYTE)
    }

    /// The fingerprint bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }
}

// Hash only the live bytes so the alternate index depends on nothing else.
impl Hash for Fingerprint {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint(")?;
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}
