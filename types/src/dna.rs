//! Content DNA identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A content-derived identifier for articles and groups.
///
/// DNAs are uppercase base36 strings of a keccak digest, but the ledger treats
/// them as opaque natural keys: whatever string the chain event carries is
/// the key.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dna(String);

impl Dna {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build a DNA from raw event bytes (interpreted as UTF-8, lossily).
    pub fn from_event_bytes(bytes: &[u8]) -> Self {
        Self(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Dna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Dna {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Dna {
    fn from(s: String) -> Self {
        Self(s)
    }
}
