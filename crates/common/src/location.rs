use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const LOCATION_DOMAIN: &str = "sharelock 2024-06-01 storage location";

/// A 128-bit key into the untrusted datastore.
///
/// Either derived from a context string (so its owner can find it again
/// without client-side state) or drawn at random (so nobody can guess it).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location(Uuid);

impl Location {
    /// Deterministically derive a location from a context string.
    pub fn from_context(context: &[u8]) -> Self {
        let hash = blake3::derive_key(LOCATION_DOMAIN, context);
        let mut bytes = [0; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    /// Derive a location from several fields, each length-prefixed so that
    /// `("ab", "c")` and `("a", "bc")` never collide.
    pub fn from_parts(parts: &[&[u8]]) -> Self {
        let mut context = Vec::new();
        for part in parts {
            context.extend_from_slice(&(part.len() as u64).to_le_bytes());
            context.extend_from_slice(part);
        }
        Self::from_context(&context)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for Location {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
