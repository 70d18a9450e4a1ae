//! Content fingerprint type.
//!
//! [`ContentHash`] is a 32-byte digest of a template's bytes. It is displayed
//! and serialized as lowercase hex so catalog manifests stay readable and
//! diff-friendly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A fixed-size digest of a file's full byte content.
///
/// # Examples
///
/// ```
/// use tmpl_core::ContentHash;
///
/// let hash = ContentHash::new([0xab; 32]);
/// assert!(hash.to_string().starts_with("abab"));
///
/// let parsed: ContentHash = hash.to_string().parse().unwrap();
/// assert_eq!(parsed, hash);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContentHash([u8; ContentHash::LEN]);

impl ContentHash {
    /// Digest length in bytes.
    pub const LEN: usize = 32;

    /// Wraps raw digest bytes.
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Lowercase hex representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; ContentHash::LEN]> for ContentHash {
    #[inline]
    fn from(bytes: [u8; ContentHash::LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for ContentHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        encoded.parse().map_err(serde::de::Error::custom)
    }
}
