//! Digest identifiers for chain objects.
//!
//! Every block and event is named by the SHA-256 digest of its canonical
//! encoding (see [`crate::identity`]). The wrappers below keep block ids,
//! event ids and body checksums from being mixed up at compile time.
//! On the wire they travel as lowercase hex strings.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length in bytes of every digest identifier.
pub const DIGEST_LEN: usize = 32;

/// Generates a newtype wrapper around a 32-byte digest.
macro_rules! define_digest {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; DIGEST_LEN]);

        impl $name {
            /// The all-zero digest.
            pub const ZERO: Self = Self([0; DIGEST_LEN]);

            /// Wrap raw digest bytes.
            pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
                Self(bytes)
            }

            /// Wrap a slice, returning `None` unless it is exactly
            /// [`DIGEST_LEN`] bytes long.
            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                <[u8; DIGEST_LEN]>::try_from(bytes).ok().map(Self)
            }

            /// Borrow the raw digest bytes.
            pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
                &self.0
            }

            /// Whether every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let encoded = String::deserialize(deserializer)?;
                let bytes = hex::decode(&encoded).map_err(serde::de::Error::custom)?;
                Self::from_slice(&bytes)
                    .ok_or_else(|| serde::de::Error::invalid_length(bytes.len(), &"32 bytes"))
            }
        }
    };
}

define_digest! {
    /// Identity of a block: digest of the full block including its checksum.
    BlockId
}

define_digest! {
    /// Identity of an event: digest of the full event, body, timestamp and signature.
    EventId
}

define_digest! {
    /// Digest of a block body, stored alongside the body it covers.
    Checksum
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_is_lowercase_hex() {
        let mut bytes = [0u8; DIGEST_LEN];
        bytes[0] = 0xAB;
        let id = BlockId::from_bytes(bytes);
        let shown = id.to_string();
        assert_eq!(shown.len(), DIGEST_LEN * 2);
        assert!(shown.starts_with("ab00"));
    }

    #[test]
    fn serde_uses_hex_string() {
        let id = EventId::from_bytes([7; DIGEST_LEN]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "07".repeat(DIGEST_LEN)));
        let back: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn deserialize_rejects_wrong_length() {
        let result: Result<Checksum, _> = serde_json::from_str("\"abcd\"");
        assert!(result.is_err());
    }

    #[test]
    fn zero_digest() {
        assert!(BlockId::ZERO.is_zero());
        assert!(!BlockId::from_bytes([1; DIGEST_LEN]).is_zero());
        assert!(BlockId::from_slice(&[0; 31]).is_none());
    }
}
