//! Identifiers for rumors and their variants
//!
//! Both identifiers wrap a UUIDv7, so ids generated later sort after ids
//! generated earlier. Stores persist them as 16 big-endian bytes.

use std::fmt;

macro_rules! uuid_v7_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new UUIDv7-based identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create an identifier from a raw u128 value
            ///
            /// This is primarily for storage layer deserialization.
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Parse an identifier from its hyphenated UUID form
            pub fn from_string(s: &str) -> Result<Self, String> {
                uuid::Uuid::parse_str(s)
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| format!("Invalid {} string: {}", $label, e))
            }

            /// Get the raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }

            /// Big-endian byte form used by storage
            pub fn to_bytes(&self) -> [u8; 16] {
                self.0.to_be_bytes()
            }

            /// Rebuild from the big-endian byte form
            pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
                let arr: [u8; 16] = bytes.try_into().ok()?;
                Some(Self(u128::from_be_bytes(arr)))
            }

            /// Millisecond timestamp embedded in the UUIDv7
            pub fn timestamp(&self) -> u64 {
                (self.0 >> 80) as u64
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }
    };
}

uuid_v7_id!(
    /// Unique identifier of a rumor aggregate
    ///
    /// # Examples
    ///
    /// ```
    /// use rumormill_domain::RumorId;
    ///
    /// let id = RumorId::new();
    /// let parsed: RumorId = id.to_string().parse().unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    RumorId,
    "rumor id"
);

uuid_v7_id!(
    /// Unique identifier of one wording of a rumor
    VariantId,
    "variant id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rumor_id_ordering() {
        let id1 = RumorId::from_value(1000);
        let id2 = RumorId::from_value(2000);
        assert!(id1 < id2);
    }

    #[test]
    fn test_rumor_id_chronological() {
        let id1 = RumorId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = RumorId::new();

        assert!(id1 < id2, "Earlier UUIDv7 should sort first");
        assert!(id1.timestamp() <= id2.timestamp());
    }

    #[test]
    fn test_display_and_parse() {
        let id = VariantId::new();
        let id_str = id.to_string();
        assert_eq!(id_str.len(), 36);
        assert_eq!(VariantId::from_string(&id_str).unwrap(), id);
    }

    #[test]
    fn test_invalid_string() {
        assert!(RumorId::from_string("not-a-valid-uuid").is_err());
        assert!(VariantId::from_string("").is_err());
    }

    #[test]
    fn test_bytes_round_trip() {
        let id = RumorId::new();
        assert_eq!(RumorId::from_bytes(&id.to_bytes()), Some(id));
        assert_eq!(RumorId::from_bytes(&[1, 2, 3]), None);
    }
}
