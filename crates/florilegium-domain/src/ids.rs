//! UUIDv7-backed identifiers
//!
//! Identifiers are opaque keys. Document order comes from the store's
//! insertion order, never from comparing ids.

use std::fmt;

macro_rules! uuid_v7_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new time-ordered identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Rebuild an identifier from its raw value (storage layer)
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Parse an identifier from its hyphenated UUID form
            pub fn from_string(s: &str) -> Result<Self, String> {
                uuid::Uuid::parse_str(s)
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| format!("Invalid {} string: {}", stringify!($name), e))
            }

            /// Raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }

            /// Big-endian byte form used as the SQL key
            pub fn to_bytes(&self) -> [u8; 16] {
                self.0.to_be_bytes()
            }

            /// Inverse of [`Self::to_bytes`]
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
                let arr: [u8; 16] = bytes.try_into().map_err(|_| {
                    format!(
                        "Expected 16 bytes for {}, got {}",
                        stringify!($name),
                        bytes.len()
                    )
                })?;
                Ok(Self(u128::from_be_bytes(arr)))
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
    };
}

uuid_v7_id!(
    /// Surrogate key of a stored candidate quote
    CandidateId
);

uuid_v7_id!(
    /// Surrogate key of a candidate group
    GroupId
);

uuid_v7_id!(
    /// Identifies one curation run; group labels are unique within a run
    RunId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_time_ordered() {
        let first = CandidateId::new();
        let second = CandidateId::new();
        assert!(first < second);
    }

    #[test]
    fn test_string_form_parses_back() {
        let id = GroupId::new();
        let parsed = GroupId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        let err = RunId::from_bytes(&[1, 2, 3]).unwrap_err();
        assert!(err.contains("Expected 16 bytes"));
    }

    #[test]
    fn test_bytes_preserve_ordering() {
        let a = CandidateId::from_value(1);
        let b = CandidateId::from_value(1 << 100);
        assert!(a.to_bytes() < b.to_bytes());
        assert_eq!(CandidateId::from_bytes(&b.to_bytes()).unwrap(), b);
    }
}
