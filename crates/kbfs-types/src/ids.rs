//! Typed identifiers.
//!
//! `EditId` and `ErrorId` wrap UUIDv7s minted locally for each pending edit
//! and each recorded error. `TransferId` is assigned by the backend when a
//! download starts and is opaque here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an in-place edit (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditId(uuid::Uuid);

/// Identifier of an entry in the model's error ledger (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorId(uuid::Uuid);

macro_rules! impl_typed_id {
    ($T:ident, $name:literal) => {
        impl $T {
            /// Create a new time-ordered ID.
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// First 8 hex characters, for logs and display only.
            pub fn short(&self) -> String {
                self.0.as_simple().to_string()[..8].to_string()
            }

            /// Parse from hyphenated or simple UUID text.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<uuid::Uuid> for $T {
            fn from(u: uuid::Uuid) -> Self {
                Self(u)
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($name, "({})"), self.short())
            }
        }
    };
}

impl_typed_id!(EditId, "EditId");
impl_typed_id!(ErrorId, "ErrorId");

/// Backend-assigned transfer identifier.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(String);

impl TransferId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransferId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransferId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_ids_are_unique() {
        let a = EditId::new();
        let b = EditId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_edit_id_parse_and_short() {
        let id = EditId::new();
        assert_eq!(EditId::parse(&id.to_string()).unwrap(), id);
        assert_eq!(id.short().len(), 8);
        assert!(format!("{id:?}").starts_with("EditId("));
        assert!(EditId::parse("nope").is_err());
    }

    #[test]
    fn test_error_id_debug_names_its_type() {
        let id = ErrorId::new();
        assert_eq!(format!("{id:?}"), format!("ErrorId({})", id.short()));
        assert_eq!(ErrorId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_transfer_id_is_transparent_on_the_wire() {
        let id = TransferId::from("dl-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"dl-7\"");
        assert_eq!(id.to_string(), "dl-7");
    }
}
