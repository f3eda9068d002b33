//! Identifier newtypes for every level of the condition hierarchy
//!
//! All identifiers wrap a [`Uuid`]. The default value is the nil UUID, which
//! is what a missing identifier deserializes to; callers reject it where an
//! identifier is required.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// The nil identifier
            #[inline]
            #[must_use]
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Whether this is the nil identifier
            #[inline]
            #[must_use]
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Project identifier; the store is keyed by it
    ProjectId
);

define_id!(
    /// Condition identifier, unique within a project
    ConditionId
);

define_id!(
    /// Document identifier, unique within a condition
    DocumentId
);

define_id!(
    /// Page identifier, unique within a document
    PageId
);

define_id!(
    /// Zone identifier, unique within a page
    ZoneId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_nil() {
        assert!(ProjectId::default().is_nil());
        assert!(!ProjectId::new().is_nil());
    }

    #[test]
    fn parse_and_display_agree() {
        let id = ZoneId::new();
        let parsed: ZoneId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_garbage() {
        assert!("not-a-uuid".parse::<PageId>().is_err());
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let id = DocumentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }
}
