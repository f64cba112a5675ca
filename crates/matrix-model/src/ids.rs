//! Opaque identifiers for projects, tabs and competitor records
//!
//! Ids coming back from the document store are arbitrary strings, so every id
//! here is a transparent string newtype. Fresh record ids are ULIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow as string slice
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume into the inner string
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Competitor record identifier
    ///
    /// Assigned once at creation. Only reconciliation may swap it for the id
    /// of an existing record with the same name.
    RecordId
}

string_id! {
    /// Tab identifier
    TabId
}

string_id! {
    /// Project identifier (the unit of single-writer locking)
    ProjectId
}

impl RecordId {
    /// Generate a fresh, sortable record id
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }
}

impl TabId {
    /// Generate a fresh tab id
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("tab_{}", Ulid::new().to_string().to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_record_ids_are_unique() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 26);
    }

    #[test]
    fn generated_tab_ids_are_prefixed() {
        let id = TabId::generate();
        assert!(id.as_str().starts_with("tab_"));
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = RecordId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");

        let back: TabId = serde_json::from_str("\"tab_general\"").unwrap();
        assert_eq!(back.as_str(), "tab_general");
    }
}
