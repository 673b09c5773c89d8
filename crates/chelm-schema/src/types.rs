//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings so chart metadata files
//! stay readable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// A configuration layer: string keys to arbitrary nested values.
pub type Values = serde_json::Map<String, serde_json::Value>;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Names one logical image within a chart, e.g. a component name.
    ImageId
);

string_newtype!(
    /// Name of a test case declared in chart metadata.
    CaseName
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_id_display_and_deref() {
        let id = ImageId::new("API");
        assert_eq!(id.to_string(), "API");
        assert_eq!(id.as_str(), "API");
        assert_eq!(id.to_lowercase(), "api");
    }

    #[test]
    fn image_id_serde_is_transparent() {
        let id = ImageId::new("worker");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"worker\"");
        let back: ImageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn case_name_compares_with_str() {
        let name = CaseName::from("default");
        assert_eq!(name, "default");
        assert!(name != "Default");
    }

    #[test]
    fn image_ids_order_by_name() {
        let mut ids = vec![ImageId::from("worker"), ImageId::from("api")];
        ids.sort();
        assert_eq!(ids, vec![ImageId::new("api"), ImageId::new("worker")]);
    }
}
