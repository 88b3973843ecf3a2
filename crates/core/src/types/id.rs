//! Newtype IDs for type-safe entity references.
//!
//! Catalog and order identifiers are opaque strings issued by the external
//! API. Use the `define_id!` macro to create wrappers that prevent
//! accidentally mixing IDs from different entity types.

use chrono::Utc;
use rand::Rng;

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use casemandu_core::define_id;
/// define_id!(BrandId);
/// define_id!(OrderId);
///
/// let brand_id = BrandId::new("64f1c2");
/// let order_id = OrderId::new("64f1c2");
///
/// // These are different types, so this won't compile:
/// // let _: BrandId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ItemId);
define_id!(BrandId);
define_id!(ProductId);
define_id!(CaseTypeId);
define_id!(OrderId);

/// Length of the random suffix appended to generated item IDs.
const ITEM_ID_SUFFIX_LEN: usize = 9;

impl ItemId {
    /// Generate a fresh cart-entry ID.
    ///
    /// Format: `{unix_millis}-{suffix}` where `suffix` is nine lowercase
    /// base-36 characters. Unique within a session for all practical purposes.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..ITEM_ID_SUFFIX_LEN)
            .filter_map(|_| char::from_digit(rng.random_range(0..36), 36))
            .collect();

        Self(format!("{}-{suffix}", Utc::now().timestamp_millis()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generated_item_id_format() {
        let id = ItemId::generate();
        let (millis, suffix) = id.as_str().split_once('-').unwrap();

        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), ITEM_ID_SUFFIX_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_generated_item_ids_are_distinct() {
        let ids: HashSet<ItemId> = (0..500).map(|_| ItemId::generate()).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = BrandId::new("apple");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"apple\"");

        let back: BrandId = serde_json::from_str("\"apple\"").unwrap();
        assert_eq!(back, id);
    }
}
