//! Tolerant shapes for cart fields that upstream data has stored in more than
//! one form.
//!
//! Older cart records and some catalog responses carry `name`, `variant` and
//! `price` either as primitives or wrapped in an object (`{"name": ..}`,
//! `{"price": ..}`). These enums accept every shape so a cart never fails to
//! load over one odd field; callers resolve them explicitly with
//! [`LooseText::resolve`] and [`LoosePrice::resolve`].

use serde::{Deserialize, Serialize};

use super::price::{Price, PriceError};

/// A text field that may be a string or an object with a `name` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseText {
    /// `"iPhone 15"`
    Plain(String),
    /// `{"name": "iPhone 15"}`
    Nested {
        #[serde(default)]
        name: Option<String>,
    },
    /// Anything else (numbers, arrays, ..).
    Other(serde_json::Value),
}

impl LooseText {
    /// The text, unwrapped from a nested object if needed.
    ///
    /// Returns `None` when the value is blank or not text at all.
    #[must_use]
    pub fn resolve(&self) -> Option<&str> {
        let text = match self {
            Self::Plain(text) => text.as_str(),
            Self::Nested { name: Some(name) } => name.as_str(),
            Self::Nested { name: None } | Self::Other(_) => return None,
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl From<String> for LooseText {
    fn from(text: String) -> Self {
        Self::Plain(text)
    }
}

impl From<&str> for LooseText {
    fn from(text: &str) -> Self {
        Self::Plain(text.to_owned())
    }
}

/// A price field that may be a number, numeric text, or an object with a
/// `price` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoosePrice {
    /// `999`
    Number(f64),
    /// `"999"`
    Text(String),
    /// `{"price": 999}`
    Nested {
        #[serde(default)]
        price: Option<Box<LoosePrice>>,
    },
    /// Anything else (booleans, arrays, ..).
    Other(serde_json::Value),
}

impl LoosePrice {
    /// Resolve to a validated [`Price`], unwrapping one level of nesting.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not numeric, not finite,
    /// negative, or nested more than one level deep.
    pub fn resolve(&self) -> Result<Price, PriceError> {
        match self {
            Self::Nested { price: Some(inner) } => inner.resolve_flat(),
            other => other.resolve_flat(),
        }
    }

    fn resolve_flat(&self) -> Result<Price, PriceError> {
        match self {
            Self::Number(value) => Price::from_f64(*value),
            Self::Text(text) => Price::parse(text),
            Self::Nested { price: None } => Err(PriceError::Missing),
            Self::Nested { .. } | Self::Other(_) => {
                Err(PriceError::NotANumber("non-scalar value".to_string()))
            }
        }
    }
}

impl From<Price> for LoosePrice {
    fn from(price: Price) -> Self {
        Self::Number(price.as_f64())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_shapes() {
        let plain: LooseText = serde_json::from_str("\"airpods\"").unwrap();
        let nested: LooseText = serde_json::from_str(r#"{"name":"airpods"}"#).unwrap();
        let blank: LooseText = serde_json::from_str("\"   \"").unwrap();
        let number: LooseText = serde_json::from_str("42").unwrap();

        assert_eq!(plain.resolve(), Some("airpods"));
        assert_eq!(nested.resolve(), Some("airpods"));
        assert_eq!(blank.resolve(), None);
        assert_eq!(number.resolve(), None);
    }

    #[test]
    fn test_nested_text_without_name() {
        let nested: LooseText = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(nested.resolve(), None);
    }

    #[test]
    fn test_price_shapes() {
        let number: LoosePrice = serde_json::from_str("999").unwrap();
        let text: LoosePrice = serde_json::from_str("\"999\"").unwrap();
        let nested: LoosePrice = serde_json::from_str(r#"{"price":"999"}"#).unwrap();

        for loose in [number, text, nested] {
            assert_eq!(loose.resolve(), Ok(Price::from_units(999)));
        }
    }

    #[test]
    fn test_price_rejections() {
        let garbage: LoosePrice = serde_json::from_str("\"abc\"").unwrap();
        let empty_object: LoosePrice = serde_json::from_str("{}").unwrap();
        let doubly_nested: LoosePrice =
            serde_json::from_str(r#"{"price":{"price":5}}"#).unwrap();
        let boolean: LoosePrice = serde_json::from_str("true").unwrap();

        assert!(garbage.resolve().is_err());
        assert_eq!(empty_object.resolve(), Err(PriceError::Missing));
        assert!(doubly_nested.resolve().is_err());
        assert!(boolean.resolve().is_err());
    }
}
