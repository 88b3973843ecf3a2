//! Catalog records as served by the external API.
//!
//! Upstream IDs arrive as `_id`; `id` is accepted too. Prices are kept loose
//! because the catalog has served them as both numbers and strings.

use casemandu_core::{BrandId, CaseTypeId, LoosePrice, Price, ProductId};
use serde::{Deserialize, Serialize};

/// Name given to case types synthesized when the catalog cannot describe them.
pub const PLACEHOLDER_CASE_TYPE_NAME: &str = "Case Type";

/// A device brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    #[serde(rename = "_id", alias = "id")]
    pub id: BrandId,
    #[serde(default)]
    pub name: String,
}

/// A device model that case types can be ordered for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneModel {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<LoosePrice>,
    #[serde(default, alias = "isActive")]
    pub is_activate: bool,
    #[serde(default)]
    pub case_types: Vec<CaseTypeRef>,
}

impl PhoneModel {
    /// The model's base price, or zero if absent or invalid.
    #[must_use]
    pub fn base_price(&self) -> Price {
        self.price
            .as_ref()
            .and_then(|p| p.resolve().ok())
            .unwrap_or(Price::ZERO)
    }

    /// IDs of every referenced case type, whether embedded or bare.
    #[must_use]
    pub fn case_type_ids(&self) -> Vec<CaseTypeId> {
        self.case_types
            .iter()
            .filter_map(|r| r.id().cloned())
            .collect()
    }
}

/// A purchasable case variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseType {
    #[serde(rename = "_id", alias = "id")]
    pub id: CaseTypeId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<LoosePrice>,
}

impl CaseType {
    /// Stand-in for a case type the catalog could not describe.
    #[must_use]
    pub fn placeholder(id: CaseTypeId, price: Price) -> Self {
        Self {
            id,
            name: PLACEHOLDER_CASE_TYPE_NAME.to_string(),
            price: Some(price.into()),
        }
    }
}

/// A model's reference to a case type: either the full record or its ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaseTypeRef {
    Record(CaseType),
    Id(CaseTypeId),
    /// Unrecognized shape; ignored.
    Other(serde_json::Value),
}

impl CaseTypeRef {
    #[must_use]
    pub const fn id(&self) -> Option<&CaseTypeId> {
        match self {
            Self::Record(record) => Some(&record.id),
            Self::Id(id) => Some(id),
            Self::Other(_) => None,
        }
    }

    #[must_use]
    pub const fn as_record(&self) -> Option<&CaseType> {
        match self {
            Self::Record(record) => Some(record),
            Self::Id(_) | Self::Other(_) => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_model_with_embedded_and_bare_refs() {
        let model: PhoneModel = serde_json::from_str(
            r#"{
                "_id": "m1",
                "name": "iPhone 15",
                "price": "1150",
                "isActivate": true,
                "caseTypes": [{"_id": "ct1", "name": "Tough", "price": 1300}, "ct2", 7]
            }"#,
        )
        .unwrap();

        assert!(model.is_activate);
        assert_eq!(model.base_price(), Price::from_units(1150));
        assert_eq!(
            model.case_type_ids(),
            vec![CaseTypeId::new("ct1"), CaseTypeId::new("ct2")]
        );
        assert!(model.case_types.first().unwrap().as_record().is_some());
    }

    #[test]
    fn test_is_active_alias_and_defaults() {
        let model: PhoneModel =
            serde_json::from_str(r#"{"id": "m2", "isActive": true}"#).unwrap();
        assert!(model.is_activate);
        assert!(model.case_types.is_empty());
        assert_eq!(model.base_price(), Price::ZERO);
    }

    #[test]
    fn test_placeholder_case_type() {
        let placeholder = CaseType::placeholder(CaseTypeId::new("ct9"), Price::from_units(550));
        assert_eq!(placeholder.name, "Case Type");
        assert_eq!(
            placeholder.price.unwrap().resolve(),
            Ok(Price::from_units(550))
        );
    }
}
