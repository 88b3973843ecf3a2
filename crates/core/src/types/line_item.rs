//! Normalized cart entry.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::id::{ItemId, ProductId};
use super::loose::{LoosePrice, LooseText};
use super::price::Price;

/// One configured product in the cart.
///
/// A line item is a snapshot of the selection at add-to-cart time. It is
/// never edited in place; a change replaces the entry. `id` is the join key
/// into the asset store, where uploaded artwork and placement live.
///
/// `name`, `variant` and `price` are kept in their loose stored shape and only
/// resolved when an order is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: ItemId,
    #[serde(default)]
    pub name: Option<LooseText>,
    #[serde(default = "default_qty", deserialize_with = "loose_qty")]
    pub qty: u32,
    /// Display-only preview URL. Not authoritative and may be stale after a
    /// reload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub variant: Option<LooseText>,
    #[serde(default)]
    pub price: Option<LoosePrice>,
    #[serde(default, alias = "product", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub product_type: String,
}

const fn default_qty() -> u32 {
    1
}

/// Quantity as a number or numeric string. Anything else, or anything below
/// one, counts as a single unit.
fn loose_qty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number
        .and_then(Decimal::from_f64)
        .and_then(|n| n.trunc().to_u32())
        .filter(|&qty| qty >= 1)
        .unwrap_or_else(default_qty))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl LineItem {
    /// Create a single-quantity line item with a freshly generated ID.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        variant: impl Into<String>,
        price: Price,
        product_type: impl Into<String>,
    ) -> Self {
        Self {
            id: ItemId::generate(),
            name: Some(LooseText::Plain(name.into())),
            qty: 1,
            image: None,
            variant: Some(LooseText::Plain(variant.into())),
            price: Some(price.into()),
            product_id: None,
            brand_name: None,
            model_name: None,
            case_type: None,
            product_type: product_type.into(),
        }
    }

    /// Attach a preview image URL.
    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    /// Attach the phone-case identity fields.
    #[must_use]
    pub fn with_device(
        mut self,
        product_id: ProductId,
        brand_name: impl Into<String>,
        model_name: impl Into<String>,
        case_type: impl Into<String>,
    ) -> Self {
        self.product_id = Some(product_id);
        self.brand_name = Some(brand_name.into());
        self.model_name = Some(model_name.into());
        self.case_type = Some(case_type.into());
        self
    }

    /// Replace the quantity, producing a new entry with the same ID.
    #[must_use]
    pub fn with_qty(mut self, qty: u32) -> Self {
        self.qty = qty.max(1);
        self
    }

    /// The resolved name, if it is present and non-blank.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_ref().and_then(LooseText::resolve)
    }

    /// The resolved unit price, if it is valid.
    #[must_use]
    pub fn unit_price(&self) -> Option<Price> {
        self.price.as_ref().and_then(|price| price.resolve().ok())
    }

    /// The resolved line total (`unit price * qty`), if the price is valid
    /// and the product does not overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.unit_price()?.times(self.qty.max(1))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case_without_absent_fields() {
        let item = LineItem::new("airpods", "Custom Design", Price::from_units(999), "airpods");
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["name"], "airpods");
        assert_eq!(json["price"], 999.0);
        assert_eq!(json["productType"], "airpods");
        assert!(json.get("brandName").is_none());
        assert!(json.get("image").is_none());
    }

    #[test]
    fn test_loads_legacy_record_with_nulls_and_product_alias() {
        let json = r#"{
            "id": "1700000000000-abcdefghi",
            "name": {"name": "iPhone 15"},
            "qty": 2,
            "image": "blob:preview",
            "variant": "Tough Case",
            "price": "1150",
            "product": "model-1",
            "brandName": "Apple",
            "modelName": null,
            "caseType": null,
            "productType": "phonecase"
        }"#;
        let item: LineItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.display_name(), Some("iPhone 15"));
        assert_eq!(item.product_id, Some(ProductId::new("model-1")));
        assert_eq!(item.model_name, None);
        assert_eq!(item.line_total(), Some(Price::from_units(2300)));
    }

    #[test]
    fn test_missing_qty_defaults_to_one() {
        let item: LineItem = serde_json::from_str(r#"{"id": "a", "name": "x"}"#).unwrap();
        assert_eq!(item.qty, 1);
        assert_eq!(item.unit_price(), None);
    }

    #[test]
    fn test_overflowing_line_total_is_invalid() {
        let item: LineItem =
            serde_json::from_str(r#"{"id": "a", "name": "x", "qty": 2, "price": "5e28"}"#).unwrap();
        assert!(item.unit_price().is_some());
        assert_eq!(item.line_total(), None);
    }

    #[test]
    fn test_loose_qty_and_null_product_type() {
        let item: LineItem = serde_json::from_str(
            r#"{"id": "a", "name": "x", "qty": "2", "productType": null}"#,
        )
        .unwrap();
        assert_eq!(item.qty, 2);
        assert_eq!(item.product_type, "");

        for qty in [r#""two""#, "0", "-3", "null", "[]"] {
            let json = format!(r#"{{"id": "a", "qty": {qty}}}"#);
            let item: LineItem = serde_json::from_str(&json).unwrap();
            assert_eq!(item.qty, 1, "qty {qty}");
        }
    }

    #[test]
    fn test_with_qty_keeps_id() {
        let item = LineItem::new("popsockets", "Custom Design", Price::from_units(150), "popsockets");
        let bumped = item.clone().with_qty(0);
        assert_eq!(bumped.id, item.id);
        assert_eq!(bumped.qty, 1);
    }
}
