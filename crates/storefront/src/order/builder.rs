//! Turns cart entries and their bound artwork into an order submission.

use casemandu_core::{LineItem, LoosePrice, LooseText, Placement, Price, ProductId};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::{debug, warn};

use super::{DELIVERY_CHARGE, OrderError};
use crate::assets::{AssetStore, Upload};
use crate::designs::CUSTOM_DESIGN_VARIANT;

/// Customer contact and shipping details. Blank fields are left out of the
/// submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: String,
    pub city: String,
    pub additional_info: String,
}

impl CustomerDetails {
    /// Multipart field names paired with their values, in wire order.
    fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("name", self.name.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
            ("shippingAddress", self.shipping_address.as_str()),
            ("city", self.city.as_str()),
            ("additionalInfo", self.additional_info.as_str()),
        ]
    }
}

/// Everything about an order that does not come from the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub customer: CustomerDetails,
    /// Label of the payment channel the proof was made with.
    pub payment_method: String,
    pub promo_code: Option<String>,
    /// Grand total as shown to the customer; sent verbatim.
    pub total: Price,
}

/// One entry of the `orderItems` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRecord {
    pub name: String,
    pub qty: u32,
    pub price: Price,
    pub variant: String,
    pub is_custom: bool,
    pub custom_case_coordinates: Placement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
}

/// The `priceSummary` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    /// Serialized as `null` when absent.
    pub promo_code: Option<String>,
    pub total: Price,
    pub delivery_charge: Price,
}

/// A validated order, ready to be sent.
#[derive(Debug, Clone)]
pub struct OrderSubmission {
    customer_fields: Vec<(&'static str, String)>,
    payment_method: String,
    items: Vec<OrderItemRecord>,
    order_items_json: String,
    price_summary_json: String,
    payment_image: Upload,
    custom_images: Vec<Upload>,
}

impl OrderSubmission {
    /// The normalized entries, in cart order.
    #[must_use]
    pub fn items(&self) -> &[OrderItemRecord] {
        &self.items
    }

    /// The `orderItems` field as sent.
    #[must_use]
    pub fn order_items_json(&self) -> &str {
        &self.order_items_json
    }

    /// The `priceSummary` field as sent.
    #[must_use]
    pub fn price_summary_json(&self) -> &str {
        &self.price_summary_json
    }

    /// Non-blank customer fields as `(field name, value)`.
    #[must_use]
    pub fn customer_fields(&self) -> &[(&'static str, String)] {
        &self.customer_fields
    }

    /// Artwork files in the same relative order as [`Self::items`] with
    /// `is_custom` set.
    #[must_use]
    pub fn custom_images(&self) -> &[Upload] {
        &self.custom_images
    }

    #[must_use]
    pub const fn payment_image(&self) -> &Upload {
        &self.payment_image
    }

    /// Assemble the multipart body. The boundary header is left to the HTTP
    /// client.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::SerializationFailure`] if an upload carries a
    /// malformed content type.
    pub fn into_form(self) -> Result<Form, OrderError> {
        let mut form = Form::new();
        for (field, value) in self.customer_fields {
            form = form.text(field, value);
        }
        if !self.payment_method.trim().is_empty() {
            form = form.text("paymentMethod", self.payment_method);
        }

        form = form
            .text("orderItems", self.order_items_json)
            .text("priceSummary", self.price_summary_json)
            .part("paymentImage", file_part(&self.payment_image)?);

        for image in &self.custom_images {
            form = form.part("customImage", file_part(image)?);
        }

        Ok(form)
    }
}

fn file_part(upload: &Upload) -> Result<Part, OrderError> {
    let part = Part::bytes(upload.bytes().to_vec()).file_name(upload.file_name().to_string());
    match upload.content_type() {
        Some(content_type) => part
            .mime_str(content_type)
            .map_err(|e| OrderError::SerializationFailure(e.to_string())),
        None => Ok(part),
    }
}

/// Validate `items` and assemble the order submission.
///
/// Entries without a usable name or with a price that is not a finite
/// non-negative number are dropped. Artwork bound to a kept entry is sent as
/// a `customImage` file, in entry order.
///
/// # Errors
///
/// - [`OrderError::EmptyCart`] if `items` is empty.
/// - [`OrderError::NoValidItems`] if every entry was dropped.
/// - [`OrderError::SerializationFailure`] if the payload does not encode to a
///   non-empty JSON array.
pub fn build_order(
    items: &[LineItem],
    assets: &AssetStore,
    request: &OrderRequest,
    payment_proof: Upload,
) -> Result<OrderSubmission, OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let mut records = Vec::with_capacity(items.len());
    let mut custom_images = Vec::new();

    for item in items {
        let Some(record) = normalize(item, assets) else {
            continue;
        };
        if let Some(image) = assets.custom_image(&item.id) {
            custom_images.push(image.clone());
        }
        records.push(record);
    }

    if records.is_empty() {
        warn!(entries = items.len(), "No valid order items in cart");
        return Err(OrderError::NoValidItems);
    }

    let order_items_json = encode_order_items(&records)?;

    let summary = PriceSummary {
        promo_code: request
            .promo_code
            .clone()
            .filter(|code| !code.trim().is_empty()),
        total: request.total,
        delivery_charge: DELIVERY_CHARGE,
    };
    let price_summary_json = serde_json::to_string(&summary)
        .map_err(|e| OrderError::SerializationFailure(e.to_string()))?;

    let customer_fields = request
        .customer
        .fields()
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(field, value)| (field, value.to_string()))
        .collect();

    debug!(
        items = records.len(),
        dropped = items.len() - records.len(),
        custom_images = custom_images.len(),
        "Order built"
    );

    Ok(OrderSubmission {
        customer_fields,
        payment_method: request.payment_method.clone(),
        items: records,
        order_items_json,
        price_summary_json,
        payment_image: payment_proof,
        custom_images,
    })
}

/// Build the wire record for `item`, or `None` if it is not orderable.
fn normalize(item: &LineItem, assets: &AssetStore) -> Option<OrderItemRecord> {
    let Some(name) = item.display_name() else {
        warn!(item_id = %item.id, "Dropping order item without a name");
        return None;
    };

    let price = match item.price.as_ref().map(LoosePrice::resolve) {
        Some(Ok(price)) => price,
        Some(Err(e)) => {
            warn!(item_id = %item.id, error = %e, "Dropping order item with invalid price");
            return None;
        }
        None => {
            warn!(item_id = %item.id, "Dropping order item without a price");
            return None;
        }
    };
    if item.line_total().is_none() {
        warn!(item_id = %item.id, qty = item.qty, "Dropping order item whose total overflows");
        return None;
    }

    let variant = item
        .variant
        .as_ref()
        .and_then(LooseText::resolve)
        .unwrap_or(CUSTOM_DESIGN_VARIANT);

    Some(OrderItemRecord {
        name: name.to_string(),
        qty: item.qty.max(1),
        price,
        variant: variant.to_string(),
        is_custom: assets.custom_image(&item.id).is_some(),
        custom_case_coordinates: assets.placement_or_default(&item.id),
        product: item
            .product_id
            .clone()
            .filter(|id| !id.as_str().trim().is_empty()),
        brand_name: non_blank(item.brand_name.as_deref()),
        model_name: non_blank(item.model_name.as_deref()),
        case_type: non_blank(item.case_type.as_deref()),
        product_type: non_blank(Some(item.product_type.as_str())),
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(ToString::to_string)
}

/// Encode `records` and check the result decodes back to an array of the
/// same length.
fn encode_order_items(records: &[OrderItemRecord]) -> Result<String, OrderError> {
    let json = serde_json::to_string(records)
        .map_err(|e| OrderError::SerializationFailure(e.to_string()))?;

    let decoded: Vec<serde_json::Value> = serde_json::from_str(&json)
        .map_err(|e| OrderError::SerializationFailure(e.to_string()))?;

    if decoded.is_empty() || decoded.len() != records.len() {
        return Err(OrderError::SerializationFailure(format!(
            "orderItems decoded to {} entries, expected {}",
            decoded.len(),
            records.len()
        )));
    }

    Ok(json)
}
