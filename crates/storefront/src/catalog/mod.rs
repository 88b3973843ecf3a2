//! Catalog resolver: brand -> models -> case-type variants.
//!
//! # Failure policy
//!
//! Every read here feeds selection UI only, so failures never propagate:
//! transport errors, bad statuses and unexpected shapes are logged and turn
//! into empty lists (or placeholder case types). The caller degrades the UI
//! instead of crashing.
//!
//! # Response shapes
//!
//! The upstream API is inconsistent: lists arrive either bare (`[..]`) or
//! wrapped in an object (`{"models": [..]}`, `{"data": [..]}`). Individual
//! malformed records are skipped rather than failing the whole list.

pub(crate) mod cache;
pub mod selection;
pub mod types;

use casemandu_core::{BrandId, CaseTypeId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::client::ApiClient;
use cache::{CacheKey, CacheValue};

pub use selection::{CaseTypesTicket, CatalogSelection, ModelsTicket};
pub use types::{Brand, CaseType, CaseTypeRef, PLACEHOLDER_CASE_TYPE_NAME, PhoneModel};

/// Brand listing endpoint.
pub const BRANDS_PATH: &str = "/api/phones/brands";

/// Candidate case-type endpoints, probed in order. The first one that yields
/// records matching the model's references wins.
pub const CASE_TYPE_ENDPOINTS: [&str; 4] = [
    "/api/casetypes",
    "/api/case-types",
    "/api/phones/casetypes",
    "/api/phones/case-types",
];

/// Errors from a single catalog read. Logged, never returned to callers of
/// the public resolver methods.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("{path} returned status {status}")]
    Status { path: String, status: u16 },

    /// Body was not JSON or not a recognizable list.
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// The request URL could not be built.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiClient {
    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// List all phone brands. Empty on any failure.
    #[instrument(skip(self))]
    pub async fn list_brands(&self) -> Vec<Brand> {
        if let Some(CacheValue::Brands(brands)) = self.cache().get(&CacheKey::Brands).await {
            debug!("Cache hit for brands");
            return brands;
        }

        match self.fetch_list::<Brand>(BRANDS_PATH, &[], &["brands", "data"]).await {
            Ok(brands) => {
                self.cache()
                    .insert(CacheKey::Brands, CacheValue::Brands(brands.clone()))
                    .await;
                brands
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch brands");
                Vec::new()
            }
        }
    }

    /// List the active models of `brand_id`. Empty on any failure.
    #[instrument(skip(self), fields(brand_id = %brand_id))]
    pub async fn list_models_for_brand(&self, brand_id: &BrandId) -> Vec<PhoneModel> {
        let key = CacheKey::Models(brand_id.clone());
        if let Some(CacheValue::Models(models)) = self.cache().get(&key).await {
            debug!("Cache hit for models");
            return models;
        }

        match self
            .fetch_list::<PhoneModel>(BRANDS_PATH, &[brand_id.as_str()], &["models"])
            .await
        {
            Ok(models) => {
                let active: Vec<PhoneModel> =
                    models.into_iter().filter(|m| m.is_activate).collect();
                self.cache()
                    .insert(key, CacheValue::Models(active.clone()))
                    .await;
                active
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch models");
                Vec::new()
            }
        }
    }

    /// Resolve the case-type variants available for `model`.
    ///
    /// Embedded records are used as-is. Bare IDs are looked up by probing
    /// [`CASE_TYPE_ENDPOINTS`]; if no endpoint knows them, one placeholder per
    /// referenced ID is returned so the selector is never empty while
    /// references exist.
    #[instrument(skip(self, model), fields(model_id = %model.id))]
    pub async fn resolve_case_types(&self, model: &PhoneModel) -> Vec<CaseType> {
        let Some(first) = model.case_types.first() else {
            return Vec::new();
        };

        if first.as_record().is_some() {
            return model
                .case_types
                .iter()
                .filter_map(CaseTypeRef::as_record)
                .cloned()
                .collect();
        }

        let wanted = model.case_type_ids();
        for path in CASE_TYPE_ENDPOINTS {
            let matched: Vec<CaseType> = self
                .case_type_listing(path)
                .await
                .into_iter()
                .filter(|ct| wanted.contains(&ct.id))
                .collect();

            if !matched.is_empty() {
                debug!(path, count = matched.len(), "Resolved case types");
                return matched;
            }
        }

        warn!(
            refs = wanted.len(),
            "No case-type endpoint matched, using placeholders"
        );
        let price = model.base_price();
        wanted
            .into_iter()
            .map(|id: CaseTypeId| CaseType::placeholder(id, price))
            .collect()
    }

    /// Full case-type listing from one endpoint. Empty on failure.
    async fn case_type_listing(&self, path: &'static str) -> Vec<CaseType> {
        let key = CacheKey::CaseTypes(path);
        if let Some(CacheValue::CaseTypes(listing)) = self.cache().get(&key).await {
            return listing;
        }

        match self
            .fetch_list::<CaseType>(path, &[], &["caseTypes", "data"])
            .await
        {
            Ok(listing) => {
                self.cache()
                    .insert(key, CacheValue::CaseTypes(listing.clone()))
                    .await;
                listing
            }
            Err(e) => {
                debug!(path, error = %e, "Case-type probe failed");
                Vec::new()
            }
        }
    }

    /// GET `path` plus `segments` and extract a list of `T` from it.
    pub(crate) async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
        segments: &[&str],
        wrapper_fields: &[&str],
    ) -> Result<Vec<T>, CatalogError> {
        let body = self.get_json(path, segments).await?;
        extract_records(body, wrapper_fields)
            .ok_or_else(|| CatalogError::Shape(format!("{path}: no list in response")))
    }
}

/// Pull a list of records out of a bare array or an object wrapping one under
/// any of `wrapper_fields`. Records that fail to decode are skipped.
fn extract_records<T: DeserializeOwned>(body: Value, wrapper_fields: &[&str]) -> Option<Vec<T>> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(mut object) => wrapper_fields.iter().find_map(|field| {
            match object.remove(*field) {
                Some(Value::Array(entries)) => Some(entries),
                _ => None,
            }
        })?,
        _ => return None,
    };

    Some(
        entries
            .into_iter()
            .filter_map(|entry| {
                serde_json::from_value(entry)
                    .map_err(|e| debug!(error = %e, "Skipping malformed catalog record"))
                    .ok()
            })
            .collect(),
    )
}
