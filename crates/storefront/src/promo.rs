//! Promo code lookup.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::client::ApiClient;

/// Promo code listing endpoint.
pub const PROMO_CODES_PATH: &str = "/api/promocodes";

/// A promo code record. Only `code` is interpreted; everything else the
/// backend sends is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoCode {
    pub code: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ApiClient {
    /// Look up `code` among the backend's promo codes (exact match).
    ///
    /// Returns `None` when the code is unknown or the lookup fails.
    #[instrument(skip(self))]
    pub async fn verify_promo(&self, code: &str) -> Option<PromoCode> {
        if code.trim().is_empty() {
            return None;
        }

        let promos = match self
            .fetch_list::<PromoCode>(PROMO_CODES_PATH, &[], &["promocodes", "data"])
            .await
        {
            Ok(promos) => promos,
            Err(e) => {
                warn!(error = %e, "Failed to fetch promo codes");
                return None;
            }
        };

        let found = promos.into_iter().find(|p| p.code == code);
        debug!(found = found.is_some(), "Promo code lookup");
        found
    }
}
