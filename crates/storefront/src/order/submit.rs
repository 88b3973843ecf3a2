//! Sending an order and reading the backend's answer.

use casemandu_core::OrderId;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use super::{ORDERS_PATH, OrderError, OrderSubmission};
use crate::client::ApiClient;

/// Longest raw error body surfaced as a rejection message.
const MAX_RAW_MESSAGE_CHARS: usize = 200;

impl ApiClient {
    /// Submit a built order and return the backend's order id.
    ///
    /// # Errors
    ///
    /// - [`OrderError::TransportFailure`] if no response was received.
    /// - [`OrderError::BackendRejected`] on a non-success status or a success
    ///   response without an order id.
    /// - [`OrderError::SerializationFailure`] if the multipart body could not
    ///   be assembled.
    #[instrument(skip(self, submission), fields(items = submission.items().len()))]
    pub async fn submit_order(&self, submission: OrderSubmission) -> Result<OrderId, OrderError> {
        let order_items_json = submission.order_items_json().to_string();
        let form = submission.into_form()?;

        let response = self
            .http()
            .post(self.url(ORDERS_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Order request failed");
                OrderError::TransportFailure(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!(error = %e, "Failed to read order response");
            OrderError::TransportFailure(e.to_string())
        })?;

        if !status.is_success() {
            let message = rejection_message(status.as_u16(), &body);
            if mentions_missing_items(&message) {
                error!(
                    order_items = %order_items_json,
                    message = %message,
                    "Backend reported no order items"
                );
            } else {
                warn!(status = status.as_u16(), message = %message, "Order rejected");
            }
            return Err(OrderError::BackendRejected(message));
        }

        let order_id = serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(extract_order_id)
            .ok_or_else(|| {
                warn!(
                    body = %body.chars().take(MAX_RAW_MESSAGE_CHARS).collect::<String>(),
                    "Order response has no order id"
                );
                OrderError::BackendRejected(
                    "Order creation failed. Please try again.".to_string(),
                )
            })?;

        info!(order_id = %order_id, "Order created");
        Ok(order_id)
    }
}

/// The message to show for a rejected order: the body's `message`, then its
/// `error`, then the raw body text, then a generic status line.
fn rejection_message(status: u16, body: &str) -> String {
    let fallback = || format!("Order creation failed with status {status}");

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        return ["message", "error"]
            .iter()
            .find_map(|field| {
                json.get(*field)
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
            })
            .map_or_else(fallback, ToString::to_string);
    }

    let text = body.trim();
    if text.is_empty() {
        fallback()
    } else {
        text.chars().take(MAX_RAW_MESSAGE_CHARS).collect()
    }
}

/// Whether a rejection says the order had no items.
fn mentions_missing_items(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("order item") || lower.contains("no order")
}

/// The order id from `data._id`, or a top-level `_id`.
fn extract_order_id(body: &Value) -> Option<OrderId> {
    let nested = body.get("data").and_then(|data| data.get("_id"));
    nested
        .and_then(Value::as_str)
        .or_else(|| body.get("_id").and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .map(OrderId::from)
}
