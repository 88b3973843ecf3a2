//! Unified error handling with Sentry integration.
//!
//! Module errors convert into [`AppError`]. Front ends show
//! [`AppError::user_message`] to the customer and call [`AppError::report`]
//! so operator-relevant failures reach Sentry.

use thiserror::Error;

use crate::cart::RemovalError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::designs::ComposeError;
use crate::order::OrderError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Durable storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A selection could not become a cart entry.
    #[error("Cart error: {0}")]
    Compose(#[from] ComposeError),

    /// A removal prompt could not be confirmed.
    #[error("Cart error: {0}")]
    Removal(#[from] RemovalError),

    /// Placing the order failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Reading a local file (artwork, payment proof) failed.
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        Self::Checkout(CheckoutError::Order(err))
    }
}

impl AppError {
    /// Short message safe to show to the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) | Self::Storage(_) | Self::Io(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            Self::Compose(err) => err.to_string(),
            Self::Removal(RemovalError::Expired) => "The removal prompt expired".to_string(),
            Self::Removal(RemovalError::NotFound(_)) => "That item is not in your cart".to_string(),
            Self::Checkout(err) => err.to_string(),
        }
    }

    /// Whether operators should hear about this error.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Storage(_)
                | Self::Io(_)
                | Self::Checkout(CheckoutError::Order(
                    OrderError::SerializationFailure(_)
                        | OrderError::TransportFailure(_)
                        | OrderError::BackendRejected(_)
                ))
        )
    }

    /// Capture the error to Sentry if it is reportable, and log it.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::debug!(error = %self, "User-facing error");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("item_id", "1700000000000-abc")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use casemandu_core::ItemId;

    use super::*;

    #[test]
    fn test_user_message_hides_internal_detail() {
        let err = AppError::Io(std::io::Error::other("disk on fire at /var/lib"));
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");

        let err = AppError::from(OrderError::TransportFailure("connection refused".to_string()));
        assert!(!err.user_message().contains("refused"));
    }

    #[test]
    fn test_user_message_passes_through_backend_message() {
        let err = AppError::from(OrderError::BackendRejected("Invalid phone".to_string()));
        assert_eq!(err.user_message(), "Invalid phone");
    }

    #[test]
    fn test_reportable_errors() {
        assert!(AppError::from(OrderError::BackendRejected("x".to_string())).is_reportable());
        assert!(!AppError::from(OrderError::EmptyCart).is_reportable());
        assert!(!AppError::from(CheckoutError::SubmissionInFlight).is_reportable());
        assert!(!AppError::from(RemovalError::NotFound(ItemId::new("a"))).is_reportable());
        assert!(!AppError::from(ComposeError::MissingArtwork).is_reportable());
    }

    #[test]
    fn test_display() {
        let err = AppError::from(ComposeError::MissingLaptopSize);
        assert_eq!(
            err.to_string(),
            "Cart error: Please enter the size of your laptop"
        );
    }
}
