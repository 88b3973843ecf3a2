//! Order submission: cart validation, payload assembly and the `POST`.
//!
//! [`build_order`] runs every check that can fail before the network is
//! touched. [`ApiClient::submit_order`](crate::client::ApiClient::submit_order)
//! sends the result and interprets the backend's answer.

pub mod builder;
mod submit;

use casemandu_core::Price;
use thiserror::Error;

pub use builder::{
    CustomerDetails, OrderItemRecord, OrderRequest, OrderSubmission, PriceSummary, build_order,
};

/// Order creation endpoint.
pub const ORDERS_PATH: &str = "/api/orders";

/// Flat delivery charge added to every order.
pub const DELIVERY_CHARGE: Price = Price::from_units(150);

/// Errors from building or submitting an order.
///
/// The `Display` text of each variant is safe to show to the customer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Nothing in the cart.
    #[error("Your cart is empty. Please add items to cart before placing order.")]
    EmptyCart,

    /// The cart has entries, but none has a usable name and price.
    #[error("No valid items in cart. Please check your cart items have name and price.")]
    NoValidItems,

    /// The order items could not be encoded.
    #[error("Failed to format order items. Please try again.")]
    SerializationFailure(String),

    /// The request never got an answer.
    #[error("Could not reach the order service. Please try again.")]
    TransportFailure(String),

    /// The backend answered and refused the order.
    #[error("{0}")]
    BackendRejected(String),
}
