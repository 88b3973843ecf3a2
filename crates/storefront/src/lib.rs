//! Casemandu storefront library.
//!
//! Cart, catalog and checkout logic for a product-customization storefront:
//! customers pick a design or a phone model and case type, upload artwork,
//! and submit an order with a payment screenshot to the external Casemandu
//! API. Front ends (the `casemandu` CLI, tests) drive a [`state::Storefront`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod assets;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod client;
pub mod config;
pub mod designs;
pub mod error;
pub mod order;
pub mod promo;
pub mod state;
pub mod storage;

pub use client::ApiClient;
pub use config::StorefrontConfig;
pub use error::AppError;
pub use state::Storefront;
