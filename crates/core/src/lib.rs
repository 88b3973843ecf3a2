//! Casemandu Core - Shared domain types.
//!
//! This crate provides the types shared by every Casemandu component:
//! - `storefront` - Cart, asset, catalog and order logic
//! - `cli` - Terminal front-end for browsing, carting and checkout
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, placements, and the cart line item

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
