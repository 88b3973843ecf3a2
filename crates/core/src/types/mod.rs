//! Core types for the Casemandu storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod line_item;
pub mod loose;
pub mod placement;
pub mod price;

pub use id::*;
pub use line_item::LineItem;
pub use loose::{LoosePrice, LooseText};
pub use placement::Placement;
pub use price::{Price, PriceError};
