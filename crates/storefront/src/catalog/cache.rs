//! Cache types for catalog responses.

use super::types::{Brand, CaseType, PhoneModel};
use casemandu_core::BrandId;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Brands,
    Models(BrandId),
    /// Full case-type listing from one probed endpoint.
    CaseTypes(&'static str),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Brands(Vec<Brand>),
    Models(Vec<PhoneModel>),
    CaseTypes(Vec<CaseType>),
}
