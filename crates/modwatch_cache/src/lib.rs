//! Short-lived caching of catalog lookups.
//!
//! This crate provides a TTL cache keyed by `(namespace, id)` pairs, with an
//! expiry policy per namespace. Expiry is passive: stale entries are dropped
//! when read, and no background task is involved.

#![warn(missing_docs)]

mod cache;
mod catalog_cache;

pub use cache::{CacheEntry, TtlCache};
pub use catalog_cache::{
    CacheKey, CachePolicy, CachePolicyBuilder, CacheValue, CatalogCache, Namespace,
};
