//! Catalog access for modwatch.
//!
//! - [`BatchFetcher`] pulls project and version metadata in bounded chunks
//! - [`ModrinthClient`] implements [`CatalogClient`](modwatch_interface::CatalogClient)
//!   over the Modrinth v2 HTTP API with rate limiting and retries
//! - [`CachedCatalog`] serves interactive lookups through the catalog cache

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cached;
mod client;
mod config;
mod dto;
mod fetcher;

pub use cached::CachedCatalog;
pub use client::ModrinthClient;
pub use config::CatalogConfig;
pub use fetcher::{BatchFetcher, FetchedCatalog};
