//! Error types for modwatch.
//!
//! This crate provides the error types shared by every modwatch crate.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use modwatch_error::{CatalogError, CatalogErrorKind, ModwatchResult};
//!
//! fn fetch_project() -> ModwatchResult<String> {
//!     Err(CatalogError::new(CatalogErrorKind::NotFound("sodium".to_string())))?
//! }
//!
//! match fetch_project() {
//!     Ok(title) => println!("Got: {}", title),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod config;
mod delivery;
mod error;
mod store;

pub use catalog::{CatalogError, CatalogErrorKind, CatalogResult};
pub use config::ConfigError;
pub use delivery::{DeliveryError, DeliveryErrorKind, DeliveryResult};
pub use error::{ModwatchError, ModwatchErrorKind, ModwatchResult};
pub use store::{StoreError, StoreErrorKind, StoreResult};
