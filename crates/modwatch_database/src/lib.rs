//! Persistence for modwatch tracking state.
//!
//! Two [`TrackerStore`](modwatch_interface::TrackerStore) implementations:
//!
//! - [`PgTrackerStore`]: Diesel over a pooled PostgreSQL connection, cursor
//!   updates run in a row-locking transaction
//! - [`InMemoryTrackerStore`]: hash maps behind a lock, for tests and
//!   database-less deployments
//!
//! Migrations live in `migrations/` and are applied with the Diesel CLI.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod in_memory;
mod models;
mod pg_store;

/// Diesel table definitions.
#[allow(missing_docs)]
pub mod schema;

pub use connection::{PgPool, establish_pool, establish_pool_from_env};
pub use in_memory::InMemoryTrackerStore;
pub use models::{GuildRow, SubscriptionEntryRow, TrackedProjectRow};
pub use pg_store::PgTrackerStore;
