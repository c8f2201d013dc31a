//! Collaborator interfaces for modwatch.
//!
//! The detect-and-notify pipeline only talks to the outside world through
//! the traits in this crate:
//!
//! - [`CatalogClient`]: the external project catalog
//! - [`TrackerStore`]: persisted cursors, subscriptions and guild settings
//! - [`Messenger`]: delivery of rendered notifications

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod message;
mod traits;

pub use message::{EmbedField, RenderedMessage, RenderedMessageBuilder};
pub use traits::{CatalogClient, Messenger, TrackerStore};
