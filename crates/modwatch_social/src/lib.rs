//! Notification rendering and delivery for modwatch.
//!
//! [`render_version`] and [`render_resync_notice`] turn catalog data into
//! platform-neutral [`RenderedMessage`](modwatch_interface::RenderedMessage)s;
//! [`DiscordMessenger`] delivers them through the Discord HTTP API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod discord;
mod render;

pub use discord::DiscordMessenger;
pub use render::{
    ALPHA_COLOR, BETA_COLOR, DESCRIPTION_LIMIT, FIELD_LIMIT, RELEASE_COLOR, render_resync_notice,
    render_version, truncate_changelog,
};
