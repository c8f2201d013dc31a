//! Core data model for modwatch.
//!
//! Types shared by the catalog client, the persistence store and the
//! detect-and-notify pipeline:
//!
//! - **Identifiers**: [`ProjectId`], [`VersionId`], [`GuildId`], [`ChannelId`], [`RoleId`]
//! - **Catalog data**: [`ProjectMetadata`], [`Version`], [`VersionFile`], [`TeamMember`]
//! - **Tracking state**: [`TrackedProject`], [`SubscriptionEntry`], [`Guild`]
//! - **Filters**: [`ReleaseType`], [`ReleaseFilter`], [`LoaderFilter`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod guild;
mod ids;
mod project;
mod release;
mod subscription;
mod version;

pub use guild::{ChangelogStyle, Guild, MessageStyle};
pub use ids::{ChannelId, GuildId, ProjectId, RoleId, VersionId};
pub use project::{ProjectMetadata, TeamMember, TrackedProject};
pub use release::{ReleaseFilter, ReleaseType};
pub use subscription::{LoaderFilter, SubscriptionEntry};
pub use version::{Version, VersionFile, newest_first};
