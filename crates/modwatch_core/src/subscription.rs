//! Per-guild subscription entries.

use crate::{ChannelId, GuildId, ProjectId, ReleaseFilter, RoleId, Version};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Loader tags a subscription is restricted to.
///
/// Tags are stored lower-cased so matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoaderFilter(BTreeSet<String>);

impl LoaderFilter {
    /// Build a filter from loader names.
    pub fn new<I, S>(loaders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            loaders
                .into_iter()
                .map(|l| l.as_ref().to_ascii_lowercase())
                .collect(),
        )
    }

    /// Whether the version carries at least one of the filtered loaders.
    pub fn admits(&self, version: &Version) -> bool {
        version.has_any_loader(&self.0)
    }

    /// Loader names in the filter.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether the filter names no loader.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The join of a guild and a project, carrying delivery configuration and filters.
///
/// # Examples
///
/// ```
/// use modwatch_core::{ChannelId, GuildId, ProjectId, ReleaseFilter, SubscriptionEntry};
///
/// let entry = SubscriptionEntry::new(GuildId(1), ProjectId::new("AANobbMI"))
///     .with_channel_id(Some(ChannelId(42)));
/// assert_eq!(entry.release_filter, ReleaseFilter::ALL);
/// assert!(entry.loader_filter.is_none());
/// assert!(entry.is_deliverable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct SubscriptionEntry {
    /// Subscribing guild
    #[setters(skip)]
    pub guild_id: GuildId,
    /// Subscribed project
    #[setters(skip)]
    pub project_id: ProjectId,
    /// Destination channel; unset until configured
    pub channel_id: Option<ChannelId>,
    /// Role to mention on every notification
    pub role_id: Option<RoleId>,
    /// Release types to notify about
    pub release_filter: ReleaseFilter,
    /// Loaders to notify about; unset means every loader
    pub loader_filter: Option<LoaderFilter>,
}

impl SubscriptionEntry {
    /// A fresh entry with default filters and no destination.
    pub fn new(guild_id: GuildId, project_id: ProjectId) -> Self {
        Self {
            guild_id,
            project_id,
            channel_id: None,
            role_id: None,
            release_filter: ReleaseFilter::default(),
            loader_filter: None,
        }
    }

    /// Whether a destination channel is configured.
    pub fn is_deliverable(&self) -> bool {
        self.channel_id.is_some()
    }

    /// Whether `version` passes both the release and the loader filter.
    pub fn admits(&self, version: &Version) -> bool {
        self.release_filter.admits(version.version_type)
            && self
                .loader_filter
                .as_ref()
                .is_none_or(|filter| filter.admits(version))
    }
}
