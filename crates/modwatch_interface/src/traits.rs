//! Trait definitions for the pipeline's external collaborators.

use crate::RenderedMessage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use modwatch_core::{
    ChannelId, Guild, GuildId, ProjectId, ProjectMetadata, RoleId, SubscriptionEntry,
    TeamMember, TrackedProject, Version, VersionId,
};
use modwatch_error::{CatalogResult, DeliveryResult, StoreResult};

/// The external project catalog.
///
/// Implementations must report a missing entity as
/// [`CatalogErrorKind::NotFound`](modwatch_error::CatalogErrorKind::NotFound)
/// and anything else that went wrong as a transport or status error.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch metadata for several projects in one call.
    ///
    /// Projects unknown to the catalog are omitted from the result.
    async fn get_projects(&self, ids: &[ProjectId]) -> CatalogResult<Vec<ProjectMetadata>>;

    /// Fetch several versions in one call.
    ///
    /// Versions unknown to the catalog are omitted from the result.
    async fn get_versions(&self, ids: &[VersionId]) -> CatalogResult<Vec<Version>>;

    /// Fetch every version of one project.
    async fn get_project_versions(&self, id: &ProjectId) -> CatalogResult<Vec<Version>>;

    /// Fetch metadata for one project by id or slug.
    async fn get_project(&self, id: &ProjectId) -> CatalogResult<ProjectMetadata>;

    /// Fetch the members of a project team.
    async fn get_team_members(&self, team_id: &str) -> CatalogResult<Vec<TeamMember>>;

    /// Fetch the catalog's loader taxonomy.
    async fn get_loaders(&self) -> CatalogResult<Vec<String>>;
}

/// Persisted tracking state.
///
/// Implementations provide the atomicity the pipeline relies on: a cursor
/// update is a single transactional read-modify-write.
#[async_trait]
pub trait TrackerStore: Send + Sync {
    /// Every tracked project.
    async fn list_tracked_projects(&self) -> StoreResult<Vec<TrackedProject>>;

    /// One tracked project, if tracked.
    async fn get_tracked_project(&self, id: &ProjectId) -> StoreResult<Option<TrackedProject>>;

    /// Start tracking a project, or return the existing record unchanged.
    async fn track_project(&self, project: TrackedProject) -> StoreResult<TrackedProject>;

    /// Move a project's cursor to `cursor` and stamp the check time.
    ///
    /// Fails with `NotFound` if the project is not tracked, and with
    /// `StaleCursor` if `cursor` is older than the stored cursor.
    async fn update_cursor(
        &self,
        id: &ProjectId,
        cursor: &Version,
        checked_at: DateTime<Utc>,
    ) -> StoreResult<TrackedProject>;

    /// Subscription entries for one project.
    async fn list_project_entries(&self, project_id: &ProjectId)
    -> StoreResult<Vec<SubscriptionEntry>>;

    /// Subscription entries owned by one guild.
    async fn list_guild_entries(&self, guild_id: GuildId) -> StoreResult<Vec<SubscriptionEntry>>;

    /// One subscription entry, if present.
    async fn get_entry(
        &self,
        guild_id: GuildId,
        project_id: &ProjectId,
    ) -> StoreResult<Option<SubscriptionEntry>>;

    /// Insert or replace a subscription entry.
    async fn upsert_entry(&self, entry: SubscriptionEntry) -> StoreResult<SubscriptionEntry>;

    /// Remove a subscription entry. Returns whether one existed.
    async fn delete_entry(&self, guild_id: GuildId, project_id: &ProjectId) -> StoreResult<bool>;

    /// Guild settings, if the guild is known.
    async fn get_guild(&self, guild_id: GuildId) -> StoreResult<Option<Guild>>;

    /// Insert or replace guild settings.
    async fn upsert_guild(&self, guild: Guild) -> StoreResult<Guild>;

    /// Forget a guild and all of its subscription entries.
    ///
    /// Returns the number of entries removed.
    async fn remove_guild(&self, guild_id: GuildId) -> StoreResult<usize>;

    /// Delete every tracked project that has no subscription entry.
    ///
    /// Returns the number of projects removed.
    async fn delete_orphaned_projects(&self) -> StoreResult<usize>;
}

/// Delivery channel for rendered notifications.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send one notification to `channel`, mentioning `mention` when given.
    async fn send_notification(
        &self,
        channel: ChannelId,
        message: &RenderedMessage,
        mention: Option<RoleId>,
    ) -> DeliveryResult<()>;

    /// Platform name for logs (e.g. "discord").
    fn platform_name(&self) -> &str;
}
