//! Subscription lifecycle: subscribe, unsubscribe, guild departure, entry settings.

use modwatch_core::{
    ChannelId, Guild, GuildId, LoaderFilter, ProjectId, ProjectMetadata, ReleaseFilter, RoleId,
    SubscriptionEntry, TrackedProject, newest_first,
};
use modwatch_error::{ModwatchError, ModwatchErrorKind, ModwatchResult, StoreError, StoreErrorKind};
use modwatch_interface::{CatalogClient, TrackerStore};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

fn is_store_not_found(err: &ModwatchError) -> bool {
    matches!(
        err.kind(),
        ModwatchErrorKind::Store(StoreError {
            kind: StoreErrorKind::NotFound(_),
            ..
        })
    )
}

/// Creates and removes subscription entries, keeping tracked projects in step.
///
/// A project starts being tracked on its first subscription with the cursor
/// on its newest version, so the next cycle reports nothing old. Once its
/// last entry goes, the orphan sweep removes it.
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn TrackerStore>,
    catalog: Arc<dyn CatalogClient>,
}

impl SubscriptionService {
    /// Create a service over a store and the catalog.
    pub fn new(store: Arc<dyn TrackerStore>, catalog: Arc<dyn CatalogClient>) -> Self {
        Self { store, catalog }
    }

    /// Subscribe `guild_id` to a project given by id or slug.
    ///
    /// Returns the existing entry unchanged if the guild is already subscribed.
    /// If an orphan sweep removes the freshly tracked project before the entry
    /// is written, tracking is retried once.
    ///
    /// # Errors
    ///
    /// Fails with a catalog `NotFound` if the project does not exist, or with
    /// any catalog or store error met on the way.
    #[instrument(skip(self, guild_id, project), fields(guild_id = %guild_id, project = %project))]
    pub async fn subscribe(
        &self,
        guild_id: GuildId,
        project: &ProjectId,
    ) -> ModwatchResult<SubscriptionEntry> {
        let metadata = self.catalog.get_project(project).await?;

        if let Some(existing) = self.store.get_entry(guild_id, &metadata.id).await? {
            debug!("Already subscribed");
            return Ok(existing);
        }

        if self.store.get_guild(guild_id).await?.is_none() {
            self.store.upsert_guild(Guild::new(guild_id)).await?;
        }

        let entry = match self.attach(guild_id, &metadata).await {
            Err(e) if is_store_not_found(&e) => {
                warn!(error = %e, "Project swept while subscribing, retrying");
                self.attach(guild_id, &metadata).await?
            }
            result => result?,
        };
        Ok(entry)
    }

    /// Track the project if needed, then write the entry.
    async fn attach(
        &self,
        guild_id: GuildId,
        metadata: &ProjectMetadata,
    ) -> ModwatchResult<SubscriptionEntry> {
        let tracked = match self.store.get_tracked_project(&metadata.id).await? {
            Some(tracked) => tracked,
            None => {
                let versions = self
                    .catalog
                    .get_project_versions(&metadata.id)
                    .await?;
                let newest = versions.iter().min_by(|a, b| newest_first(a, b));
                let tracked =
                    TrackedProject::at_version(metadata.id.clone(), metadata.title.clone(), newest);
                self.store.track_project(tracked).await?
            }
        };

        let entry = self
            .store
            .upsert_entry(SubscriptionEntry::new(guild_id, tracked.id.clone()))
            .await?;
        info!(
            project_id = %tracked.id,
            cursor = ?tracked.last_checked_version_id,
            "Subscribed"
        );
        Ok(entry)
    }

    /// Remove a guild's subscription, then sweep orphaned projects.
    ///
    /// Returns whether an entry existed.
    #[instrument(skip(self, project_id), fields(project_id = %project_id))]
    pub async fn unsubscribe(&self, guild_id: GuildId, project_id: &ProjectId) -> ModwatchResult<bool> {
        let removed = self.store.delete_entry(guild_id, project_id).await?;
        let orphans = self.store.delete_orphaned_projects().await?;
        info!(removed, orphans, "Unsubscribed");
        Ok(removed)
    }

    /// Forget a guild that removed the bot, then sweep orphaned projects.
    ///
    /// Returns the number of entries removed.
    #[instrument(skip(self))]
    pub async fn remove_guild(&self, guild_id: GuildId) -> ModwatchResult<usize> {
        let removed = self.store.remove_guild(guild_id).await?;
        let orphans = self.store.delete_orphaned_projects().await?;
        info!(removed, orphans, "Guild removed");
        Ok(removed)
    }

    /// Every subscription a guild holds.
    pub async fn list_subscriptions(&self, guild_id: GuildId) -> ModwatchResult<Vec<SubscriptionEntry>> {
        Ok(self.store.list_guild_entries(guild_id).await?)
    }

    async fn update_entry<F>(
        &self,
        guild_id: GuildId,
        project_id: &ProjectId,
        change: F,
    ) -> ModwatchResult<SubscriptionEntry>
    where
        F: FnOnce(SubscriptionEntry) -> SubscriptionEntry + Send,
    {
        let entry = self
            .store
            .get_entry(guild_id, project_id)
            .await?
            .ok_or_else(|| {
                StoreError::new(StoreErrorKind::NotFound(format!(
                    "subscription of guild {guild_id} to {project_id}"
                )))
            })?;
        Ok(self.store.upsert_entry(change(entry)).await?)
    }

    /// Set or clear the destination channel.
    #[instrument(skip(self, project_id), fields(project_id = %project_id))]
    pub async fn set_channel(
        &self,
        guild_id: GuildId,
        project_id: &ProjectId,
        channel_id: Option<ChannelId>,
    ) -> ModwatchResult<SubscriptionEntry> {
        self.update_entry(guild_id, project_id, |e| e.with_channel_id(channel_id))
            .await
    }

    /// Set or clear the role mentioned on every notification.
    #[instrument(skip(self, project_id), fields(project_id = %project_id))]
    pub async fn set_role(
        &self,
        guild_id: GuildId,
        project_id: &ProjectId,
        role_id: Option<RoleId>,
    ) -> ModwatchResult<SubscriptionEntry> {
        self.update_entry(guild_id, project_id, |e| e.with_role_id(role_id))
            .await
    }

    /// Replace the release-type filter.
    #[instrument(skip(self, project_id), fields(project_id = %project_id))]
    pub async fn set_release_filter(
        &self,
        guild_id: GuildId,
        project_id: &ProjectId,
        filter: ReleaseFilter,
    ) -> ModwatchResult<SubscriptionEntry> {
        self.update_entry(guild_id, project_id, |e| e.with_release_filter(filter))
            .await
    }

    /// Set or clear the loader filter.
    #[instrument(skip(self, project_id), fields(project_id = %project_id))]
    pub async fn set_loader_filter(
        &self,
        guild_id: GuildId,
        project_id: &ProjectId,
        filter: Option<LoaderFilter>,
    ) -> ModwatchResult<SubscriptionEntry> {
        self.update_entry(guild_id, project_id, move |e| e.with_loader_filter(filter))
            .await
    }

    /// Store a guild's presentation settings.
    pub async fn configure_guild(&self, guild: Guild) -> ModwatchResult<Guild> {
        Ok(self.store.upsert_guild(guild).await?)
    }
}

impl std::fmt::Debug for SubscriptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionService").finish_non_exhaustive()
    }
}
