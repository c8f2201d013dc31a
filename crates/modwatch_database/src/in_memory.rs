//! In-memory implementation of [`TrackerStore`].
//!
//! Keeps everything in hash maps behind one lock, so every operation is
//! atomic with respect to the others. Useful for tests and single-process
//! deployments without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use modwatch_core::{Guild, GuildId, ProjectId, SubscriptionEntry, TrackedProject, Version};
use modwatch_error::{StoreError, StoreErrorKind, StoreResult};
use modwatch_interface::TrackerStore;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    projects: BTreeMap<ProjectId, TrackedProject>,
    guilds: HashMap<GuildId, Guild>,
    entries: BTreeMap<(GuildId, ProjectId), SubscriptionEntry>,
}

/// Tracker store held entirely in memory.
///
/// All data is lost when the last clone is dropped.
///
/// # Example
/// ```
/// use modwatch_database::InMemoryTrackerStore;
/// use modwatch_interface::TrackerStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryTrackerStore::new();
/// assert!(store.list_tracked_projects().await?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTrackerStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryTrackerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked projects (for testing).
    pub async fn project_count(&self) -> usize {
        self.tables.read().await.projects.len()
    }

    /// Number of subscription entries (for testing).
    pub async fn entry_count(&self) -> usize {
        self.tables.read().await.entries.len()
    }
}

#[async_trait]
impl TrackerStore for InMemoryTrackerStore {
    async fn list_tracked_projects(&self) -> StoreResult<Vec<TrackedProject>> {
        Ok(self.tables.read().await.projects.values().cloned().collect())
    }

    async fn get_tracked_project(&self, id: &ProjectId) -> StoreResult<Option<TrackedProject>> {
        Ok(self.tables.read().await.projects.get(id).cloned())
    }

    async fn track_project(&self, project: TrackedProject) -> StoreResult<TrackedProject> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .projects
            .entry(project.id.clone())
            .or_insert(project)
            .clone())
    }

    async fn update_cursor(
        &self,
        id: &ProjectId,
        cursor: &Version,
        checked_at: DateTime<Utc>,
    ) -> StoreResult<TrackedProject> {
        let mut tables = self.tables.write().await;
        let project = tables.projects.get_mut(id).ok_or_else(|| {
            StoreError::new(StoreErrorKind::NotFound(format!("tracked project {id}")))
        })?;
        if !project.accepts_cursor(cursor) {
            return Err(StoreError::new(StoreErrorKind::StaleCursor(format!(
                "{id} is at {:?}, refusing {}",
                project.last_checked_version_id, cursor.id
            ))));
        }
        project.advance_to(cursor, checked_at);
        Ok(project.clone())
    }

    async fn list_project_entries(
        &self,
        project_id: &ProjectId,
    ) -> StoreResult<Vec<SubscriptionEntry>> {
        Ok(self
            .tables
            .read()
            .await
            .entries
            .values()
            .filter(|e| &e.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn list_guild_entries(&self, guild_id: GuildId) -> StoreResult<Vec<SubscriptionEntry>> {
        Ok(self
            .tables
            .read()
            .await
            .entries
            .values()
            .filter(|e| e.guild_id == guild_id)
            .cloned()
            .collect())
    }

    async fn get_entry(
        &self,
        guild_id: GuildId,
        project_id: &ProjectId,
    ) -> StoreResult<Option<SubscriptionEntry>> {
        Ok(self
            .tables
            .read()
            .await
            .entries
            .get(&(guild_id, project_id.clone()))
            .cloned())
    }

    async fn upsert_entry(&self, entry: SubscriptionEntry) -> StoreResult<SubscriptionEntry> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&entry.project_id) {
            return Err(StoreError::new(StoreErrorKind::NotFound(format!(
                "tracked project {}",
                entry.project_id
            ))));
        }
        tables
            .entries
            .insert((entry.guild_id, entry.project_id.clone()), entry.clone());
        Ok(entry)
    }

    async fn delete_entry(&self, guild_id: GuildId, project_id: &ProjectId) -> StoreResult<bool> {
        Ok(self
            .tables
            .write()
            .await
            .entries
            .remove(&(guild_id, project_id.clone()))
            .is_some())
    }

    async fn get_guild(&self, guild_id: GuildId) -> StoreResult<Option<Guild>> {
        Ok(self.tables.read().await.guilds.get(&guild_id).cloned())
    }

    async fn upsert_guild(&self, guild: Guild) -> StoreResult<Guild> {
        self.tables
            .write()
            .await
            .guilds
            .insert(guild.id, guild.clone());
        Ok(guild)
    }

    async fn remove_guild(&self, guild_id: GuildId) -> StoreResult<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.entries.len();
        tables.entries.retain(|(g, _), _| *g != guild_id);
        tables.guilds.remove(&guild_id);
        Ok(before - tables.entries.len())
    }

    async fn delete_orphaned_projects(&self) -> StoreResult<usize> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let before = tables.projects.len();
        let entries = &tables.entries;
        tables
            .projects
            .retain(|id, _| entries.values().any(|e| &e.project_id == id));
        Ok(before - tables.projects.len())
    }
}
