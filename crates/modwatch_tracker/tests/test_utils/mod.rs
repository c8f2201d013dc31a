//! Test doubles for the detect-and-notify pipeline.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use modwatch_catalog::BatchFetcher;
use modwatch_core::{
    ChannelId, Guild, GuildId, ProjectId, ProjectMetadata, ReleaseType, RoleId, SubscriptionEntry,
    TeamMember, TrackedProject, Version, VersionId,
};
use modwatch_database::InMemoryTrackerStore;
use modwatch_error::{
    CatalogError, CatalogErrorKind, CatalogResult, DeliveryError, DeliveryErrorKind,
    DeliveryResult, StoreError, StoreErrorKind, StoreResult,
};
use modwatch_interface::{CatalogClient, Messenger, RenderedMessage, TrackerStore};
use modwatch_tracker::{DetectionCycle, NotificationDispatcher, SubscriptionService};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::watch;

/// Publish time `minutes` after a fixed epoch.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

/// A release version of `project` published at `at(minutes)`.
pub fn version(project: &str, id: &str, minutes: i64) -> Version {
    Version::new(id, project, id, ReleaseType::Release, at(minutes))
}

/// A version with an explicit type and loaders.
pub fn typed_version(
    project: &str,
    id: &str,
    minutes: i64,
    release_type: ReleaseType,
    loaders: &[&str],
) -> Version {
    Version::new(id, project, id, release_type, at(minutes)).with_loaders(loaders.iter().copied())
}

#[derive(Default)]
struct CatalogState {
    projects: HashMap<ProjectId, ProjectMetadata>,
    versions: HashMap<VersionId, Version>,
    failure: Option<CatalogErrorKind>,
}

/// Catalog whose contents tests edit between cycles.
pub struct ScriptedCatalog {
    state: Mutex<CatalogState>,
    project_calls: AtomicUsize,
    version_calls: AtomicUsize,
    gate: watch::Sender<bool>,
    panic_next: AtomicBool,
}

impl Default for ScriptedCatalog {
    fn default() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            state: Mutex::new(CatalogState::default()),
            project_calls: AtomicUsize::new(0),
            version_calls: AtomicUsize::new(0),
            gate,
            panic_next: AtomicBool::new(false),
        }
    }
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a project with the given versions.
    pub fn publish(&self, project: &str, title: &str, versions: Vec<Version>) {
        let mut state = self.state.lock();
        let id = ProjectId::new(project);
        let version_ids = versions.iter().map(|v| v.id.clone()).collect();
        for v in versions {
            state.versions.insert(v.id.clone(), v);
        }
        state.projects.insert(
            id.clone(),
            ProjectMetadata {
                id,
                slug: title.to_lowercase().replace(' ', "-"),
                title: title.to_string(),
                description: String::new(),
                icon_url: None,
                team_id: format!("team-{project}"),
                project_type: "mod".to_string(),
                version_ids,
                updated: Utc::now(),
            },
        );
    }

    /// Add a version to an existing project.
    pub fn add_version(&self, version: Version) {
        let mut state = self.state.lock();
        if let Some(project) = state.projects.get_mut(&version.project_id) {
            project.version_ids.push(version.id.clone());
        }
        state.versions.insert(version.id.clone(), version);
    }

    /// Delete a version upstream.
    pub fn remove_version(&self, project: &str, id: &str) {
        let mut state = self.state.lock();
        let id = VersionId::new(id);
        if let Some(project) = state.projects.get_mut(&ProjectId::new(project)) {
            project.version_ids.retain(|v| v != &id);
        }
        state.versions.remove(&id);
    }

    /// Keep listing a version on its project but stop serving it.
    pub fn withhold_version(&self, id: &str) {
        self.state.lock().versions.remove(&VersionId::new(id));
    }

    /// Make the project vanish from batch responses.
    pub fn hide_project(&self, project: &str) {
        self.state.lock().projects.remove(&ProjectId::new(project));
    }

    /// Fail every batch call with `kind` until cleared.
    pub fn fail_with(&self, kind: Option<CatalogErrorKind>) {
        self.state.lock().failure = kind;
    }

    /// Hold batch calls until [`unblock`](Self::unblock).
    pub fn block(&self) {
        self.gate.send_replace(false);
    }

    pub fn unblock(&self) {
        self.gate.send_replace(true);
    }

    /// Panic inside the next project batch call.
    pub fn panic_next(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    pub fn project_calls(&self) -> usize {
        self.project_calls.load(Ordering::SeqCst)
    }

    pub fn version_calls(&self) -> usize {
        self.version_calls.load(Ordering::SeqCst)
    }

    fn failure(&self) -> CatalogResult<()> {
        match &self.state.lock().failure {
            Some(kind) => Err(CatalogError::new(kind.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogClient for ScriptedCatalog {
    async fn get_projects(&self, ids: &[ProjectId]) -> CatalogResult<Vec<ProjectMetadata>> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("scripted catalog panic");
        }
        self.failure()?;
        let state = self.state.lock();
        Ok(ids
            .iter()
            .filter_map(|id| state.projects.get(id).cloned())
            .collect())
    }

    async fn get_versions(&self, ids: &[VersionId]) -> CatalogResult<Vec<Version>> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        self.failure()?;
        let state = self.state.lock();
        Ok(ids
            .iter()
            .filter_map(|id| state.versions.get(id).cloned())
            .collect())
    }

    async fn get_project_versions(&self, id: &ProjectId) -> CatalogResult<Vec<Version>> {
        let state = self.state.lock();
        Ok(state
            .versions
            .values()
            .filter(|v| &v.project_id == id)
            .cloned()
            .collect())
    }

    async fn get_project(&self, id: &ProjectId) -> CatalogResult<ProjectMetadata> {
        let state = self.state.lock();
        state
            .projects
            .get(id)
            .or_else(|| state.projects.values().find(|p| p.slug == id.as_str()))
            .cloned()
            .ok_or_else(|| CatalogError::new(CatalogErrorKind::NotFound(id.to_string())))
    }

    async fn get_team_members(&self, _team_id: &str) -> CatalogResult<Vec<TeamMember>> {
        Ok(vec![])
    }

    async fn get_loaders(&self) -> CatalogResult<Vec<String>> {
        Ok(vec!["fabric".to_string(), "forge".to_string(), "quilt".to_string()])
    }
}

/// One message the recording messenger accepted.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub channel: ChannelId,
    pub message: RenderedMessage,
    pub mention: Option<RoleId>,
}

/// Messenger that records deliveries and can refuse chosen channels.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
    denied: Mutex<HashSet<ChannelId>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every message to `channel` with a permission error.
    pub fn deny(&self, channel: u64) {
        self.denied.lock().insert(ChannelId(channel));
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Titles sent to `channel`, in order.
    pub fn titles(&self, channel: u64) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.channel == ChannelId(channel))
            .map(|m| m.message.title().clone())
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_notification(
        &self,
        channel: ChannelId,
        message: &RenderedMessage,
        mention: Option<RoleId>,
    ) -> DeliveryResult<()> {
        if self.denied.lock().contains(&channel) {
            return Err(DeliveryError::new(DeliveryErrorKind::PermissionDenied(channel.0)));
        }
        self.sent.lock().push(SentMessage {
            channel,
            message: message.clone(),
            mention,
        });
        Ok(())
    }

    fn platform_name(&self) -> &str {
        "recording"
    }
}

/// In-memory store whose cursor writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryTrackerStore,
    fail_cursor_for: Mutex<HashSet<ProjectId>>,
    cursor_writes: AtomicUsize,
    sweep_before_upsert: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make cursor updates of `project` fail until cleared.
    pub fn fail_cursor(&self, project: &str, fail: bool) {
        let mut set = self.fail_cursor_for.lock();
        if fail {
            set.insert(ProjectId::new(project));
        } else {
            set.remove(&ProjectId::new(project));
        }
    }

    /// Run an orphan sweep right before the next entry write.
    pub fn sweep_before_next_upsert(&self) {
        self.sweep_before_upsert.store(true, Ordering::SeqCst);
    }

    pub fn cursor_writes(&self) -> usize {
        self.cursor_writes.load(Ordering::SeqCst)
    }

    pub async fn cursor(&self, project: &str) -> Option<VersionId> {
        self.inner
            .get_tracked_project(&ProjectId::new(project))
            .await
            .ok()
            .flatten()
            .and_then(|p| p.last_checked_version_id)
    }

    /// Track `project` with a bare cursor that carries no timestamps.
    pub async fn track_without_basis(&self, project: &str, cursor: &str) {
        self.inner
            .track_project(TrackedProject::new(
                ProjectId::new(project),
                project,
                Some(VersionId::new(cursor)),
            ))
            .await
            .unwrap();
    }
}

#[async_trait]
impl TrackerStore for FlakyStore {
    async fn list_tracked_projects(&self) -> StoreResult<Vec<TrackedProject>> {
        self.inner.list_tracked_projects().await
    }

    async fn get_tracked_project(&self, id: &ProjectId) -> StoreResult<Option<TrackedProject>> {
        self.inner.get_tracked_project(id).await
    }

    async fn track_project(&self, project: TrackedProject) -> StoreResult<TrackedProject> {
        self.inner.track_project(project).await
    }

    async fn update_cursor(
        &self,
        id: &ProjectId,
        cursor: &Version,
        checked_at: DateTime<Utc>,
    ) -> StoreResult<TrackedProject> {
        if self.fail_cursor_for.lock().contains(id) {
            return Err(StoreError::new(StoreErrorKind::Query(
                "connection reset".to_string(),
            )));
        }
        self.cursor_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update_cursor(id, cursor, checked_at).await
    }

    async fn list_project_entries(
        &self,
        project_id: &ProjectId,
    ) -> StoreResult<Vec<SubscriptionEntry>> {
        self.inner.list_project_entries(project_id).await
    }

    async fn list_guild_entries(&self, guild_id: GuildId) -> StoreResult<Vec<SubscriptionEntry>> {
        self.inner.list_guild_entries(guild_id).await
    }

    async fn get_entry(
        &self,
        guild_id: GuildId,
        project_id: &ProjectId,
    ) -> StoreResult<Option<SubscriptionEntry>> {
        self.inner.get_entry(guild_id, project_id).await
    }

    async fn upsert_entry(&self, entry: SubscriptionEntry) -> StoreResult<SubscriptionEntry> {
        if self.sweep_before_upsert.swap(false, Ordering::SeqCst) {
            self.inner.delete_orphaned_projects().await?;
        }
        self.inner.upsert_entry(entry).await
    }

    async fn delete_entry(&self, guild_id: GuildId, project_id: &ProjectId) -> StoreResult<bool> {
        self.inner.delete_entry(guild_id, project_id).await
    }

    async fn get_guild(&self, guild_id: GuildId) -> StoreResult<Option<Guild>> {
        self.inner.get_guild(guild_id).await
    }

    async fn upsert_guild(&self, guild: Guild) -> StoreResult<Guild> {
        self.inner.upsert_guild(guild).await
    }

    async fn remove_guild(&self, guild_id: GuildId) -> StoreResult<usize> {
        self.inner.remove_guild(guild_id).await
    }

    async fn delete_orphaned_projects(&self) -> StoreResult<usize> {
        self.inner.delete_orphaned_projects().await
    }
}

/// A wired pipeline over the doubles above.
pub struct Harness {
    pub catalog: Arc<ScriptedCatalog>,
    pub store: Arc<FlakyStore>,
    pub messenger: Arc<RecordingMessenger>,
    pub service: SubscriptionService,
}

impl Harness {
    pub fn new() -> Self {
        let catalog = Arc::new(ScriptedCatalog::new());
        let store = Arc::new(FlakyStore::new());
        let messenger = Arc::new(RecordingMessenger::new());
        let service = SubscriptionService::new(store.clone(), catalog.clone());
        Self {
            catalog,
            store,
            messenger,
            service,
        }
    }

    pub fn dispatcher(&self) -> NotificationDispatcher {
        NotificationDispatcher::new(self.messenger.clone(), self.store.clone())
    }

    /// An inline cycle with the given batch size.
    pub fn cycle(&self, batch_size: usize) -> DetectionCycle {
        DetectionCycle::new(
            BatchFetcher::new(self.catalog.clone(), batch_size),
            self.store.clone(),
            self.dispatcher(),
        )
        .with_max_concurrent_projects(4)
    }

    /// Subscribe `guild` to `project`, delivering to `channel` when given.
    pub async fn subscribe(&self, guild: u64, project: &str, channel: Option<u64>) -> SubscriptionEntry {
        let project_id = ProjectId::new(project);
        self.service
            .subscribe(GuildId(guild), &project_id)
            .await
            .unwrap();
        self.service
            .set_channel(GuildId(guild), &project_id, channel.map(ChannelId))
            .await
            .unwrap()
    }
}
