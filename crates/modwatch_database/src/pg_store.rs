//! PostgreSQL implementation of [`TrackerStore`].

use crate::connection::PgPool;
use crate::models::{GuildRow, SubscriptionEntryRow, TrackedProjectRow};
use crate::schema::{guilds, subscription_entries, tracked_projects};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{exists, not};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use modwatch_core::{Guild, GuildId, ProjectId, SubscriptionEntry, TrackedProject, Version};
use modwatch_error::{StoreError, StoreErrorKind, StoreResult};
use modwatch_interface::TrackerStore;
use tracing::{debug, instrument};

/// Tracker store backed by PostgreSQL.
///
/// Diesel is synchronous, so each operation checks a connection out of the
/// pool and runs on the blocking thread pool.
///
/// # Example
/// ```no_run
/// use modwatch_database::{PgTrackerStore, establish_pool_from_env};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = establish_pool_from_env(8)?;
/// let store = PgTrackerStore::new(pool);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PgTrackerStore {
    pool: PgPool,
}

impl PgTrackerStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            op(&mut conn)
        })
        .await
        .map_err(|e| StoreError::new(StoreErrorKind::Query(e.to_string())))?
    }
}

impl std::fmt::Debug for PgTrackerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTrackerStore")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

#[async_trait]
impl TrackerStore for PgTrackerStore {
    #[instrument(skip(self))]
    async fn list_tracked_projects(&self) -> StoreResult<Vec<TrackedProject>> {
        self.run(|conn| {
            let rows = tracked_projects::table
                .order(tracked_projects::id)
                .select(TrackedProjectRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(TrackedProject::from).collect())
        })
        .await
    }

    #[instrument(skip(self), fields(project_id = %id))]
    async fn get_tracked_project(&self, id: &ProjectId) -> StoreResult<Option<TrackedProject>> {
        let id = id.0.clone();
        self.run(move |conn| {
            let row = tracked_projects::table
                .find(&id)
                .select(TrackedProjectRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(TrackedProject::from))
        })
        .await
    }

    #[instrument(skip(self), fields(project_id = %project.id))]
    async fn track_project(&self, project: TrackedProject) -> StoreResult<TrackedProject> {
        let row = TrackedProjectRow::from(project);
        self.run(move |conn| {
            let inserted = diesel::insert_into(tracked_projects::table)
                .values(&row)
                .on_conflict(tracked_projects::id)
                .do_nothing()
                .execute(conn)?;
            debug!(inserted, "Tracked project");
            let stored = tracked_projects::table
                .find(&row.id)
                .select(TrackedProjectRow::as_select())
                .first(conn)?;
            Ok(TrackedProject::from(stored))
        })
        .await
    }

    #[instrument(skip(self, id, cursor), fields(project_id = %id, version_id = %cursor.id))]
    async fn update_cursor(
        &self,
        id: &ProjectId,
        cursor: &Version,
        checked_at: DateTime<Utc>,
    ) -> StoreResult<TrackedProject> {
        let id = id.0.clone();
        let cursor = cursor.clone();
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let locked = tracked_projects::table
                    .find(&id)
                    .select(TrackedProjectRow::as_select())
                    .for_update()
                    .first(conn)
                    .optional()?
                    .map(TrackedProject::from)
                    .ok_or_else(|| {
                        StoreError::new(StoreErrorKind::NotFound(format!("tracked project {id}")))
                    })?;
                if !locked.accepts_cursor(&cursor) {
                    return Err(StoreError::new(StoreErrorKind::StaleCursor(format!(
                        "{id} is at {:?}, refusing {}",
                        locked.last_checked_version_id, cursor.id
                    ))));
                }

                let updated = diesel::update(tracked_projects::table.find(&id))
                    .set((
                        tracked_projects::last_checked_version_id.eq(Some(cursor.id.as_str())),
                        tracked_projects::cursor_published_at.eq(Some(cursor.date_published)),
                        tracked_projects::last_checked_at.eq(Some(checked_at)),
                    ))
                    .returning(TrackedProjectRow::as_returning())
                    .get_result(conn)?;
                Ok(TrackedProject::from(updated))
            })
        })
        .await
    }

    #[instrument(skip(self, project_id), fields(project_id = %project_id))]
    async fn list_project_entries(
        &self,
        project_id: &ProjectId,
    ) -> StoreResult<Vec<SubscriptionEntry>> {
        let project_id = project_id.0.clone();
        self.run(move |conn| {
            let rows = subscription_entries::table
                .filter(subscription_entries::project_id.eq(&project_id))
                .order(subscription_entries::guild_id)
                .select(SubscriptionEntryRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(SubscriptionEntry::from).collect())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_guild_entries(&self, guild_id: GuildId) -> StoreResult<Vec<SubscriptionEntry>> {
        self.run(move |conn| {
            let rows = subscription_entries::table
                .filter(subscription_entries::guild_id.eq(guild_id.0 as i64))
                .order(subscription_entries::project_id)
                .select(SubscriptionEntryRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(SubscriptionEntry::from).collect())
        })
        .await
    }

    #[instrument(skip(self, project_id), fields(project_id = %project_id))]
    async fn get_entry(
        &self,
        guild_id: GuildId,
        project_id: &ProjectId,
    ) -> StoreResult<Option<SubscriptionEntry>> {
        let project_id = project_id.0.clone();
        self.run(move |conn| {
            let row = subscription_entries::table
                .find((guild_id.0 as i64, &project_id))
                .select(SubscriptionEntryRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(SubscriptionEntry::from))
        })
        .await
    }

    #[instrument(skip(self), fields(guild_id = %entry.guild_id, project_id = %entry.project_id))]
    async fn upsert_entry(&self, entry: SubscriptionEntry) -> StoreResult<SubscriptionEntry> {
        let row = SubscriptionEntryRow::from(&entry);
        self.run(move |conn| {
            let stored = diesel::insert_into(subscription_entries::table)
                .values(&row)
                .on_conflict((subscription_entries::guild_id, subscription_entries::project_id))
                .do_update()
                .set(&row)
                .returning(SubscriptionEntryRow::as_returning())
                .get_result(conn)?;
            Ok(SubscriptionEntry::from(stored))
        })
        .await
    }

    #[instrument(skip(self, project_id), fields(project_id = %project_id))]
    async fn delete_entry(&self, guild_id: GuildId, project_id: &ProjectId) -> StoreResult<bool> {
        let project_id = project_id.0.clone();
        self.run(move |conn| {
            let deleted = diesel::delete(
                subscription_entries::table.find((guild_id.0 as i64, &project_id)),
            )
            .execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get_guild(&self, guild_id: GuildId) -> StoreResult<Option<Guild>> {
        self.run(move |conn| {
            guilds::table
                .find(guild_id.0 as i64)
                .select(GuildRow::as_select())
                .first(conn)
                .optional()?
                .map(Guild::try_from)
                .transpose()
        })
        .await
    }

    #[instrument(skip(self), fields(guild_id = %guild.id))]
    async fn upsert_guild(&self, guild: Guild) -> StoreResult<Guild> {
        let row = GuildRow::from(&guild);
        self.run(move |conn| {
            let stored = diesel::insert_into(guilds::table)
                .values(&row)
                .on_conflict(guilds::id)
                .do_update()
                .set((
                    guilds::message_style.eq(&row.message_style),
                    guilds::changelog_style.eq(&row.changelog_style),
                    guilds::ping_role_id.eq(row.ping_role_id),
                ))
                .returning(GuildRow::as_returning())
                .get_result(conn)?;
            Guild::try_from(stored)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn remove_guild(&self, guild_id: GuildId) -> StoreResult<usize> {
        let raw = guild_id.0 as i64;
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let entries = diesel::delete(
                    subscription_entries::table.filter(subscription_entries::guild_id.eq(raw)),
                )
                .execute(conn)?;
                diesel::delete(guilds::table.find(raw)).execute(conn)?;
                Ok(entries)
            })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_orphaned_projects(&self) -> StoreResult<usize> {
        self.run(|conn| {
            let removed = diesel::delete(tracked_projects::table.filter(not(exists(
                subscription_entries::table
                    .filter(subscription_entries::project_id.eq(tracked_projects::id)),
            ))))
            .execute(conn)?;
            debug!(removed, "Deleted orphaned projects");
            Ok(removed)
        })
        .await
    }
}
