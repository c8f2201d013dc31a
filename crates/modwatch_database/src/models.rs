//! Row types for the tracker tables and their domain conversions.

use crate::schema::{guilds, subscription_entries, tracked_projects};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use modwatch_core::{
    ChannelId, Guild, GuildId, LoaderFilter, ProjectId, ReleaseFilter, RoleId, SubscriptionEntry,
    TrackedProject, VersionId,
};
use modwatch_error::{StoreError, StoreErrorKind, StoreResult};

/// A tracked project row.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = tracked_projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TrackedProjectRow {
    pub id: String,
    pub title: String,
    pub last_checked_version_id: Option<String>,
    pub cursor_published_at: Option<DateTime<Utc>>,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl From<TrackedProjectRow> for TrackedProject {
    fn from(row: TrackedProjectRow) -> Self {
        Self {
            id: ProjectId(row.id),
            title: row.title,
            last_checked_version_id: row.last_checked_version_id.map(VersionId),
            cursor_published_at: row.cursor_published_at,
            last_checked_at: row.last_checked_at,
        }
    }
}

impl From<TrackedProject> for TrackedProjectRow {
    fn from(project: TrackedProject) -> Self {
        Self {
            id: project.id.0,
            title: project.title,
            last_checked_version_id: project.last_checked_version_id.map(|v| v.0),
            cursor_published_at: project.cursor_published_at,
            last_checked_at: project.last_checked_at,
        }
    }
}

/// A guild settings row.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = guilds)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GuildRow {
    pub id: i64,
    pub message_style: String,
    pub changelog_style: String,
    pub ping_role_id: Option<i64>,
}

impl TryFrom<GuildRow> for Guild {
    type Error = StoreError;

    fn try_from(row: GuildRow) -> StoreResult<Self> {
        let message_style = row.message_style.parse().map_err(|_| {
            StoreError::new(StoreErrorKind::Serialization(format!(
                "unknown message style '{}' for guild {}",
                row.message_style, row.id
            )))
        })?;
        let changelog_style = row.changelog_style.parse().map_err(|_| {
            StoreError::new(StoreErrorKind::Serialization(format!(
                "unknown changelog style '{}' for guild {}",
                row.changelog_style, row.id
            )))
        })?;
        Ok(Guild::new(GuildId(row.id as u64))
            .with_message_style(message_style)
            .with_changelog_style(changelog_style)
            .with_ping_role_id(row.ping_role_id.map(|r| RoleId(r as u64))))
    }
}

impl From<&Guild> for GuildRow {
    fn from(guild: &Guild) -> Self {
        Self {
            id: guild.id.0 as i64,
            message_style: guild.message_style.to_string(),
            changelog_style: guild.changelog_style.to_string(),
            ping_role_id: guild.ping_role_id.map(|r| r.0 as i64),
        }
    }
}

/// A subscription entry row.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = subscription_entries)]
#[diesel(primary_key(guild_id, project_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct SubscriptionEntryRow {
    pub guild_id: i64,
    pub project_id: String,
    pub channel_id: Option<i64>,
    pub role_id: Option<i64>,
    pub release_filter: i16,
    pub loader_filter: Option<Vec<String>>,
}

impl From<SubscriptionEntryRow> for SubscriptionEntry {
    fn from(row: SubscriptionEntryRow) -> Self {
        SubscriptionEntry::new(GuildId(row.guild_id as u64), ProjectId(row.project_id))
            .with_channel_id(row.channel_id.map(|c| ChannelId(c as u64)))
            .with_role_id(row.role_id.map(|r| RoleId(r as u64)))
            .with_release_filter(ReleaseFilter::from_bits(row.release_filter as u8))
            .with_loader_filter(row.loader_filter.map(LoaderFilter::new))
    }
}

impl From<&SubscriptionEntry> for SubscriptionEntryRow {
    fn from(entry: &SubscriptionEntry) -> Self {
        Self {
            guild_id: entry.guild_id.0 as i64,
            project_id: entry.project_id.0.clone(),
            channel_id: entry.channel_id.map(|c| c.0 as i64),
            role_id: entry.role_id.map(|r| r.0 as i64),
            release_filter: i16::from(entry.release_filter.bits()),
            loader_filter: entry
                .loader_filter
                .as_ref()
                .map(|f| f.iter().map(str::to_string).collect()),
        }
    }
}
