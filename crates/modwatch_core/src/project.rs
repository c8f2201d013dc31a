//! Catalog project metadata and the tracked-project cursor record.

use crate::{ProjectId, Version, VersionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project metadata as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Project id
    pub id: ProjectId,
    /// URL slug
    pub slug: String,
    /// Display title
    pub title: String,
    /// Short description
    pub description: String,
    /// Icon URL
    pub icon_url: Option<String>,
    /// Owning team
    pub team_id: String,
    /// Project type (mod, plugin, resourcepack, ...)
    pub project_type: String,
    /// Ids of every version of the project
    pub version_ids: Vec<VersionId>,
    /// Last modification time upstream
    pub updated: DateTime<Utc>,
}

impl ProjectMetadata {
    /// Public page of the project.
    pub fn page_url(&self) -> String {
        format!("https://modrinth.com/{}/{}", self.project_type, self.slug)
    }

    /// Public page of one of the project's versions.
    pub fn version_url(&self, version_id: &VersionId) -> String {
        format!("{}/version/{}", self.page_url(), version_id)
    }
}

/// Member of a project's team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Team the membership belongs to
    pub team_id: String,
    /// Username of the member
    pub username: String,
    /// Role title within the team
    pub role: String,
}

/// A project some guild subscribes to, with its detection cursor.
///
/// The cursor (`last_checked_version_id`) only ever points at a version the
/// tracker has itself observed, and never moves to an older one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProject {
    /// Project id
    pub id: ProjectId,
    /// Display title at the time of the last check
    pub title: String,
    /// Cursor: newest version already reported
    pub last_checked_version_id: Option<VersionId>,
    /// Publish time of the cursor version
    pub cursor_published_at: Option<DateTime<Utc>>,
    /// When the cursor last moved
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl TrackedProject {
    /// A tracked project whose cursor starts at `cursor`.
    pub fn new(id: ProjectId, title: impl Into<String>, cursor: Option<VersionId>) -> Self {
        Self {
            id,
            title: title.into(),
            last_checked_version_id: cursor,
            cursor_published_at: None,
            last_checked_at: None,
        }
    }

    /// A tracked project whose cursor starts at `cursor`, if any.
    pub fn at_version(id: ProjectId, title: impl Into<String>, cursor: Option<&Version>) -> Self {
        Self {
            cursor_published_at: cursor.map(|v| v.date_published),
            ..Self::new(id, title, cursor.map(|v| v.id.clone()))
        }
    }

    /// Point in time a lost cursor is compared against.
    ///
    /// The cursor version's publish time when known, else the time the
    /// cursor last moved.
    pub fn cursor_basis(&self) -> Option<DateTime<Utc>> {
        self.cursor_published_at.or(self.last_checked_at)
    }

    /// Whether moving the cursor to `version` keeps it monotonic.
    ///
    /// Re-writing the current cursor is accepted.
    pub fn accepts_cursor(&self, version: &Version) -> bool {
        match (&self.last_checked_version_id, self.cursor_published_at) {
            (Some(current), Some(published)) => {
                &version.id == current || version.is_newer_than(published, current)
            }
            _ => true,
        }
    }

    /// Move the cursor to `version`, stamping `checked_at`.
    pub fn advance_to(&mut self, version: &Version, checked_at: DateTime<Utc>) {
        self.last_checked_version_id = Some(version.id.clone());
        self.cursor_published_at = Some(version.date_published);
        self.last_checked_at = Some(checked_at);
    }
}
