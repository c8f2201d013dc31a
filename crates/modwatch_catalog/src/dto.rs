//! Wire types of the Modrinth v2 API.

use chrono::{DateTime, Utc};
use modwatch_core::{
    ProjectId, ProjectMetadata, ReleaseType, TeamMember, Version, VersionFile, VersionId,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ModrinthProject {
    id: String,
    slug: String,
    title: String,
    #[serde(default)]
    description: String,
    icon_url: Option<String>,
    team: String,
    project_type: String,
    #[serde(default)]
    versions: Vec<String>,
    updated: DateTime<Utc>,
}

impl From<ModrinthProject> for ProjectMetadata {
    fn from(p: ModrinthProject) -> Self {
        Self {
            id: ProjectId(p.id),
            slug: p.slug,
            title: p.title,
            description: p.description,
            icon_url: p.icon_url,
            team_id: p.team,
            project_type: p.project_type,
            version_ids: p.versions.into_iter().map(VersionId).collect(),
            updated: p.updated,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModrinthFile {
    url: String,
    filename: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModrinthVersion {
    id: String,
    project_id: String,
    name: String,
    version_number: String,
    changelog: Option<String>,
    date_published: DateTime<Utc>,
    version_type: String,
    #[serde(default)]
    loaders: Vec<String>,
    #[serde(default)]
    game_versions: Vec<String>,
    #[serde(default)]
    files: Vec<ModrinthFile>,
}

impl From<ModrinthVersion> for Version {
    fn from(v: ModrinthVersion) -> Self {
        let version_type = v.version_type.parse().unwrap_or_else(|_| {
            tracing::debug!(version_type = %v.version_type, "Unknown version type, treating as release");
            ReleaseType::Release
        });
        Self {
            id: VersionId(v.id),
            project_id: ProjectId(v.project_id),
            name: v.name,
            version_number: v.version_number,
            changelog: v.changelog.filter(|c| !c.trim().is_empty()),
            date_published: v.date_published,
            version_type,
            loaders: v.loaders,
            game_versions: v.game_versions,
            files: v
                .files
                .into_iter()
                .map(|f| VersionFile {
                    url: f.url,
                    filename: f.filename,
                    primary: f.primary,
                    size: f.size,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModrinthUser {
    username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModrinthTeamMember {
    team_id: String,
    user: ModrinthUser,
    role: String,
}

impl From<ModrinthTeamMember> for TeamMember {
    fn from(m: ModrinthTeamMember) -> Self {
        Self {
            team_id: m.team_id,
            username: m.user.username,
            role: m.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModrinthLoader {
    pub(crate) name: String,
}
