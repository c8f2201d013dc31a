//! Published versions of a project.

use crate::{ProjectId, ReleaseType, VersionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A file attached to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFile {
    /// Download URL
    pub url: String,
    /// File name as uploaded
    pub filename: String,
    /// Whether this is the version's main artifact
    pub primary: bool,
    /// Size in bytes
    pub size: u64,
}

/// An immutable, timestamped release of a project.
///
/// # Examples
///
/// ```
/// use modwatch_core::{ReleaseType, Version};
/// use chrono::Utc;
///
/// let version = Version::new("IZskON6d", "AANobbMI", "0.5.8", ReleaseType::Release, Utc::now())
///     .with_loaders(["fabric", "quilt"]);
/// assert!(version.has_any_loader(["fabric"]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Version id
    pub id: VersionId,
    /// Owning project
    pub project_id: ProjectId,
    /// Display name
    pub name: String,
    /// Version number as published (e.g. "1.2.0+1.20.1")
    pub version_number: String,
    /// Markdown changelog
    pub changelog: Option<String>,
    /// Publish timestamp
    pub date_published: DateTime<Utc>,
    /// Release classification
    pub version_type: ReleaseType,
    /// Loader / platform tags
    pub loaders: Vec<String>,
    /// Supported game versions
    pub game_versions: Vec<String>,
    /// File manifest
    pub files: Vec<VersionFile>,
}

impl Version {
    /// Create a version with the required fields; the rest start empty.
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        version_number: impl Into<String>,
        version_type: ReleaseType,
        date_published: DateTime<Utc>,
    ) -> Self {
        let version_number = version_number.into();
        Self {
            id: VersionId::new(id),
            project_id: ProjectId::new(project_id),
            name: version_number.clone(),
            version_number,
            changelog: None,
            date_published,
            version_type,
            loaders: Vec::new(),
            game_versions: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Replace the loader tags.
    pub fn with_loaders<I, S>(mut self, loaders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.loaders = loaders.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the changelog.
    pub fn with_changelog(mut self, changelog: impl Into<String>) -> Self {
        self.changelog = Some(changelog.into());
        self
    }

    /// Whether any loader tag matches one of `wanted` (case-insensitive).
    pub fn has_any_loader<I, S>(&self, wanted: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        wanted.into_iter().any(|w| {
            self.loaders
                .iter()
                .any(|l| l.eq_ignore_ascii_case(w.as_ref()))
        })
    }

    /// Whether this version sorts after one published at `published` with id `id`.
    ///
    /// Agrees with [`newest_first`]: later publish time wins, ties go to the
    /// larger id.
    pub fn is_newer_than(&self, published: DateTime<Utc>, id: &VersionId) -> bool {
        (self.date_published, &self.id) > (published, id)
    }

    /// The primary file, or the first file when none is flagged primary.
    pub fn primary_file(&self) -> Option<&VersionFile> {
        self.files
            .iter()
            .find(|f| f.primary)
            .or_else(|| self.files.first())
    }
}

/// Ordering that puts the most recently published version first.
///
/// Ties on the timestamp fall back to the id so the order is total.
pub fn newest_first(a: &Version, b: &Version) -> Ordering {
    b.date_published
        .cmp(&a.date_published)
        .then_with(|| b.id.cmp(&a.id))
}
