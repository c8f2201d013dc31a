//! Chronological diffing of a project's versions against its cursor.

use modwatch_core::{TrackedProject, Version, newest_first};

/// What changed for one project since its cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// The catalog lists no versions; nothing to compare or anchor.
    NoVersions,
    /// The cursor already names the newest version.
    Unchanged,
    /// The project has no cursor yet; anchor it without notifying.
    Anchor {
        /// Newest observed version
        cursor: Version,
    },
    /// The cursor version is gone upstream and nothing newer than it exists.
    ///
    /// The cursor stays where it is.
    CursorMissing,
    /// The cursor version is gone and there is no time to compare against.
    ///
    /// Nothing is reported as new; the cursor is re-anchored on `newest`.
    CursorLost {
        /// Newest observed version, the new anchor
        newest: Version,
    },
    /// Versions newer than the cursor exist.
    Updated {
        /// New versions, oldest first
        new_versions: Vec<Version>,
        /// The newest new version
        cursor: Version,
    },
}

impl Detection {
    /// The version this detection moves the cursor to, if any.
    pub fn next_cursor(&self) -> Option<&Version> {
        match self {
            Self::NoVersions | Self::Unchanged | Self::CursorMissing => None,
            Self::Anchor { cursor } | Self::Updated { cursor, .. } => Some(cursor),
            Self::CursorLost { newest } => Some(newest),
        }
    }

    /// Versions to notify about, oldest first.
    pub fn new_versions(&self) -> &[Version] {
        match self {
            Self::Updated { new_versions, .. } => new_versions,
            _ => &[],
        }
    }
}

/// Compare `versions` against the project's cursor.
///
/// Versions are ordered newest first by publish date (ties broken by id) and
/// collected until the cursor version is reached; that version and older
/// ones are excluded. The returned list is oldest first.
///
/// If the cursor version is no longer listed, versions sorting after the
/// project's [`cursor_basis`](TrackedProject::cursor_basis) are new. The
/// cursor never moves to an older version.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use modwatch_core::{ProjectId, ReleaseType, TrackedProject, Version, VersionId};
/// use modwatch_tracker::{Detection, detect};
///
/// let t0 = Utc::now();
/// let versions = vec![
///     Version::new("v0", "p", "1.0", ReleaseType::Release, t0),
///     Version::new("v1", "p", "1.1", ReleaseType::Release, t0 + Duration::hours(1)),
/// ];
/// let project = TrackedProject::new(ProjectId::new("p"), "P", Some(VersionId::new("v0")));
///
/// let detection = detect(&project, &versions);
/// assert_eq!(detection.next_cursor().map(|v| &v.id), Some(&VersionId::new("v1")));
/// assert_eq!(detection.new_versions().len(), 1);
/// ```
pub fn detect(project: &TrackedProject, versions: &[Version]) -> Detection {
    let mut ordered: Vec<&Version> = versions.iter().collect();
    ordered.sort_by(|a, b| newest_first(a, b));
    ordered.dedup_by(|a, b| a.id == b.id);

    let Some(newest) = ordered.first() else {
        return Detection::NoVersions;
    };

    let Some(cursor) = &project.last_checked_version_id else {
        return Detection::Anchor {
            cursor: (*newest).clone(),
        };
    };

    let position = match ordered.iter().position(|v| &v.id == cursor) {
        Some(0) => return Detection::Unchanged,
        Some(position) => position,
        None => {
            let Some(basis) = project.cursor_basis() else {
                return Detection::CursorLost {
                    newest: (*newest).clone(),
                };
            };
            match ordered
                .iter()
                .take_while(|v| v.is_newer_than(basis, cursor))
                .count()
            {
                0 => return Detection::CursorMissing,
                newer => newer,
            }
        }
    };

    let new_versions: Vec<Version> = ordered[..position]
        .iter()
        .rev()
        .map(|v| (*v).clone())
        .collect();
    Detection::Updated {
        cursor: (*newest).clone(),
        new_versions,
    }
}
