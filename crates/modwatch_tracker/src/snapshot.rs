//! Read-only view of everything fetched for one cycle.

use chrono::{DateTime, Utc};
use modwatch_catalog::FetchedCatalog;
use modwatch_core::{ProjectId, ProjectMetadata, Version};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Catalog state captured once after the fetch phase.
///
/// Built before any diffing starts and shared by every project task; nothing
/// mutates it afterwards.
#[derive(Debug, Clone, Default)]
pub struct CycleSnapshot {
    projects: HashMap<ProjectId, Arc<ProjectMetadata>>,
    versions: HashMap<ProjectId, Vec<Version>>,
    incomplete: BTreeSet<ProjectId>,
    fetched_at: DateTime<Utc>,
}

impl CycleSnapshot {
    /// Freeze a fetch result.
    pub fn new(fetched: FetchedCatalog) -> Self {
        Self {
            projects: fetched
                .projects
                .into_iter()
                .map(|(id, project)| (id, Arc::new(project)))
                .collect(),
            versions: fetched.versions,
            incomplete: fetched.incomplete,
            fetched_at: Utc::now(),
        }
    }

    /// Metadata of a project, if the catalog returned it.
    pub fn project(&self, id: &ProjectId) -> Option<&Arc<ProjectMetadata>> {
        self.projects.get(id)
    }

    /// Versions of a project; empty when none were fetched.
    pub fn versions(&self, id: &ProjectId) -> &[Version] {
        self.versions.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether the project was held back because versions were missing.
    pub fn is_incomplete(&self, id: &ProjectId) -> bool {
        self.incomplete.contains(id)
    }

    /// Every project in the snapshot.
    pub fn projects(&self) -> impl Iterator<Item = &ProjectMetadata> {
        self.projects.values().map(Arc::as_ref)
    }

    /// Number of projects the catalog returned.
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// When the fetch phase finished.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}
