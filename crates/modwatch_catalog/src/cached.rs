//! Read-through catalog access for interactive lookups.

use modwatch_cache::CatalogCache;
use modwatch_core::{ProjectId, ProjectMetadata, TeamMember, Version};
use modwatch_error::CatalogResult;
use modwatch_interface::CatalogClient;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Catalog lookups that try the cache before going upstream.
///
/// The detection cycle does not read through this type (it always wants
/// fresh data); it only feeds the cache with [`remember_projects`](Self::remember_projects).
#[derive(Clone)]
pub struct CachedCatalog {
    client: Arc<dyn CatalogClient>,
    cache: Arc<CatalogCache>,
}

impl CachedCatalog {
    /// Wrap a client and a shared cache.
    pub fn new(client: Arc<dyn CatalogClient>, cache: Arc<CatalogCache>) -> Self {
        Self { client, cache }
    }

    /// The underlying client, for uncached calls.
    pub fn client(&self) -> &Arc<dyn CatalogClient> {
        &self.client
    }

    /// The shared cache.
    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    /// Project metadata by id or slug.
    #[instrument(skip(self), fields(project_id = %id))]
    pub async fn project(&self, id: &ProjectId) -> CatalogResult<ProjectMetadata> {
        if let Some(project) = self.cache.project(id) {
            debug!("Project served from cache");
            return Ok(project);
        }
        let project = self.client.get_project(id).await?;
        self.cache.insert_project(project.clone());
        Ok(project)
    }

    /// Every version of a project. Never cached.
    pub async fn project_versions(&self, id: &ProjectId) -> CatalogResult<Vec<Version>> {
        self.client.get_project_versions(id).await
    }

    /// Members of a project team.
    #[instrument(skip(self))]
    pub async fn team_members(&self, team_id: &str) -> CatalogResult<Vec<TeamMember>> {
        if let Some(members) = self.cache.team_members(team_id) {
            debug!("Team served from cache");
            return Ok(members);
        }
        let members = self.client.get_team_members(team_id).await?;
        self.cache.insert_team_members(team_id, members.clone());
        Ok(members)
    }

    /// The catalog's loader taxonomy.
    #[instrument(skip(self))]
    pub async fn loaders(&self) -> CatalogResult<Vec<String>> {
        if let Some(loaders) = self.cache.loaders() {
            return Ok(loaders);
        }
        let loaders = self.client.get_loaders().await?;
        self.cache.insert_loaders(loaders.clone());
        Ok(loaders)
    }

    /// Store freshly fetched project metadata for later interactive lookups.
    pub fn remember_projects<'a>(&self, projects: impl IntoIterator<Item = &'a ProjectMetadata>) {
        for project in projects {
            self.cache.insert_project(project.clone());
        }
    }
}
