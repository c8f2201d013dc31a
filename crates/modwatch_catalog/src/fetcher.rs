//! Bounded-size batch fetching of projects and versions.

use modwatch_core::{ProjectId, ProjectMetadata, Version, VersionId};
use modwatch_error::CatalogResult;
use modwatch_interface::CatalogClient;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Everything fetched for one detection cycle.
#[derive(Debug, Clone, Default)]
pub struct FetchedCatalog {
    /// Metadata of every project the catalog knows about
    pub projects: HashMap<ProjectId, ProjectMetadata>,
    /// Versions of each fetched project, in no particular order
    pub versions: HashMap<ProjectId, Vec<Version>>,
    /// Projects held back because some listed versions were not returned
    pub incomplete: BTreeSet<ProjectId>,
}

/// Pulls catalog data in chunks of at most `batch_size` ids.
///
/// Inputs are deduplicated first and chunks never split an id, so fetching
/// `n` distinct ids issues exactly `ceil(n / batch_size)` upstream calls.
/// Any failed chunk fails the whole fetch; callers never see partial
/// version data.
///
/// # Example
///
/// ```no_run
/// use modwatch_catalog::{BatchFetcher, CatalogConfig, ModrinthClient};
/// use modwatch_core::ProjectId;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Arc::new(ModrinthClient::new(&CatalogConfig::default())?);
/// let fetcher = BatchFetcher::new(client, 500);
/// let fetched = fetcher.fetch_all([ProjectId::new("AANobbMI")]).await?;
/// println!("{} projects", fetched.projects.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BatchFetcher {
    client: Arc<dyn CatalogClient>,
    batch_size: usize,
}

impl BatchFetcher {
    /// Create a fetcher issuing chunks of at most `batch_size` ids.
    pub fn new(client: Arc<dyn CatalogClient>, batch_size: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
        }
    }

    /// Chunk size in use.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Fetch project metadata keyed by id.
    ///
    /// Projects the catalog does not return are absent from the map; that
    /// means "unknown right now", not "deleted".
    #[instrument(skip_all, fields(batch_size = self.batch_size))]
    pub async fn fetch_projects<I>(&self, ids: I) -> CatalogResult<HashMap<ProjectId, ProjectMetadata>>
    where
        I: IntoIterator<Item = ProjectId>,
    {
        let ids: Vec<ProjectId> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let mut projects = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(self.batch_size) {
            debug!(chunk_len = chunk.len(), "Fetching project chunk");
            for project in self.client.get_projects(chunk).await? {
                projects.insert(project.id.clone(), project);
            }
        }

        debug!(requested = ids.len(), returned = projects.len(), "Fetched projects");
        Ok(projects)
    }

    /// Fetch versions by id, concatenating all chunks.
    ///
    /// Each version appears at most once in the result.
    #[instrument(skip_all, fields(batch_size = self.batch_size))]
    pub async fn fetch_versions<I>(&self, ids: I) -> CatalogResult<Vec<Version>>
    where
        I: IntoIterator<Item = VersionId>,
    {
        let ids: Vec<VersionId> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let mut seen = HashSet::with_capacity(ids.len());
        let mut versions = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(self.batch_size) {
            debug!(chunk_len = chunk.len(), "Fetching version chunk");
            for version in self.client.get_versions(chunk).await? {
                if seen.insert(version.id.clone()) {
                    versions.push(version);
                }
            }
        }

        debug!(requested = ids.len(), returned = versions.len(), "Fetched versions");
        Ok(versions)
    }

    /// Fetch metadata and all versions for a set of tracked projects.
    ///
    /// Versions are grouped by their owning project; versions of projects
    /// that were not requested are discarded. A project whose listed
    /// versions did not all come back is moved to
    /// [`incomplete`](FetchedCatalog::incomplete) instead.
    #[instrument(skip_all)]
    pub async fn fetch_all<I>(&self, ids: I) -> CatalogResult<FetchedCatalog>
    where
        I: IntoIterator<Item = ProjectId>,
    {
        let mut projects = self.fetch_projects(ids).await?;
        let version_ids = projects
            .values()
            .flat_map(|p| p.version_ids.iter().cloned());
        let fetched_versions = self.fetch_versions(version_ids).await?;

        let mut versions: HashMap<ProjectId, Vec<Version>> = HashMap::with_capacity(projects.len());
        for version in fetched_versions {
            if projects.contains_key(&version.project_id) {
                versions
                    .entry(version.project_id.clone())
                    .or_default()
                    .push(version);
            }
        }

        let mut incomplete = BTreeSet::new();
        projects.retain(|id, project| {
            let returned: HashSet<&VersionId> = versions
                .get(id)
                .into_iter()
                .flatten()
                .map(|v| &v.id)
                .collect();
            let missing: Vec<&VersionId> = project
                .version_ids
                .iter()
                .filter(|v| !returned.contains(v))
                .collect();
            if missing.is_empty() {
                return true;
            }
            warn!(
                project_id = %id,
                missing = ?missing,
                "Catalog omitted listed versions, skipping project this cycle"
            );
            incomplete.insert(id.clone());
            false
        });
        for id in &incomplete {
            versions.remove(id);
        }

        info!(
            projects = projects.len(),
            incomplete = incomplete.len(),
            versions = versions.values().map(Vec::len).sum::<usize>(),
            "Fetched catalog snapshot"
        );
        Ok(FetchedCatalog {
            projects,
            versions,
            incomplete,
        })
    }
}

impl std::fmt::Debug for BatchFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchFetcher")
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}
