//! Catalog lookup cache with per-namespace expiry.

use crate::TtlCache;
use derive_getters::Getters;
use modwatch_core::{ProjectId, ProjectMetadata, TeamMember};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Kind of data a cache key refers to. Each namespace has its own TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Namespace {
    /// Project metadata, keyed by project id.
    Project,
    /// Team membership, keyed by team id.
    Team,
    /// Catalog taxonomy (loader list, ...), keyed by taxonomy name.
    Taxonomy,
}

/// Typed cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Namespace of the entry
    pub namespace: Namespace,
    /// Id within the namespace
    pub id: String,
}

impl CacheKey {
    /// Key for a value in `namespace`.
    pub fn new(namespace: Namespace, id: impl Into<String>) -> Self {
        Self {
            namespace,
            id: id.into(),
        }
    }
}

/// Cached value; the variant always matches the key's namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    /// Project metadata
    Project(Box<ProjectMetadata>),
    /// Team members
    Team(Vec<TeamMember>),
    /// Taxonomy entries
    Taxonomy(Vec<String>),
}

/// Expiry policy per namespace.
#[derive(
    Debug, Clone, Serialize, Deserialize, Getters, derive_setters::Setters, derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct CachePolicy {
    /// TTL for project metadata (seconds)
    #[serde(default = "default_project_ttl")]
    #[builder(default = "default_project_ttl()")]
    project_ttl_secs: u64,

    /// TTL for team membership (seconds)
    #[serde(default = "default_team_ttl")]
    #[builder(default = "default_team_ttl()")]
    team_ttl_secs: u64,

    /// TTL for taxonomy data (seconds)
    #[serde(default = "default_taxonomy_ttl")]
    #[builder(default = "default_taxonomy_ttl()")]
    taxonomy_ttl_secs: u64,

    /// Maximum cache size (number of entries)
    #[serde(default = "default_max_size")]
    #[builder(default = "default_max_size()")]
    max_size: usize,

    /// Whether caching is enabled
    #[serde(default = "default_enabled")]
    #[builder(default = "default_enabled()")]
    enabled: bool,
}

fn default_project_ttl() -> u64 {
    15 * 60
}

fn default_team_ttl() -> u64 {
    30 * 60
}

fn default_taxonomy_ttl() -> u64 {
    6 * 60 * 60
}

fn default_max_size() -> usize {
    5000
}

fn default_enabled() -> bool {
    true
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            project_ttl_secs: default_project_ttl(),
            team_ttl_secs: default_team_ttl(),
            taxonomy_ttl_secs: default_taxonomy_ttl(),
            max_size: default_max_size(),
            enabled: default_enabled(),
        }
    }
}

impl CachePolicy {
    /// TTL applied to entries in `namespace`.
    pub fn ttl(&self, namespace: Namespace) -> Duration {
        let secs = match namespace {
            Namespace::Project => self.project_ttl_secs,
            Namespace::Team => self.team_ttl_secs,
            Namespace::Taxonomy => self.taxonomy_ttl_secs,
        };
        Duration::from_secs(secs)
    }
}

const LOADERS_KEY: &str = "loaders";

/// Shared cache of catalog lookups.
///
/// All methods take `&self`; the cache is meant to be shared behind an `Arc`
/// between the detection cycle (which only writes) and interactive lookups
/// (which read through it).
///
/// # Example
///
/// ```
/// use modwatch_cache::{CachePolicy, CatalogCache};
///
/// let cache = CatalogCache::new(CachePolicy::default());
/// cache.insert_loaders(vec!["fabric".to_string(), "forge".to_string()]);
/// assert_eq!(cache.loaders().map(|l| l.len()), Some(2));
/// ```
#[derive(Debug)]
pub struct CatalogCache {
    policy: CachePolicy,
    entries: Mutex<TtlCache<CacheKey, CacheValue>>,
}

impl CatalogCache {
    /// Create a new cache with the given expiry policy.
    pub fn new(policy: CachePolicy) -> Self {
        tracing::debug!(
            project_ttl = policy.project_ttl_secs,
            team_ttl = policy.team_ttl_secs,
            taxonomy_ttl = policy.taxonomy_ttl_secs,
            max_size = policy.max_size,
            enabled = policy.enabled,
            "Creating new CatalogCache"
        );
        let entries = Mutex::new(TtlCache::new(policy.max_size));
        Self { policy, entries }
    }

    /// The expiry policy in force.
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Look up a raw entry.
    #[tracing::instrument(skip(self), fields(namespace = %key.namespace, id = %key.id))]
    pub fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        if !self.policy.enabled {
            return None;
        }
        let hit = self.entries.lock().get(key);
        tracing::debug!(hit = hit.is_some(), "Cache lookup");
        hit
    }

    /// Store a raw entry using the namespace TTL.
    pub fn insert(&self, key: CacheKey, value: CacheValue) {
        if !self.policy.enabled {
            tracing::debug!("Cache disabled, skipping insert");
            return;
        }
        let ttl = self.policy.ttl(key.namespace);
        self.entries.lock().insert(key, value, ttl);
    }

    /// Cached project metadata.
    pub fn project(&self, id: &ProjectId) -> Option<ProjectMetadata> {
        match self.get(&CacheKey::new(Namespace::Project, id.as_str()))? {
            CacheValue::Project(project) => Some(*project),
            _ => None,
        }
    }

    /// Cache project metadata under its id and its slug.
    pub fn insert_project(&self, project: ProjectMetadata) {
        if project.slug != project.id.as_str() {
            self.insert(
                CacheKey::new(Namespace::Project, project.slug.clone()),
                CacheValue::Project(Box::new(project.clone())),
            );
        }
        self.insert(
            CacheKey::new(Namespace::Project, project.id.as_str()),
            CacheValue::Project(Box::new(project)),
        );
    }

    /// Cached team members.
    pub fn team_members(&self, team_id: &str) -> Option<Vec<TeamMember>> {
        match self.get(&CacheKey::new(Namespace::Team, team_id))? {
            CacheValue::Team(members) => Some(members),
            _ => None,
        }
    }

    /// Cache team members.
    pub fn insert_team_members(&self, team_id: &str, members: Vec<TeamMember>) {
        self.insert(CacheKey::new(Namespace::Team, team_id), CacheValue::Team(members));
    }

    /// Cached loader taxonomy.
    pub fn loaders(&self) -> Option<Vec<String>> {
        match self.get(&CacheKey::new(Namespace::Taxonomy, LOADERS_KEY))? {
            CacheValue::Taxonomy(loaders) => Some(loaders),
            _ => None,
        }
    }

    /// Cache the loader taxonomy.
    pub fn insert_loaders(&self, loaders: Vec<String>) {
        self.insert(
            CacheKey::new(Namespace::Taxonomy, LOADERS_KEY),
            CacheValue::Taxonomy(loaders),
        );
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let removed = self.entries.lock().purge_expired();
        if removed > 0 {
            tracing::info!(removed, "Purged expired cache entries");
        }
        removed
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}
