use async_trait::async_trait;
use chrono::Utc;
use modwatch_cache::{CachePolicy, CatalogCache};
use modwatch_catalog::CachedCatalog;
use modwatch_core::{ProjectId, ProjectMetadata, TeamMember, Version, VersionId};
use modwatch_error::{CatalogError, CatalogErrorKind, CatalogResult};
use modwatch_interface::CatalogClient;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct CountingCatalog {
    project_calls: AtomicUsize,
    team_calls: AtomicUsize,
    loader_calls: AtomicUsize,
}

fn sodium() -> ProjectMetadata {
    ProjectMetadata {
        id: ProjectId::new("AANobbMI"),
        slug: "sodium".to_string(),
        title: "Sodium".to_string(),
        description: "Rendering engine".to_string(),
        icon_url: None,
        team_id: "team-1".to_string(),
        project_type: "mod".to_string(),
        version_ids: vec![VersionId::new("v1")],
        updated: Utc::now(),
    }
}

#[async_trait]
impl CatalogClient for CountingCatalog {
    async fn get_projects(&self, _ids: &[ProjectId]) -> CatalogResult<Vec<ProjectMetadata>> {
        Ok(vec![])
    }

    async fn get_versions(&self, _ids: &[VersionId]) -> CatalogResult<Vec<Version>> {
        Ok(vec![])
    }

    async fn get_project_versions(&self, _id: &ProjectId) -> CatalogResult<Vec<Version>> {
        Ok(vec![])
    }

    async fn get_project(&self, id: &ProjectId) -> CatalogResult<ProjectMetadata> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        if id.as_str() == "AANobbMI" || id.as_str() == "sodium" {
            Ok(sodium())
        } else {
            Err(CatalogError::new(CatalogErrorKind::NotFound(id.to_string())))
        }
    }

    async fn get_team_members(&self, team_id: &str) -> CatalogResult<Vec<TeamMember>> {
        self.team_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![TeamMember {
            team_id: team_id.to_string(),
            username: "jellysquid".to_string(),
            role: "Owner".to_string(),
        }])
    }

    async fn get_loaders(&self) -> CatalogResult<Vec<String>> {
        self.loader_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec!["fabric".to_string(), "forge".to_string()])
    }
}

fn setup() -> (Arc<CountingCatalog>, CachedCatalog) {
    let client = Arc::new(CountingCatalog::default());
    let cache = Arc::new(CatalogCache::new(CachePolicy::default()));
    let catalog = CachedCatalog::new(client.clone(), cache);
    (client, catalog)
}

#[tokio::test]
async fn test_project_lookup_reads_through_once() {
    let (client, catalog) = setup();

    let first = catalog.project(&ProjectId::new("AANobbMI")).await.unwrap();
    let second = catalog.project(&ProjectId::new("AANobbMI")).await.unwrap();
    let by_slug = catalog.project(&ProjectId::new("sodium")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(by_slug.id, first.id);
    assert_eq!(client.project_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_not_found_is_not_cached() {
    let (client, catalog) = setup();

    let err = catalog.project(&ProjectId::new("missing")).await.unwrap_err();
    assert!(err.is_not_found());
    let _ = catalog.project(&ProjectId::new("missing")).await;

    assert_eq!(client.project_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_remembered_projects_skip_upstream() {
    let (client, catalog) = setup();

    catalog.remember_projects([&sodium()]);
    let project = catalog.project(&ProjectId::new("sodium")).await.unwrap();

    assert_eq!(project.title, "Sodium");
    assert_eq!(client.project_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_team_and_taxonomy_cached() {
    let (client, catalog) = setup();

    for _ in 0..3 {
        assert_eq!(catalog.team_members("team-1").await.unwrap().len(), 1);
        assert_eq!(catalog.loaders().await.unwrap().len(), 2);
    }

    assert_eq!(client.team_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.loader_calls.load(Ordering::SeqCst), 1);
}
