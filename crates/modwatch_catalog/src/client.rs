//! Modrinth v2 HTTP client.

use crate::CatalogConfig;
use crate::dto::{ModrinthLoader, ModrinthProject, ModrinthTeamMember, ModrinthVersion};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use modwatch_core::{ProjectId, ProjectMetadata, TeamMember, Version, VersionId};
use modwatch_error::{CatalogError, CatalogErrorKind, CatalogResult};
use modwatch_interface::CatalogClient;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, instrument, warn};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Catalog client for the Modrinth v2 API.
///
/// Every request waits for the GCRA limiter configured from
/// `requests_per_minute`. Transport failures, 429s and 5xx responses are
/// retried with jittered exponential backoff; a 404 becomes
/// [`CatalogErrorKind::NotFound`] and is returned at once.
#[derive(Debug, Clone)]
pub struct ModrinthClient {
    client: Client,
    base_url: String,
    max_retries: usize,
    limiter: Arc<DirectRateLimiter>,
}

impl ModrinthClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    #[instrument(skip_all, fields(base_url = %config.base_url()))]
    pub fn new(config: &CatalogConfig) -> CatalogResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .timeout(Duration::from_secs(*config.timeout_secs()))
            .gzip(true)
            .build()
            .map_err(|e| CatalogError::new(CatalogErrorKind::Transport(e.to_string())))?;

        let per_minute = NonZeroU32::new(*config.requests_per_minute()).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        debug!(
            requests_per_minute = per_minute.get(),
            max_retries = config.max_retries(),
            "Created Modrinth client"
        );

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            max_retries: *config.max_retries(),
            limiter,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> CatalogResult<T> {
        let strategy = ExponentialBackoff::from_millis(500)
            .factor(2)
            .max_delay(Duration::from_secs(30))
            .map(jitter)
            .take(self.max_retries);

        Retry::spawn(strategy, || async {
            self.limiter.until_ready().await;
            match self.send_once(path, query).await {
                Ok(value) => Ok(value),
                Err(e) if e.is_transient() => {
                    warn!(path, error = %e.kind, "Transient catalog error, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => Err(RetryError::Permanent(e)),
            }
        })
        .await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> CatalogResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Sending catalog request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| CatalogError::new(CatalogErrorKind::Transport(e.to_string())))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::new(CatalogErrorKind::NotFound(path.to_string())));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CatalogError::new(CatalogErrorKind::RateLimited));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::new(CatalogErrorKind::Status {
                status: status.as_u16(),
                message,
            }));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::new(CatalogErrorKind::Decode(e.to_string())))
    }

    fn ids_param<'a>(ids: impl Iterator<Item = &'a str>) -> CatalogResult<String> {
        let ids: Vec<&str> = ids.collect();
        serde_json::to_string(&ids)
            .map_err(|e| CatalogError::new(CatalogErrorKind::Decode(e.to_string())))
    }
}

#[async_trait]
impl CatalogClient for ModrinthClient {
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_projects(&self, ids: &[ProjectId]) -> CatalogResult<Vec<ProjectMetadata>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let param = Self::ids_param(ids.iter().map(ProjectId::as_str))?;
        let projects: Vec<ModrinthProject> = self.get_json("/projects", &[("ids", param)]).await?;
        Ok(projects.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_versions(&self, ids: &[VersionId]) -> CatalogResult<Vec<Version>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let param = Self::ids_param(ids.iter().map(VersionId::as_str))?;
        let versions: Vec<ModrinthVersion> = self.get_json("/versions", &[("ids", param)]).await?;
        Ok(versions.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(project_id = %id))]
    async fn get_project_versions(&self, id: &ProjectId) -> CatalogResult<Vec<Version>> {
        let versions: Vec<ModrinthVersion> = self
            .get_json(&format!("/project/{}/version", id), &[])
            .await?;
        Ok(versions.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(project_id = %id))]
    async fn get_project(&self, id: &ProjectId) -> CatalogResult<ProjectMetadata> {
        let project: ModrinthProject = self.get_json(&format!("/project/{}", id), &[]).await?;
        Ok(project.into())
    }

    #[instrument(skip(self))]
    async fn get_team_members(&self, team_id: &str) -> CatalogResult<Vec<TeamMember>> {
        let members: Vec<ModrinthTeamMember> = self
            .get_json(&format!("/team/{}/members", team_id), &[])
            .await?;
        Ok(members.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn get_loaders(&self) -> CatalogResult<Vec<String>> {
        let loaders: Vec<ModrinthLoader> = self.get_json("/tag/loader", &[]).await?;
        Ok(loaders.into_iter().map(|l| l.name).collect())
    }
}
