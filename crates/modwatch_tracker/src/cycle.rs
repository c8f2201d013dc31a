//! One detect-and-notify pass over every tracked project.

use crate::{
    CycleReport, CycleSnapshot, Detection, DispatchSummary, JobQueue, NotificationDispatcher,
    NotificationJob, detect,
};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use modwatch_catalog::{BatchFetcher, CachedCatalog};
use modwatch_core::{TrackedProject, Version};
use modwatch_error::ModwatchResult;
use modwatch_interface::TrackerStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// How a single project fared within a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ProjectOutcome {
    Deferred,
    Missing,
    Incomplete,
    Unchanged,
    Anchored,
    SkippedStoreFailure,
    /// `None` when delivery was queued.
    Updated(Option<DispatchSummary>),
    /// `None` when the notice was queued.
    Resynced(Option<DispatchSummary>),
}

/// Where new-version notifications go once a cursor has moved.
#[derive(Debug, Clone, Default)]
pub enum DispatchSink {
    /// Deliver from the cycle task.
    #[default]
    Inline,
    /// Hand a job to the delivery worker.
    Queued(JobQueue),
}

/// A detection cycle and its collaborators.
///
/// Each run lists tracked projects, fetches all metadata and versions in
/// batches, freezes them into a [`CycleSnapshot`], then diffs projects
/// concurrently. A cursor is written before its project's notifications are
/// handed off; if the write fails the project is skipped until next cycle.
#[derive(Clone)]
pub struct DetectionCycle {
    fetcher: BatchFetcher,
    store: Arc<dyn TrackerStore>,
    dispatcher: NotificationDispatcher,
    catalog: Option<CachedCatalog>,
    sink: DispatchSink,
    max_concurrent_projects: usize,
    deadline: Option<Duration>,
}

impl DetectionCycle {
    /// Create a cycle delivering inline, one project at a time.
    pub fn new(
        fetcher: BatchFetcher,
        store: Arc<dyn TrackerStore>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            fetcher,
            store,
            dispatcher,
            catalog: None,
            sink: DispatchSink::Inline,
            max_concurrent_projects: 1,
            deadline: None,
        }
    }

    /// Populate this read-through catalog's cache with fetched projects.
    pub fn with_cache(mut self, catalog: CachedCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Choose inline or queued delivery.
    pub fn with_sink(mut self, sink: DispatchSink) -> Self {
        self.sink = sink;
        self
    }

    /// Process up to `limit` projects at once after fetching.
    pub fn with_max_concurrent_projects(mut self, limit: usize) -> Self {
        self.max_concurrent_projects = limit.max(1);
        self
    }

    /// Defer projects not started within `deadline` of the cycle start.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Run one cycle.
    ///
    /// # Errors
    ///
    /// Fails without moving any cursor if the tracked projects cannot be
    /// listed or the catalog fetch fails. Per-project failures are counted
    /// in the report instead.
    #[instrument(skip(self))]
    pub async fn run(&self) -> ModwatchResult<CycleReport> {
        let started = Instant::now();
        let deadline = self.deadline.map(|d| started + d);

        let tracked = self.store.list_tracked_projects().await?;
        debug!(projects = tracked.len(), "Listed tracked projects");

        let fetched = self
            .fetcher
            .fetch_all(tracked.iter().map(|p| p.id.clone()))
            .await
            .inspect_err(|e| warn!(error = %e, "Catalog fetch failed, aborting cycle"))?;

        let snapshot = CycleSnapshot::new(fetched);
        if let Some(catalog) = &self.catalog {
            catalog.remember_projects(snapshot.projects());
        }

        let mut report = CycleReport {
            projects_tracked: tracked.len(),
            projects_fetched: snapshot.project_count(),
            ..CycleReport::default()
        };

        let outcomes: Vec<ProjectOutcome> = stream::iter(tracked)
            .map(|project| self.process_project(&snapshot, project, deadline))
            .buffer_unordered(self.max_concurrent_projects)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                ProjectOutcome::Deferred => report.projects_deferred += 1,
                ProjectOutcome::Missing => report.projects_missing += 1,
                ProjectOutcome::Incomplete => report.projects_incomplete += 1,
                ProjectOutcome::Unchanged => {}
                ProjectOutcome::Anchored => report.projects_anchored += 1,
                ProjectOutcome::SkippedStoreFailure => report.projects_skipped_store_failure += 1,
                ProjectOutcome::Updated(summary) => {
                    report.projects_updated += 1;
                    match summary {
                        Some(summary) => report.deliveries.merge(&summary),
                        None => report.projects_queued += 1,
                    }
                }
                ProjectOutcome::Resynced(summary) => {
                    report.projects_resynced += 1;
                    match summary {
                        Some(summary) => report.deliveries.merge(&summary),
                        None => report.projects_queued += 1,
                    }
                }
            }
        }

        report.orphans_removed = match self.store.delete_orphaned_projects().await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, "Orphan sweep failed");
                0
            }
        };
        report.elapsed = started.elapsed();

        info!(
            tracked = report.projects_tracked,
            fetched = report.projects_fetched,
            missing = report.projects_missing,
            incomplete = report.projects_incomplete,
            updated = report.projects_updated,
            skipped = report.projects_skipped_store_failure,
            deferred = report.projects_deferred,
            sent = report.deliveries.sent,
            failed = report.deliveries.failed,
            undeliverable = report.deliveries.undeliverable,
            orphans = report.orphans_removed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Detection cycle complete"
        );
        Ok(report)
    }

    async fn advance_cursor(&self, project: &TrackedProject, cursor: &Version) -> bool {
        match self
            .store
            .update_cursor(&project.id, cursor, Utc::now())
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!(
                    project_id = %project.id,
                    version_id = %cursor.id,
                    error = %e,
                    "Cursor update failed, skipping project until next cycle"
                );
                false
            }
        }
    }

    async fn hand_off(&self, job: NotificationJob) -> Option<DispatchSummary> {
        match &self.sink {
            DispatchSink::Inline => Some(self.dispatcher.handle(&job).await),
            DispatchSink::Queued(queue) => match queue.enqueue(job).await {
                Ok(()) => None,
                Err(job) => {
                    warn!(project_id = %job.project().id, "Delivery worker gone, delivering inline");
                    Some(self.dispatcher.handle(&job).await)
                }
            },
        }
    }

    #[instrument(skip_all, fields(project_id = %project.id))]
    async fn process_project(
        &self,
        snapshot: &CycleSnapshot,
        project: TrackedProject,
        deadline: Option<Instant>,
    ) -> ProjectOutcome {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            debug!("Cycle deadline passed, deferring project");
            return ProjectOutcome::Deferred;
        }

        if snapshot.is_incomplete(&project.id) {
            return ProjectOutcome::Incomplete;
        }

        let Some(metadata) = snapshot.project(&project.id) else {
            debug!("Project missing from catalog response");
            return ProjectOutcome::Missing;
        };

        let detection = detect(&project, snapshot.versions(&project.id));
        let Some(cursor) = detection.next_cursor().cloned() else {
            if detection == Detection::CursorMissing {
                debug!(
                    cursor = ?project.last_checked_version_id,
                    "Cursor version gone upstream, nothing newer yet"
                );
            }
            return ProjectOutcome::Unchanged;
        };

        if !self.advance_cursor(&project, &cursor).await {
            return ProjectOutcome::SkippedStoreFailure;
        }

        match detection {
            Detection::NoVersions | Detection::Unchanged | Detection::CursorMissing => {
                ProjectOutcome::Unchanged
            }
            Detection::Anchor { .. } => {
                info!(version_id = %cursor.id, "Anchored unset cursor");
                ProjectOutcome::Anchored
            }
            Detection::CursorLost { newest } => {
                warn!(
                    lost = ?project.last_checked_version_id,
                    version_id = %newest.id,
                    "Cursor not among catalog versions, re-anchoring"
                );
                let job = NotificationJob::Resync {
                    project: Arc::clone(metadata),
                    newest,
                };
                ProjectOutcome::Resynced(self.hand_off(job).await)
            }
            Detection::Updated { new_versions, .. } => {
                info!(new_versions = new_versions.len(), version_id = %cursor.id, "New versions detected");
                let job = NotificationJob::Updates {
                    project: Arc::clone(metadata),
                    new_versions,
                };
                ProjectOutcome::Updated(self.hand_off(job).await)
            }
        }
    }
}

impl std::fmt::Debug for DetectionCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionCycle")
            .field("fetcher", &self.fetcher)
            .field("max_concurrent_projects", &self.max_concurrent_projects)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
