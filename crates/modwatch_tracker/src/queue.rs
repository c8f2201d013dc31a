//! Typed in-process queue for two-phase delivery.
//!
//! The detection cycle enqueues one [`NotificationJob`] per changed project
//! after its cursor is written; a [`DeliveryWorker`] drains the queue and
//! runs resolution and delivery.

use crate::{DispatchSummary, NotificationDispatcher};
use modwatch_core::{ProjectMetadata, Version};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument};

/// Immutable work item for the delivery worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationJob {
    /// Announce new versions of a project.
    Updates {
        /// Project snapshot taken during the cycle
        project: Arc<ProjectMetadata>,
        /// New versions, oldest first
        new_versions: Vec<Version>,
    },
    /// Tell subscribers tracking skipped ahead after a lost cursor.
    Resync {
        /// Project snapshot taken during the cycle
        project: Arc<ProjectMetadata>,
        /// The version the cursor was re-anchored on
        newest: Version,
    },
}

impl NotificationJob {
    /// Project the job concerns.
    pub fn project(&self) -> &ProjectMetadata {
        match self {
            Self::Updates { project, .. } | Self::Resync { project, .. } => project,
        }
    }
}

/// Sending half of the notification queue.
#[derive(Debug, Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<NotificationJob>,
}

impl JobQueue {
    /// Enqueue a job, waiting for room if the queue is full.
    ///
    /// Returns the job back if the worker has shut down.
    pub async fn enqueue(&self, job: NotificationJob) -> Result<(), NotificationJob> {
        self.tx.send(job).await.map_err(|e| e.0)
    }

    /// Whether the worker is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Drains the notification queue.
pub struct DeliveryWorker {
    dispatcher: NotificationDispatcher,
    rx: mpsc::Receiver<NotificationJob>,
    totals: watch::Sender<DispatchSummary>,
}

/// Create a queue of `capacity` jobs and the worker that drains it.
pub fn notification_queue(
    dispatcher: NotificationDispatcher,
    capacity: usize,
) -> (JobQueue, DeliveryWorker) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let (totals, _) = watch::channel(DispatchSummary::default());
    (
        JobQueue { tx },
        DeliveryWorker {
            dispatcher,
            rx,
            totals,
        },
    )
}

impl DeliveryWorker {
    /// Running totals of everything the worker has delivered.
    pub fn subscribe_totals(&self) -> watch::Receiver<DispatchSummary> {
        self.totals.subscribe()
    }

    /// Process jobs until every [`JobQueue`] handle is dropped.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!("Delivery worker started");

        while let Some(job) = self.rx.recv().await {
            debug!(project_id = %job.project().id, "Processing notification job");
            let summary = self.dispatcher.handle(&job).await;
            self.totals.send_modify(|totals| totals.merge(&summary));
        }

        info!("Delivery worker stopped");
    }
}
