//! Rendering and failure-isolated delivery of notifications.

use crate::{NotificationJob, Recipient, SubscriptionResolver};
use modwatch_core::{Guild, GuildId, ProjectId, ProjectMetadata, Version, VersionId};
use modwatch_error::{DeliveryError, DeliveryErrorKind};
use modwatch_interface::{Messenger, TrackerStore};
use modwatch_social::{render_resync_notice, render_version};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Handed to the messenger successfully.
    Sent,
    /// Rendering or sending failed.
    Failed(DeliveryErrorKind),
    /// The entry has no destination channel.
    Undeliverable,
}

/// One (entry, version) delivery and how it went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Subscribing guild
    pub guild_id: GuildId,
    /// Project the notification is about
    pub project_id: ProjectId,
    /// Announced version
    pub version_id: VersionId,
    /// What happened
    pub status: DeliveryStatus,
}

/// Delivery counters for one project or one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// Notifications sent
    pub sent: usize,
    /// Notifications that failed to render or send
    pub failed: usize,
    /// Notifications skipped for lack of a destination
    pub undeliverable: usize,
    /// Resync notices sent
    pub diagnostics_sent: usize,
    /// Resync notices that failed
    pub diagnostics_failed: usize,
}

impl DispatchSummary {
    /// Count one delivery outcome.
    pub fn record(&mut self, outcome: &DeliveryOutcome) {
        match outcome.status {
            DeliveryStatus::Sent => self.sent += 1,
            DeliveryStatus::Failed(_) => self.failed += 1,
            DeliveryStatus::Undeliverable => self.undeliverable += 1,
        }
    }

    /// Add another summary's counters to this one.
    pub fn merge(&mut self, other: &DispatchSummary) {
        self.sent += other.sent;
        self.failed += other.failed;
        self.undeliverable += other.undeliverable;
        self.diagnostics_sent += other.diagnostics_sent;
        self.diagnostics_failed += other.diagnostics_failed;
    }
}

/// Delivers one message per (entry, qualifying version).
///
/// Every delivery is independent: a failure is logged and recorded and the
/// remaining deliveries still run. Nothing is retried.
#[derive(Clone)]
pub struct NotificationDispatcher {
    messenger: Arc<dyn Messenger>,
    store: Arc<dyn TrackerStore>,
    resolver: SubscriptionResolver,
}

impl NotificationDispatcher {
    /// Create a dispatcher sending through `messenger`.
    ///
    /// The store supplies subscriber entries and guild presentation settings.
    pub fn new(messenger: Arc<dyn Messenger>, store: Arc<dyn TrackerStore>) -> Self {
        Self {
            messenger,
            resolver: SubscriptionResolver::new(Arc::clone(&store)),
            store,
        }
    }

    /// Guild settings, falling back to defaults when unknown or unreadable.
    async fn guild_settings(&self, guild_id: GuildId) -> Guild {
        match self.store.get_guild(guild_id).await {
            Ok(Some(guild)) => guild,
            Ok(None) => Guild::new(guild_id),
            Err(e) => {
                warn!(guild_id = %guild_id, error = %e, "Failed to load guild settings, using defaults");
                Guild::new(guild_id)
            }
        }
    }

    /// Deliver every qualifying version to one recipient, oldest first.
    #[instrument(
        skip(self, recipient, project),
        fields(guild_id = %recipient.entry.guild_id, project_id = %project.id, versions = recipient.versions.len())
    )]
    pub async fn dispatch(
        &self,
        recipient: &Recipient,
        project: &ProjectMetadata,
    ) -> Vec<DeliveryOutcome> {
        let entry = &recipient.entry;
        let outcome = |version: &Version, status| DeliveryOutcome {
            guild_id: entry.guild_id,
            project_id: project.id.clone(),
            version_id: version.id.clone(),
            status,
        };

        let channel = match entry.channel_id.filter(|_| recipient.deliverable) {
            Some(channel) => channel,
            None => {
                debug!("Entry has no destination channel");
                return recipient
                    .versions
                    .iter()
                    .map(|v| outcome(v, DeliveryStatus::Undeliverable))
                    .collect();
            }
        };

        let guild = self.guild_settings(entry.guild_id).await;
        let mention = entry.role_id.or(guild.ping_role_id);

        let mut outcomes = Vec::with_capacity(recipient.versions.len());
        for version in &recipient.versions {
            let result = match render_version(project, version, &guild) {
                Ok(message) => {
                    self.messenger
                        .send_notification(channel, &message, mention)
                        .await
                }
                Err(e) => Err(e),
            };

            let status = match result {
                Ok(()) => {
                    debug!(version_id = %version.id, channel_id = %channel, "Delivered notification");
                    DeliveryStatus::Sent
                }
                Err(DeliveryError { kind, .. }) => {
                    warn!(
                        version_id = %version.id,
                        channel_id = %channel,
                        platform = self.messenger.platform_name(),
                        error = %kind,
                        "Notification delivery failed"
                    );
                    DeliveryStatus::Failed(kind)
                }
            };
            outcomes.push(outcome(version, status));
        }
        outcomes
    }

    /// Resolve subscribers for new versions of `project` and deliver.
    #[instrument(skip(self, project, new_versions), fields(project_id = %project.id))]
    pub async fn deliver_updates(
        &self,
        project: &ProjectMetadata,
        new_versions: &[Version],
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let recipients = match self.resolver.resolve(&project.id, new_versions).await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!(error = %e, "Failed to load subscribers, notifications dropped");
                return summary;
            }
        };

        for recipient in &recipients {
            for outcome in self.dispatch(recipient, project).await {
                summary.record(&outcome);
            }
        }

        info!(
            recipients = recipients.len(),
            sent = summary.sent,
            failed = summary.failed,
            undeliverable = summary.undeliverable,
            "Dispatched project update"
        );
        summary
    }

    /// Tell every deliverable subscriber that tracking skipped ahead to `newest`.
    #[instrument(skip(self, project, newest), fields(project_id = %project.id, version_id = %newest.id))]
    pub async fn notify_resync(&self, project: &ProjectMetadata, newest: &Version) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let entries = match self.store.list_project_entries(&project.id).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "Failed to load subscribers for resync notice");
                return summary;
            }
        };

        let message = match render_resync_notice(project, newest) {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "Failed to render resync notice");
                summary.diagnostics_failed += entries.iter().filter(|e| e.is_deliverable()).count();
                return summary;
            }
        };

        for entry in &entries {
            let Some(channel) = entry.channel_id else {
                continue;
            };
            match self.messenger.send_notification(channel, &message, None).await {
                Ok(()) => summary.diagnostics_sent += 1,
                Err(e) => {
                    warn!(guild_id = %entry.guild_id, channel_id = %channel, error = %e.kind, "Resync notice failed");
                    summary.diagnostics_failed += 1;
                }
            }
        }

        warn!(
            sent = summary.diagnostics_sent,
            failed = summary.diagnostics_failed,
            "Cursor lost upstream, tracking resynchronised"
        );
        summary
    }

    /// Execute one notification job.
    pub async fn handle(&self, job: &NotificationJob) -> DispatchSummary {
        match job {
            NotificationJob::Updates {
                project,
                new_versions,
            } => self.deliver_updates(project, new_versions).await,
            NotificationJob::Resync { project, newest } => self.notify_resync(project, newest).await,
        }
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("platform", &self.messenger.platform_name())
            .finish_non_exhaustive()
    }
}
