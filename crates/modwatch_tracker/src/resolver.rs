//! Narrowing a project's subscribers to the ones a change concerns.

use modwatch_core::{ProjectId, SubscriptionEntry, Version};
use modwatch_error::StoreResult;
use modwatch_interface::TrackerStore;
use std::sync::Arc;
use tracing::{debug, instrument};

/// One subscriber entry and the versions it should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// The subscription entry
    pub entry: SubscriptionEntry,
    /// Versions passing the entry's filters, oldest first
    pub versions: Vec<Version>,
    /// Whether the entry has a destination channel
    pub deliverable: bool,
}

/// Match entries against new versions.
///
/// Entries with no qualifying version are dropped; entries without a
/// channel are kept and flagged undeliverable. Version order is preserved.
pub fn resolve_entries(entries: Vec<SubscriptionEntry>, versions: &[Version]) -> Vec<Recipient> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let qualifying: Vec<Version> = versions
                .iter()
                .filter(|v| entry.admits(v))
                .cloned()
                .collect();
            if qualifying.is_empty() {
                return None;
            }
            Some(Recipient {
                deliverable: entry.is_deliverable(),
                entry,
                versions: qualifying,
            })
        })
        .collect()
}

/// Loads subscriber entries from the store and resolves them.
#[derive(Clone)]
pub struct SubscriptionResolver {
    store: Arc<dyn TrackerStore>,
}

impl SubscriptionResolver {
    /// Create a resolver reading entries from `store`.
    pub fn new(store: Arc<dyn TrackerStore>) -> Self {
        Self { store }
    }

    /// Recipients for `new_versions` of `project_id`.
    #[instrument(skip(self, project_id, new_versions), fields(project_id = %project_id, versions = new_versions.len()))]
    pub async fn resolve(
        &self,
        project_id: &ProjectId,
        new_versions: &[Version],
    ) -> StoreResult<Vec<Recipient>> {
        let entries = self.store.list_project_entries(project_id).await?;
        let total = entries.len();
        let recipients = resolve_entries(entries, new_versions);
        debug!(entries = total, recipients = recipients.len(), "Resolved subscribers");
        Ok(recipients)
    }
}
