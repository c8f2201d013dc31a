//! Per-cycle summary.

use crate::DispatchSummary;
use serde::Serialize;
use std::time::Duration;

/// What one detection cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Projects in the store when the cycle started
    pub projects_tracked: usize,
    /// Projects the catalog returned metadata for
    pub projects_fetched: usize,
    /// Tracked projects the catalog did not return
    pub projects_missing: usize,
    /// Projects skipped because the catalog omitted some of their versions
    pub projects_incomplete: usize,
    /// Projects with new versions whose cursor moved
    pub projects_updated: usize,
    /// Projects whose unset cursor was anchored
    pub projects_anchored: usize,
    /// Projects whose lost cursor was re-anchored
    pub projects_resynced: usize,
    /// Projects skipped because the cursor write failed
    pub projects_skipped_store_failure: usize,
    /// Projects not started before the cycle deadline
    pub projects_deferred: usize,
    /// Projects handed to the delivery worker
    pub projects_queued: usize,
    /// Inline delivery counters
    pub deliveries: DispatchSummary,
    /// Tracked projects deleted by the orphan sweep
    pub orphans_removed: usize,
    /// Wall-clock duration
    pub elapsed: Duration,
}
