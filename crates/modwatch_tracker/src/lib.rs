//! Detect-and-notify pipeline for modwatch.
//!
//! A [`CycleScheduler`] triggers [`DetectionCycle`]s on a fixed interval or on
//! demand, never more than one at a time. Each cycle:
//!
//! 1. fetches metadata and versions of every tracked project in batches
//! 2. freezes them into a [`CycleSnapshot`]
//! 3. diffs each project against its cursor with [`detect`]
//! 4. writes the new cursor, then hands new versions to the
//!    [`NotificationDispatcher`] inline or through the [`JobQueue`]
//! 5. sweeps tracked projects nobody subscribes to any more
//!
//! [`SubscriptionService`] manages the subscriptions the cycle reads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod cycle;
mod detector;
mod dispatcher;
mod observability;
mod queue;
mod report;
mod resolver;
mod scheduler;
mod snapshot;
mod subscription;

pub use config::{DispatchMode, LogConfig, ModwatchConfig};
pub use cycle::{DetectionCycle, DispatchSink};
pub use detector::{Detection, detect};
pub use dispatcher::{DeliveryOutcome, DeliveryStatus, DispatchSummary, NotificationDispatcher};
pub use observability::init_tracing;
pub use queue::{DeliveryWorker, JobQueue, NotificationJob, notification_queue};
pub use report::CycleReport;
pub use resolver::{Recipient, SubscriptionResolver, resolve_entries};
pub use scheduler::{CycleScheduler, TriggerOutcome};
pub use snapshot::CycleSnapshot;
pub use subscription::SubscriptionService;
