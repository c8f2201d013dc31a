//! Periodic and on-demand triggering with at most one cycle in flight.

use crate::{CycleReport, DetectionCycle};
use modwatch_error::ModwatchResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, warn};

/// Answer to a trigger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum TriggerOutcome {
    /// A new cycle was started.
    Started,
    /// A cycle is already running; nothing was started or queued.
    AlreadyRunning,
}

/// Holds the running latch; releases it when dropped, including on unwind.
struct RunningGuard {
    latch: Arc<watch::Sender<bool>>,
}

impl RunningGuard {
    fn acquire(latch: &Arc<watch::Sender<bool>>) -> Option<Self> {
        let acquired = latch.send_if_modified(|running| {
            if *running {
                false
            } else {
                *running = true;
                true
            }
        });
        acquired.then(|| Self {
            latch: Arc::clone(latch),
        })
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.latch.send_replace(false);
    }
}

/// Drives detection cycles: `Idle -> Running -> Idle`.
///
/// Timer ticks and manual force checks share one latch, so a trigger that
/// arrives while a cycle runs is ignored rather than queued. Cycle results
/// are logged and published through [`subscribe_reports`](Self::subscribe_reports);
/// they are never returned to the caller of [`force_check`](Self::force_check).
#[derive(Clone)]
pub struct CycleScheduler {
    cycle: Arc<DetectionCycle>,
    running: Arc<watch::Sender<bool>>,
    poll_interval: Duration,
    reports: watch::Sender<Option<CycleReport>>,
}

impl CycleScheduler {
    /// Create an idle scheduler ticking every `poll_interval`.
    pub fn new(cycle: DetectionCycle, poll_interval: Duration) -> Self {
        let (reports, _) = watch::channel(None);
        let (running, _) = watch::channel(false);
        Self {
            cycle: Arc::new(cycle),
            running: Arc::new(running),
            poll_interval,
            reports,
        }
    }

    /// Whether a cycle is in flight.
    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Wait until no cycle is in flight.
    ///
    /// Returns immediately when idle. Call after [`run`](Self::run) returns so
    /// a cycle that already moved cursors gets to deliver.
    pub async fn wait_idle(&self) {
        let mut running = self.running.subscribe();
        // The sender lives in `self`, so this cannot fail.
        let _ = running.wait_for(|running| !*running).await;
    }

    /// Receive the report of every cycle that completes successfully.
    pub fn subscribe_reports(&self) -> watch::Receiver<Option<CycleReport>> {
        self.reports.subscribe()
    }

    /// Start a cycle in the background unless one is running.
    #[instrument(skip(self))]
    pub fn force_check(&self) -> TriggerOutcome {
        let Some(guard) = RunningGuard::acquire(&self.running) else {
            debug!("Cycle already running, trigger ignored");
            return TriggerOutcome::AlreadyRunning;
        };

        let cycle = Arc::clone(&self.cycle);
        let reports = self.reports.clone();
        tokio::spawn(async move {
            let _guard = guard;
            // Run in a nested task so a panic surfaces as a JoinError here.
            match tokio::spawn(async move { cycle.run().await }).await {
                Ok(Ok(report)) => {
                    reports.send_replace(Some(report));
                }
                Ok(Err(e)) => error!(error = %e, "Detection cycle failed"),
                Err(e) if e.is_panic() => error!("Detection cycle panicked"),
                Err(e) => warn!(error = %e, "Detection cycle cancelled"),
            }
        });
        TriggerOutcome::Started
    }

    /// Run one cycle on the current task unless one is running.
    ///
    /// Returns `None` when another cycle holds the latch.
    pub async fn run_once(&self) -> Option<ModwatchResult<CycleReport>> {
        let _guard = RunningGuard::acquire(&self.running)?;
        let result = self.cycle.run().await;
        if let Ok(report) = &result {
            self.reports.send_replace(Some(report.clone()));
        }
        Some(result)
    }

    /// Tick every poll interval until `shutdown` resolves.
    ///
    /// The first tick fires immediately. Ticks missed while a cycle overran
    /// are skipped, not replayed.
    #[instrument(skip(self, shutdown), fields(interval_secs = self.poll_interval.as_secs()))]
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!("Scheduler started");
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = self.force_check();
                    debug!(%outcome, "Scheduled tick");
                }
                _ = &mut shutdown => {
                    info!("Scheduler stopping");
                    break;
                }
            }
        }
    }
}

impl std::fmt::Debug for CycleScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleScheduler")
            .field("running", &self.is_running())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}
