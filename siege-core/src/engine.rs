use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::catalog::{self, Sequence};
use crate::config::SiegeConfig;
use crate::pool::ClientPool;
use crate::progress::ProgressFn;
use crate::ramp::RampController;
use crate::stats::{EVENT_BUFFER, StatsAggregator, StatsSnapshot};

/// The load-generation engine. One instance drives one run.
///
/// The cancellation token is the run's single cancellation primitive: the
/// engine cancels it itself when the time budget expires, and the caller may
/// cancel it at any point (e.g. on an OS interrupt) to stop the run early.
pub struct Siege {
    cancel: CancellationToken,
    config: SiegeConfig,
    sequence: Sequence,
    pool: Arc<ClientPool>,
    stats: Arc<StatsAggregator>,
    progress: Option<ProgressFn>,
}

impl Siege {
    /// Builds the execution sequence and the connection pool once; both live
    /// for the whole run.
    pub fn new(cancel: CancellationToken, config: SiegeConfig) -> Self {
        let sequence: Sequence = catalog::build_sequence(&config.urls).into();
        let pool = Arc::new(ClientPool::new(config.max_concurrent, cancel.clone()));

        Self {
            cancel,
            config,
            sequence,
            pool,
            stats: Arc::new(StatsAggregator::default()),
            progress: None,
        }
    }

    /// Installs the per-tick observability hook.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Runs the siege until the duration elapses or the token is cancelled.
    ///
    /// Blocks until the ramp controller and every worker have finished, then
    /// closes the event stream and waits for the aggregator to drain. Never
    /// fails: per-request errors are absorbed into the statistics.
    pub async fn start(&self, label: &str) {
        let started = Instant::now();

        let (events, receiver) = mpsc::channel(EVENT_BUFFER);
        let aggregator = self.stats.clone().spawn(receiver, started);

        RampController {
            label: Arc::from(label),
            duration: self.config.duration,
            max_rps: self.config.max_rps,
            max_concurrent: self.config.max_concurrent,
            sequence: self.sequence.clone(),
            pool: self.pool.clone(),
            stats: self.stats.clone(),
            events: events.clone(),
            cancel: self.cancel.clone(),
            progress: self.progress.clone(),
        }
        .run(started)
        .await;

        // All worker senders are gone; dropping ours closes the stream and
        // lets the aggregator drain whatever is still buffered.
        drop(events);
        if let Err(err) = aggregator.await
            && err.is_panic()
        {
            std::panic::resume_unwind(err.into_panic());
        }
    }

    /// Snapshot of the run counters: live during a run, final afterwards.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
