use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::catalog::Sequence;
use crate::pool::ClientPool;
use crate::progress::{ProgressFn, ProgressUpdate};
use crate::stats::{StatsAggregator, StatsEvent};
use crate::worker::{REQUEST_TIMEOUT, Worker};

/// Workers launched per qualifying tick. Deliberately coarse: the batch never
/// shrinks near a ceiling, so the run may briefly overshoot `max_concurrent`
/// or `max_rps` before the next tick launches nothing.
pub(crate) const WORKER_BATCH: usize = 10;

/// Periodic control loop deciding how many workers are active.
///
/// Ticks once per second against a monotonic clock. The first tick fires
/// immediately, so a run with a non-zero budget ramps up right away and a
/// zero budget cancels before any batch is launched.
pub(crate) struct RampController {
    pub(crate) label: Arc<str>,
    pub(crate) duration: Duration,
    pub(crate) max_rps: u64,
    pub(crate) max_concurrent: usize,
    pub(crate) sequence: Sequence,
    pub(crate) pool: Arc<ClientPool>,
    pub(crate) stats: Arc<StatsAggregator>,
    pub(crate) events: mpsc::Sender<StatsEvent>,
    pub(crate) cancel: CancellationToken,
    pub(crate) progress: Option<ProgressFn>,
}

impl RampController {
    /// Runs until the time budget expires or the token is cancelled
    /// externally, then joins every worker it launched.
    pub(crate) async fn run(self, started: Instant) {
        let mut workers = JoinSet::new();
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut tick: u64 = 0;
        loop {
            tokio::select! {
                // Shutdown wins over a due tick, so a cancelled run never
                // launches another batch.
                biased;
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            tick += 1;

            let snapshot = self.stats.snapshot();
            let elapsed = started.elapsed();
            let time_over = elapsed > self.duration;

            if !time_over
                && snapshot.current_rps < self.max_rps as f64
                && (snapshot.current_concurrent as usize) < self.max_concurrent
            {
                for _ in 0..WORKER_BATCH {
                    workers.spawn(
                        Worker {
                            sequence: self.sequence.clone(),
                            pool: self.pool.clone(),
                            events: self.events.clone(),
                            cancel: self.cancel.clone(),
                            timeout: REQUEST_TIMEOUT,
                        }
                        .run(),
                    );
                }
            }

            if let Some(progress) = &self.progress {
                (progress)(ProgressUpdate {
                    tick,
                    elapsed,
                    label: self.label.clone(),
                    current_rps: snapshot.current_rps,
                    requests_total: snapshot.requests_total,
                    current_concurrent: snapshot.current_concurrent,
                });
            }

            if time_over {
                self.cancel.cancel();
                break;
            }
        }

        // Cancellation is observable by every worker at this point; wait for
        // in-flight requests to wind down.
        while workers.join_next().await.is_some() {}
    }
}
