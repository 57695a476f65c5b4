use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Buffered event channel capacity between workers and the aggregator.
pub(crate) const EVENT_BUFFER: usize = 500;

/// Count-affecting lifecycle events emitted by workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatsEvent {
    /// A request is about to be issued.
    Started,
    /// A request attempt finished, successfully or not.
    Finished,
    /// A transport or request-construction failure; no response was received.
    ConnectionFailed,
    /// A response arrived with this status code.
    Status(u16),
}

#[derive(Debug, Default)]
struct RunCounters {
    requests_total: u64,
    current_rps: f64,
    current_concurrent: u64,
    max_rps: f64,
    max_concurrent: u64,
    status_2xx: u64,
    status_4xx: u64,
    status_5xx: u64,
    connection_failures: u64,
}

impl RunCounters {
    fn apply(&mut self, event: StatsEvent, elapsed_secs: f64) {
        match event {
            StatsEvent::Started => {
                self.requests_total += 1;
                self.current_rps = self.requests_total as f64 / elapsed_secs.max(1e-9);
                if self.current_rps > self.max_rps {
                    self.max_rps = self.current_rps;
                }
                self.current_concurrent += 1;
                if self.current_concurrent > self.max_concurrent {
                    self.max_concurrent = self.current_concurrent;
                }
            }
            StatsEvent::Finished => {
                self.current_concurrent = self.current_concurrent.saturating_sub(1);
            }
            StatsEvent::ConnectionFailed => {
                self.connection_failures += 1;
            }
            StatsEvent::Status(code) => match code {
                200..=299 => self.status_2xx += 1,
                400..=499 => self.status_4xx += 1,
                500.. => self.status_5xx += 1,
                // 1xx/3xx intentionally land in no bucket.
                _ => {}
            },
        }
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            max_rps: self.max_rps,
            current_rps: self.current_rps,
            requests_total: self.requests_total,
            current_concurrent: self.current_concurrent,
            max_concurrent: self.max_concurrent,
            status_2xx: self.status_2xx,
            status_4xx: self.status_4xx,
            status_5xx: self.status_5xx,
            connection_failures: self.connection_failures,
        }
    }
}

/// Point-in-time view of the run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSnapshot {
    /// Highest requests-per-second observed so far; non-decreasing.
    pub max_rps: f64,
    /// `requests_total / elapsed` as of the last processed start event.
    pub current_rps: f64,
    /// Monotonic count of requests started.
    pub requests_total: u64,
    /// Live in-flight request count.
    pub current_concurrent: u64,
    /// Highest in-flight count observed so far; non-decreasing.
    pub max_concurrent: u64,
    pub status_2xx: u64,
    pub status_4xx: u64,
    pub status_5xx: u64,
    pub connection_failures: u64,
}

/// Sole owner of the run counters.
///
/// All mutation goes through the single-consumer event loop, one event at a
/// time in arrival order, so workers never touch the counters directly.
/// Snapshots are taken under the same lock the loop mutates through.
#[derive(Debug, Default)]
pub(crate) struct StatsAggregator {
    counters: Mutex<RunCounters>,
}

impl StatsAggregator {
    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .snapshot()
    }

    /// Spawns the event loop. It runs until the channel is closed and
    /// drained; the returned handle is the completion marker waiters join on.
    pub(crate) fn spawn(
        self: Arc<Self>,
        mut events: mpsc::Receiver<StatsEvent>,
        started: Instant,
    ) -> JoinHandle<()> {
        let aggregator = self;

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let elapsed_secs = started.elapsed().as_secs_f64();
                aggregator
                    .counters
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .apply(event, elapsed_secs);
            }
        })
    }
}
