use std::sync::Arc;
use std::time::Duration;

/// One progress report per ramp-controller tick. This is the only sanctioned
/// periodic output from the engine; formatting belongs to the caller.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Monotonic tick counter (1-based).
    pub tick: u64,
    pub elapsed: Duration,
    /// Run label passed to [`Siege::start`](crate::Siege::start).
    pub label: Arc<str>,
    pub current_rps: f64,
    pub requests_total: u64,
    pub current_concurrent: u64,
}

pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;
