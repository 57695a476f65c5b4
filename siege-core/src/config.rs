use std::collections::HashMap;
use std::time::Duration;

/// One target request as configured, before repeat expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTemplate {
    pub url: String,

    /// HTTP method name. An empty string defaults to GET.
    pub method: String,

    pub headers: HashMap<String, String>,
    pub body: String,

    /// Number of single-shot instances this template contributes to the
    /// execution sequence. Zero contributes nothing.
    pub repeat: u32,
}

/// Fully resolved run configuration consumed by [`Siege`](crate::Siege).
///
/// All limits are ceilings, never targets the run must reach.
/// `max_concurrent` also sizes the connection pool.
#[derive(Debug, Clone)]
pub struct SiegeConfig {
    pub urls: Vec<RequestTemplate>,
    pub duration: Duration,
    pub max_concurrent: usize,
    pub max_rps: u64,
}
