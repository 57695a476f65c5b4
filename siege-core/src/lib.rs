mod catalog;
mod config;
mod engine;
mod http;
mod pool;
mod progress;
mod ramp;
mod stats;
mod worker;

pub use catalog::{build_sequence, build_sequence_with};
pub use config::{RequestTemplate, SiegeConfig};
pub use engine::Siege;
pub use http::{Error as HttpError, HttpClient, HttpRequest, HttpResponse, Result as HttpResult};
pub use pool::{ClientPool, PooledClient};
pub use progress::{ProgressFn, ProgressUpdate};
pub use stats::StatsSnapshot;
