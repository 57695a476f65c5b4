use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::catalog::Sequence;
use crate::config::RequestTemplate;
use crate::http::HttpRequest;
use crate::pool::ClientPool;
use crate::stats::StatsEvent;

/// Per-request ceiling so one stuck request cannot stall a worker forever.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One concurrent unit of execution. Walks the shared sequence circularly,
/// one request at a time, until the run is cancelled.
pub(crate) struct Worker {
    pub(crate) sequence: Sequence,
    pub(crate) pool: Arc<ClientPool>,
    pub(crate) events: mpsc::Sender<StatsEvent>,
    pub(crate) cancel: CancellationToken,
    pub(crate) timeout: Duration,
}

impl Worker {
    pub(crate) async fn run(self) {
        if self.sequence.is_empty() {
            return;
        }

        loop {
            for instance in self.sequence.iter() {
                if self.cancel.is_cancelled() {
                    return;
                }
                if !self.issue(instance).await {
                    return;
                }
            }
        }
    }

    /// Issues a single request. Returns `false` when the worker should exit.
    async fn issue(&self, instance: &RequestTemplate) -> bool {
        // No handle means the run was cancelled while we waited.
        let Some(client) = self.pool.acquire().await else {
            return false;
        };

        if self.events.send(StatsEvent::Started).await.is_err() {
            return false;
        }

        let outcome = match HttpRequest::from_template(instance, Some(self.timeout)) {
            Ok(req) => client.request(req).await,
            // Construction errors count the same as connection failures.
            Err(err) => Err(err),
        };

        // Hand the client back before recording completion.
        drop(client);

        if self.events.send(StatsEvent::Finished).await.is_err() {
            return false;
        }

        match outcome {
            Ok(response) => self
                .events
                .send(StatsEvent::Status(response.status))
                .await
                .is_ok(),
            // A request torn down by shutdown is not a failure.
            Err(_) if self.cancel.is_cancelled() => false,
            Err(_) => self.events.send(StatsEvent::ConnectionFailed).await.is_ok(),
        }
    }
}
