use std::ops::Deref;
use std::sync::{Arc, Mutex};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::http::HttpClient;

/// Bounded pool of reusable HTTP client handles.
///
/// Exactly `max_concurrent` handles are created eagerly; a handle is never
/// destroyed during the run, only borrowed and returned. The semaphore is the
/// sole admission-control mechanism.
#[derive(Debug)]
pub struct ClientPool {
    slots: Arc<Mutex<Vec<HttpClient>>>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl ClientPool {
    pub fn new(max_concurrent: usize, cancel: CancellationToken) -> Self {
        let slots = (0..max_concurrent).map(|_| HttpClient::default()).collect();

        Self {
            slots: Arc::new(Mutex::new(slots)),
            permits: Arc::new(Semaphore::new(max_concurrent)),
            cancel,
        }
    }

    /// Borrows a handle, waiting for one to be returned if the pool is
    /// exhausted. Returns `None` once the run is cancelled; during shutdown
    /// that is the expected signal for a worker to exit, not an error.
    pub async fn acquire(&self) -> Option<PooledClient> {
        let permit = tokio::select! {
            // Shutdown wins over a free handle.
            biased;
            _ = self.cancel.cancelled() => return None,
            permit = self.permits.clone().acquire_owned() => permit.ok()?,
        };

        // A permit guarantees a free slot.
        let client = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop()?;

        Some(PooledClient {
            client,
            slots: self.slots.clone(),
            _permit: permit,
        })
    }
}

/// A borrowed handle. Dropping it returns the handle to the pool, so the
/// one-acquire-one-release invariant holds on every exit path.
#[derive(Debug)]
pub struct PooledClient {
    client: HttpClient,
    slots: Arc<Mutex<Vec<HttpClient>>>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledClient {
    type Target = HttpClient;

    fn deref(&self) -> &HttpClient {
        &self.client
    }
}

impl Drop for PooledClient {
    fn drop(&mut self) {
        // Return the slot before the permit is released.
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(self.client.clone());
    }
}
