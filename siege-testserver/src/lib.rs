//! Small HTTP server the integration tests aim siege runs at.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_OK: &str = "/ok";
pub const PATH_CLIENT_ERROR: &str = "/client-error";
pub const PATH_SERVER_ERROR: &str = "/server-error";
pub const PATH_NOT_MODIFIED: &str = "/not-modified";
pub const PATH_SLOW: &str = "/slow";

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }
}

pub struct TestServer {
    base_url: String,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();

        let app = router(stats.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}

fn router(stats: TestServerStats) -> Router {
    Router::new()
        .route(PATH_OK, get(handle_ok).post(handle_ok))
        .route(PATH_CLIENT_ERROR, get(handle_client_error))
        .route(PATH_SERVER_ERROR, get(handle_server_error))
        .route(PATH_NOT_MODIFIED, get(handle_not_modified))
        .route(PATH_SLOW, get(handle_slow))
        .with_state(stats)
}

async fn handle_ok(State(stats): State<TestServerStats>, _body: Bytes) -> &'static str {
    stats.inc_requests_total();
    "ok"
}

async fn handle_client_error(State(stats): State<TestServerStats>) -> StatusCode {
    stats.inc_requests_total();
    StatusCode::BAD_REQUEST
}

async fn handle_server_error(State(stats): State<TestServerStats>) -> StatusCode {
    stats.inc_requests_total();
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn handle_not_modified(State(stats): State<TestServerStats>) -> StatusCode {
    stats.inc_requests_total();
    StatusCode::NOT_MODIFIED
}

async fn handle_slow(State(stats): State<TestServerStats>) -> &'static str {
    stats.inc_requests_total();
    sleep(Duration::from_millis(200)).await;
    "slow"
}
