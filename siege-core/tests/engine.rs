use std::sync::{Arc, Mutex};
use std::time::Duration;

use siege_core::{ProgressUpdate, RequestTemplate, Siege, SiegeConfig};
use siege_testserver::{PATH_CLIENT_ERROR, PATH_NOT_MODIFIED, PATH_OK, PATH_SERVER_ERROR, TestServer};
use tokio_util::sync::CancellationToken;

fn template(url: String, repeat: u32) -> RequestTemplate {
    RequestTemplate {
        url,
        method: "GET".to_string(),
        repeat,
        ..RequestTemplate::default()
    }
}

fn config(urls: Vec<RequestTemplate>, duration_secs: u64) -> SiegeConfig {
    SiegeConfig {
        urls,
        duration: Duration::from_secs(duration_secs),
        max_concurrent: 5,
        max_rps: 1000,
    }
}

/// A port with nothing listening on it, for connection-refused runs.
fn refused_url() -> anyhow::Result<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}/"))
}

#[tokio::test]
async fn all_ok_responses_land_in_the_2xx_bucket() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let urls = vec![
        template(server.url(PATH_OK), 2),
        template(server.url(PATH_OK), 3),
    ];

    let siege = Siege::new(CancellationToken::new(), config(urls, 1));
    siege.start("t-2xx").await;

    let stats = siege.stats();
    let seen = server.stats().requests_total();
    server.shutdown().await;

    anyhow::ensure!(stats.status_2xx >= 1, "expected 2xx responses: {stats:?}");
    anyhow::ensure!(seen >= 1, "server saw no requests");
    assert_eq!(stats.connection_failures, 0);
    assert_eq!(stats.status_4xx, 0);
    assert_eq!(stats.status_5xx, 0);
    assert!(stats.max_concurrent <= 5, "pool ceiling breached: {stats:?}");
    assert_eq!(stats.current_concurrent, 0, "run did not drain: {stats:?}");
    Ok(())
}

#[tokio::test]
async fn unreachable_target_counts_connection_failures_only() -> anyhow::Result<()> {
    let url = refused_url()?;
    let urls = vec![template(url.clone(), 2), template(url, 3)];

    let siege = Siege::new(CancellationToken::new(), config(urls, 1));
    siege.start("t-refused").await;

    let stats = siege.stats();
    anyhow::ensure!(
        stats.connection_failures >= 1,
        "expected connection failures: {stats:?}"
    );
    assert_eq!(stats.status_2xx, 0);
    assert_eq!(stats.status_4xx, 0);
    assert_eq!(stats.status_5xx, 0);
    assert_eq!(stats.current_concurrent, 0);
    Ok(())
}

#[tokio::test]
async fn error_statuses_bucket_by_class() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let urls = vec![
        template(server.url(PATH_CLIENT_ERROR), 3),
        template(server.url(PATH_SERVER_ERROR), 3),
    ];

    let siege = Siege::new(CancellationToken::new(), config(urls, 1));
    siege.start("t-buckets").await;

    let stats = siege.stats();
    server.shutdown().await;

    anyhow::ensure!(stats.status_4xx >= 1, "expected 4xx responses: {stats:?}");
    anyhow::ensure!(stats.status_5xx >= 1, "expected 5xx responses: {stats:?}");
    assert_eq!(stats.status_2xx, 0);
    assert_eq!(stats.connection_failures, 0);
    Ok(())
}

#[tokio::test]
async fn redirect_class_statuses_are_counted_in_no_bucket() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let urls = vec![template(server.url(PATH_NOT_MODIFIED), 2)];

    let siege = Siege::new(CancellationToken::new(), config(urls, 1));
    siege.start("t-3xx").await;

    let stats = siege.stats();
    let seen = server.stats().requests_total();
    server.shutdown().await;

    anyhow::ensure!(seen >= 1, "server saw no requests");
    anyhow::ensure!(stats.requests_total >= 1, "no requests issued: {stats:?}");
    assert_eq!(stats.status_2xx, 0);
    assert_eq!(stats.status_4xx, 0);
    assert_eq!(stats.status_5xx, 0);
    assert_eq!(stats.connection_failures, 0);
    Ok(())
}

#[tokio::test]
async fn zero_duration_terminates_before_any_batch() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let urls = vec![template(server.url(PATH_OK), 2)];

    let siege = Siege::new(CancellationToken::new(), config(urls, 0));
    tokio::time::timeout(Duration::from_secs(5), siege.start("t-zero")).await?;

    let stats = siege.stats();
    server.shutdown().await;

    assert_eq!(stats.requests_total, 0);
    assert_eq!(stats.max_concurrent, 0);
    assert_eq!(stats.connection_failures, 0);
    Ok(())
}

#[tokio::test]
async fn already_cancelled_run_launches_no_workers() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let urls = vec![template(server.url(PATH_OK), 2)];

    let cancel = CancellationToken::new();
    cancel.cancel();

    let siege = Siege::new(cancel, config(urls, 60));
    tokio::time::timeout(Duration::from_secs(5), siege.start("t-dead")).await?;

    let stats = siege.stats();
    server.shutdown().await;

    assert_eq!(stats.requests_total, 0);
    assert_eq!(stats.max_concurrent, 0);
    Ok(())
}

#[tokio::test]
async fn external_cancellation_ends_the_run_early() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let urls = vec![template(server.url(PATH_OK), 2)];

    let cancel = CancellationToken::new();
    let siege = Siege::new(cancel.clone(), config(urls, 60));

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
    });

    // Far below the configured 60s budget.
    tokio::time::timeout(Duration::from_secs(15), siege.start("t-cancel")).await?;
    canceller.await?;

    let stats = siege.stats();
    server.shutdown().await;

    assert_eq!(stats.current_concurrent, 0, "run did not drain: {stats:?}");
    Ok(())
}

#[tokio::test]
async fn progress_hook_fires_once_per_tick_with_the_label() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let urls = vec![template(server.url(PATH_OK), 2)];

    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();

    let siege = Siege::new(CancellationToken::new(), config(urls, 1)).with_progress(Arc::new(
        move |update| {
            sink.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(update);
        },
    ));
    siege.start("t-progress").await;
    server.shutdown().await;

    let updates = updates
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    anyhow::ensure!(!updates.is_empty(), "no progress updates were emitted");
    assert_eq!(&*updates[0].label, "t-progress");
    assert_eq!(updates[0].tick, 1);
    assert!(updates.iter().zip(updates.iter().skip(1)).all(|(a, b)| b.tick == a.tick + 1));
    Ok(())
}
