use std::sync::Arc;

use rand::Rng as _;
use rand::distr::Alphanumeric;
use siege_core::{ProgressUpdate, Siege};
use tokio_util::sync::CancellationToken;

use crate::cli::RunArgs;
use crate::config;

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let cfg = config::load(&args.config, &args).await?;

    let cancel = CancellationToken::new();
    {
        // Ctrl-C stops the run early; the engine still drains and reports.
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let label = run_label(10);
    let siege = Siege::new(cancel, cfg).with_progress(Arc::new(print_progress));
    siege.start(&label).await;

    let stats = siege.stats();
    println!(
        "Final Stats:\n\
         Max RPS: {:.2}\n\
         Total Requests: {}\n\
         Max Concurrents: {}\n\
         2xx Responses: {}\n\
         4xx Responses: {}\n\
         5xx Responses: {}\n\
         connection failures: {}",
        stats.max_rps,
        stats.requests_total,
        stats.max_concurrent,
        stats.status_2xx,
        stats.status_4xx,
        stats.status_5xx,
        stats.connection_failures,
    );

    Ok(())
}

fn print_progress(update: ProgressUpdate) {
    println!(
        "{} current RPS: {:.2}, Total Requests: {}, current Concurrent: {}",
        update.label, update.current_rps, update.requests_total, update.current_concurrent,
    );
}

fn run_label(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
