use std::time::Instant;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::{config::Config, error::AppResult, loader, models::RunReport, scraper};

/// One extract-then-load pass. Nothing is written unless extraction succeeds.
pub async fn run_once(
    http: &reqwest::Client,
    source_url: &str,
    database_url: &str,
) -> AppResult<RunReport> {
    let records = scraper::extract(http, source_url).await?;
    let load = loader::load(database_url, &records).await?;
    Ok(RunReport { extracted: records.len(), load })
}

/// Runs immediately, then once per `config.schedule_every` until Ctrl-C.
/// Ticks missed while a run is in flight are skipped, not replayed. A failed
/// run is logged and retried at the next tick.
pub async fn run_scheduled(http: &reqwest::Client, config: &Config) {
    let database_url = config.database_url();
    let mut ticker = tokio::time::interval(config.schedule_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(every_secs = config.schedule_every.as_secs(), "scheduler started");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("stopping scheduler");
                return;
            }
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = &mut shutdown => {
                warn!("stopping scheduler mid-run; uncommitted changes are rolled back");
                return;
            }
            _ = scheduled_run(http, &config.source_url, &database_url) => {}
        }
    }
}

/// One scheduler tick. Errors end the run, never the scheduler.
pub async fn scheduled_run(
    http: &reqwest::Client,
    source_url: &str,
    database_url: &str,
) -> Option<RunReport> {
    let started = Instant::now();
    match run_once(http, source_url, database_url).await {
        Ok(report) => {
            info!(
                extracted = report.extracted,
                inserted = report.load.inserted,
                updated = report.load.updated,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "run finished"
            );
            Some(report)
        },
        Err(err) => {
            error!(error = %err, "run failed; waiting for next tick");
            None
        },
    }
}
