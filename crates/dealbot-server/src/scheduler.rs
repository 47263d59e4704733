//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring posting, cleanup, and stats jobs. Every job contains its own
//! errors; a failed run waits for the next tick.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use dealbot_content::GeneratorMode;
use dealbot_db::Store;
use dealbot_pipeline::DealPostingPipeline;
use dealbot_scraper::DealScraper;

const CLEANUP_RETENTION_DAYS: i64 = 30;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    store: Store,
    scraper: Arc<DealScraper>,
    pipeline: Arc<DealPostingPipeline>,
    post_interval_minutes: u32,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_posting_job(&scheduler, scraper, pipeline, post_interval_minutes).await?;
    register_cleanup_job(&scheduler, store.clone()).await?;
    register_stats_job(&scheduler, store).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring posting job.
///
/// Runs every `post_interval_minutes` (hourly when the interval does not fit
/// a minutes cron field). Each run scrapes the configured sources and feeds
/// the candidates through one pipeline cycle.
async fn register_posting_job(
    scheduler: &JobScheduler,
    scraper: Arc<DealScraper>,
    pipeline: Arc<DealPostingPipeline>,
    post_interval_minutes: u32,
) -> Result<(), JobSchedulerError> {
    let cron = if (1..60).contains(&post_interval_minutes) {
        format!("0 */{post_interval_minutes} * * * *")
    } else {
        "0 0 * * * *".to_string()
    };

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let scraper = Arc::clone(&scraper);
        let pipeline = Arc::clone(&pipeline);

        Box::pin(async move {
            tracing::info!("scheduler: starting posting cycle");
            run_posting_job(&scraper, &pipeline).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(interval_minutes = post_interval_minutes, "posting job registered");
    Ok(())
}

async fn run_posting_job(scraper: &DealScraper, pipeline: &DealPostingPipeline) {
    // A degraded content backend gets one explicit recovery attempt per cycle.
    if pipeline.content_generator().mode() == GeneratorMode::Degraded {
        pipeline.content_generator().recheck().await;
    }

    let candidates = scraper.scrape().await;
    if candidates.is_empty() {
        tracing::info!("scheduler: no candidates scraped this cycle");
        return;
    }

    let posted = pipeline.run_cycle(&candidates).await;
    tracing::info!(posted, "scheduler: posting cycle complete");
}

/// Daily retention sweep at 03:00 UTC.
async fn register_cleanup_job(
    scheduler: &JobScheduler,
    store: Store,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 0 3 * * *", move |_uuid, _lock| {
        let store = store.clone();

        Box::pin(async move {
            match store.cleanup_old_deals(CLEANUP_RETENTION_DAYS).await {
                Ok(0) => tracing::info!("scheduler: no old deals to remove"),
                Ok(removed) => tracing::info!(removed, "scheduler: removed old deals"),
                Err(e) => tracing::error!(error = %e, "scheduler: cleanup failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Hourly stats snapshot into the log.
async fn register_stats_job(
    scheduler: &JobScheduler,
    store: Store,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 0 * * * *", move |_uuid, _lock| {
        let store = store.clone();

        Box::pin(async move {
            match store.deal_stats().await {
                Ok(stats) => tracing::info!(
                    total_deals = stats.total_deals,
                    recent_deals = stats.recent_deals,
                    total_clicks = stats.total_clicks,
                    total_earnings = %stats.total_earnings,
                    "scheduler: stats snapshot"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: stats query failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
