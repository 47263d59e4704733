mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use dealbot_channel::ChannelClient;
use dealbot_content::ContentGenerator;
use dealbot_core::{AffiliateLinkBuilder, AppConfig, ContentStyle};
use dealbot_db::Store;
use dealbot_pipeline::{ChannelTarget, DealPostingPipeline, PipelineConfig};
use dealbot_scraper::{DealScraper, ScraperConfig};
use dealbot_validator::{LinkValidator, ValidatorConfig};

use crate::api::{build_app, default_rate_limit_state, AppState};
use crate::middleware::AuthState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(dealbot_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(?config, "starting dealbot server");

    let store = Store::from_config(&config).await?;

    let pipeline = Arc::new(build_pipeline(&config, store.clone())?);
    let scraper = Arc::new(build_scraper(&config)?);
    let _scheduler = scheduler::build_scheduler(
        store.clone(),
        scraper,
        pipeline,
        config.post_interval_minutes,
    )
    .await?;

    let auth = AuthState::from_env();
    let app = build_app(AppState { store }, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "dashboard listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_scraper(config: &AppConfig) -> anyhow::Result<DealScraper> {
    let sources_file = dealbot_core::load_sources(&config.sources_path)?;
    let scraper = DealScraper::new(ScraperConfig {
        sources: sources_file.sources,
        max_per_source: config.max_deals_per_source,
        timeout_secs: config.request_timeout_secs,
        ..ScraperConfig::default()
    })?;
    Ok(scraper)
}

fn build_pipeline(config: &AppConfig, store: Store) -> anyhow::Result<DealPostingPipeline> {
    let validator = LinkValidator::new(ValidatorConfig {
        timeout_secs: config.validator_timeout_secs,
        max_retries: config.validator_max_retries,
        max_concurrent: config.validator_max_concurrent,
        ..ValidatorConfig::default()
    });

    let generator = ContentGenerator::new(
        config.openai_api_key.as_deref(),
        config.request_timeout_secs,
    );

    let channel = match (&config.telegram_bot_token, &config.telegram_channel) {
        (Some(token), Some(chat_id)) => Some(ChannelTarget {
            client: ChannelClient::new(token, config.request_timeout_secs)?,
            chat_id: chat_id.clone(),
        }),
        _ => {
            tracing::warn!("telegram not configured; deals will be persisted without delivery");
            None
        }
    };

    Ok(DealPostingPipeline::new(
        AffiliateLinkBuilder::from_config(config),
        validator,
        generator,
        channel,
        store,
        PipelineConfig {
            source: "scraper".to_string(),
            style: ContentStyle::Enthusiastic,
            region: None,
            dedup_window: chrono::Duration::hours(config.dedup_window_hours),
            inter_post_delay: Duration::from_secs(config.inter_post_delay_secs),
        },
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
