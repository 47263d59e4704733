//! CLI command implementations.

use std::time::Duration;

use dealbot_channel::ChannelClient;
use dealbot_content::ContentGenerator;
use dealbot_core::{AffiliateLinkBuilder, AppConfig, ContentStyle};
use dealbot_db::Store;
use dealbot_pipeline::{ChannelTarget, DealPostingPipeline, PipelineConfig};
use dealbot_scraper::{DealScraper, ScraperConfig};
use dealbot_validator::{LinkValidator, ValidationStats, ValidatorConfig};

/// Scrape the configured sources and run one posting cycle.
pub async fn post() -> anyhow::Result<()> {
    let config = dealbot_core::load_app_config()?;
    let store = Store::from_config(&config).await?;

    let sources_file = dealbot_core::load_sources(&config.sources_path)?;
    let scraper = DealScraper::new(ScraperConfig {
        sources: sources_file.sources,
        max_per_source: config.max_deals_per_source,
        timeout_secs: config.request_timeout_secs,
        ..ScraperConfig::default()
    })?;

    let candidates = scraper.scrape().await;
    if candidates.is_empty() {
        println!("no candidates scraped");
        return Ok(());
    }

    let pipeline = build_pipeline(&config, store)?;
    let posted = pipeline.run_cycle(&candidates).await;
    println!("posted {posted} deal(s) from {} candidate(s)", candidates.len());
    Ok(())
}

pub async fn recent(hours: i64, limit: i64, category: Option<&str>) -> anyhow::Result<()> {
    let config = dealbot_core::load_app_config()?;
    let store = Store::from_config(&config).await?;

    let deals = store.recent_deals(hours, limit, category).await?;
    if deals.is_empty() {
        println!("no deals posted in the last {hours}h");
        return Ok(());
    }

    for deal in deals {
        println!(
            "#{id} [{posted}] {title} — {price} {discount} (asin: {asin}, clicks: {clicks})",
            id = deal.id,
            posted = deal.posted_at.format("%Y-%m-%d %H:%M"),
            title = deal.title,
            price = deal.price,
            discount = deal.discount,
            asin = if deal.asin.is_empty() { "-" } else { &deal.asin },
            clicks = deal.clicks,
        );
    }
    Ok(())
}

pub async fn stats() -> anyhow::Result<()> {
    let config = dealbot_core::load_app_config()?;
    let store = Store::from_config(&config).await?;

    let stats = store.deal_stats().await?;
    println!("total deals:       {}", stats.total_deals);
    println!("posted last 24h:   {}", stats.recent_deals);
    println!("total clicks:      {}", stats.total_clicks);
    println!("total conversions: {}", stats.total_conversions);
    println!("total earnings:    {}", stats.total_earnings);
    println!("active users:      {}", stats.active_users);
    println!("conversion rate:   {:.1}%", stats.conversion_rate());

    if !stats.category_breakdown.is_empty() {
        println!("by category:");
        let mut categories: Vec<_> = stats.category_breakdown.iter().collect();
        categories.sort_by_key(|(_, count)| std::cmp::Reverse(**count));
        for (category, count) in categories {
            let label = if category.is_empty() { "(none)" } else { category };
            println!("  {label}: {count}");
        }
    }
    Ok(())
}

pub async fn cleanup(days: i64) -> anyhow::Result<()> {
    let config = dealbot_core::load_app_config()?;
    let store = Store::from_config(&config).await?;

    let removed = store.cleanup_old_deals(days).await?;
    println!("removed {removed} deal(s) older than {days} day(s)");
    Ok(())
}

/// Ad-hoc batch validation: prints one line per URL plus a summary.
pub async fn validate(urls: &[String]) -> anyhow::Result<()> {
    let config = dealbot_core::load_app_config()?;
    let validator = LinkValidator::new(ValidatorConfig {
        timeout_secs: config.validator_timeout_secs,
        max_retries: config.validator_max_retries,
        max_concurrent: config.validator_max_concurrent,
        ..ValidatorConfig::default()
    });

    let outcomes = validator.validate_batch(urls).await?;
    for outcome in &outcomes {
        if outcome.is_valid {
            println!(
                "ok    {} ({} in {}ms)",
                outcome.url,
                outcome.status_code.unwrap_or(0),
                outcome.elapsed.as_millis(),
            );
        } else {
            println!(
                "FAIL  {} ({})",
                outcome.url,
                outcome
                    .failure
                    .as_ref()
                    .map_or_else(|| "unknown".to_string(), ToString::to_string),
            );
        }
    }

    let stats = ValidationStats::from_outcomes(&outcomes);
    println!(
        "{}/{} valid ({:.1}%)",
        stats.valid, stats.total, stats.success_rate
    );
    validator.close().await;
    Ok(())
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
