//! HTTP fetching of configured deal sources.

use std::time::Duration;

use reqwest::Client;

use dealbot_core::{Candidate, DealSource};

use crate::error::ScraperError;
use crate::extract::extract_candidates;

const BROWSER_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub sources: Vec<DealSource>,
    /// Candidates kept per source page.
    pub max_per_source: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Pause between source fetches; listing pages rate-limit aggressively.
    pub inter_source_delay: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            max_per_source: 5,
            timeout_secs: 30,
            user_agent: BROWSER_UA.to_string(),
            inter_source_delay: Duration::from_secs(5),
        }
    }
}

/// Fetches listing pages and turns them into candidates.
pub struct DealScraper {
    client: Client,
    config: ScraperConfig,
}

impl DealScraper {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client, config })
    }

    /// Scrape all configured sources, tolerating per-source failures.
    ///
    /// Failed sources are logged and skipped; the result is deduplicated by
    /// ASIN across sources (first occurrence wins). Candidates without an
    /// ASIN are kept as-is — dedup happens downstream only for stable ids.
    pub async fn scrape(&self) -> Vec<Candidate> {
        let mut all: Vec<Candidate> = Vec::new();

        for (index, source) in self.config.sources.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.inter_source_delay).await;
            }

            match self.fetch_source(source).await {
                Ok(candidates) => {
                    tracing::info!(
                        source = %source.url,
                        count = candidates.len(),
                        "scraped deal source"
                    );
                    all.extend(candidates);
                }
                Err(e) => {
                    tracing::warn!(source = %source.url, error = %e, "deal source failed");
                }
            }
        }

        let mut unique: Vec<Candidate> = Vec::new();
        for candidate in all {
            let duplicate = !candidate.asin.is_empty()
                && unique.iter().any(|c| c.asin == candidate.asin);
            if !duplicate {
                unique.push(candidate);
            }
        }

        tracing::info!(count = unique.len(), "scraped unique candidates");
        unique
    }

    /// Fetch one source page and extract up to `max_per_source` candidates.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] — HTTP 429 from the source.
    /// - [`ScraperError::UnexpectedStatus`] — any other non-200 status.
    /// - [`ScraperError::Http`] — network failure or body read error.
    pub async fn fetch_source(&self, source: &DealSource) -> Result<Vec<Candidate>, ScraperError> {
        let response = self.client.get(&source.url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScraperError::RateLimited {
                url: source.url.clone(),
            });
        }
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: source.url.clone(),
            });
        }

        let html = response.text().await?;
        let mut candidates = extract_candidates(&html, &source.url, &source.category);
        candidates.truncate(self.config.max_per_source);
        Ok(candidates)
    }
}
