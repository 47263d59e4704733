use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::models::Region;

#[derive(Clone)]
pub struct AppConfig {
    /// `None` selects the in-memory store at startup.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub log_level: String,

    pub affiliate_tag: String,
    /// Per-region tag overrides; regions without an override use
    /// `affiliate_tag`.
    pub regional_affiliate_tags: HashMap<Region, String>,
    pub default_region: Region,

    pub telegram_bot_token: Option<String>,
    pub telegram_channel: Option<String>,
    pub openai_api_key: Option<String>,

    pub sources_path: PathBuf,
    pub max_deals_per_source: usize,
    pub post_interval_minutes: u32,
    pub request_timeout_secs: u64,
    pub inter_post_delay_secs: u64,
    pub dedup_window_hours: i64,

    pub validator_timeout_secs: u64,
    pub validator_max_retries: u32,
    pub validator_max_concurrent: usize,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url.as_ref().map(|_| "[redacted]"))
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("affiliate_tag", &self.affiliate_tag)
            .field("default_region", &self.default_region)
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "[redacted]"),
            )
            .field("telegram_channel", &self.telegram_channel)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("sources_path", &self.sources_path)
            .field("max_deals_per_source", &self.max_deals_per_source)
            .field("post_interval_minutes", &self.post_interval_minutes)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("inter_post_delay_secs", &self.inter_post_delay_secs)
            .field("dedup_window_hours", &self.dedup_window_hours)
            .field("validator_timeout_secs", &self.validator_timeout_secs)
            .field("validator_max_retries", &self.validator_max_retries)
            .field("validator_max_concurrent", &self.validator_max_concurrent)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// The affiliate tag to use for a region, falling back to the base tag.
    #[must_use]
    pub fn affiliate_tag_for(&self, region: Region) -> &str {
        self.regional_affiliate_tags
            .get(&region)
            .map_or(self.affiliate_tag.as_str(), String::as_str)
    }
}
