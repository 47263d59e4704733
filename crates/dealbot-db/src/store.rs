//! The storage entry point.
//!
//! A closed two-variant enum selected once at startup: Postgres when
//! `DATABASE_URL` is configured, in-memory otherwise. Call sites never
//! inspect the variant — every operation dispatches through the single
//! match below.

use dealbot_core::{AppConfig, Candidate, ContentStyle};

use crate::memory::MemoryStore;
use crate::pg::PgStore;
use crate::types::{ClickRecord, DealRecord, DealStats, UserRecord};
use crate::{connect_pool, run_migrations, PoolConfig, StoreError};

#[derive(Clone)]
pub enum Store {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl Store {
    /// Select and initialize the variant for this process.
    ///
    /// With a database URL this connects the pool and runs migrations; without
    /// one it falls back to the bounded in-memory store with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the Postgres pool cannot be established or a
    /// migration fails. A configured-but-broken database is an error, not a
    /// silent fallback.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        match &config.database_url {
            Some(database_url) => {
                let pool = connect_pool(database_url, PoolConfig::from_app_config(config)).await?;
                let applied = run_migrations(&pool).await?;
                if applied > 0 {
                    tracing::info!(applied, "applied pending migrations");
                }
                tracing::info!("using Postgres store");
                Ok(Store::Postgres(PgStore::new(pool)))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store");
                Ok(Store::Memory(MemoryStore::new()))
            }
        }
    }

    /// Record a processed deal.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    pub async fn add_deal(
        &self,
        candidate: &Candidate,
        affiliate_link: &str,
        source: &str,
        style: ContentStyle,
        generated_content: &str,
    ) -> Result<DealRecord, StoreError> {
        match self {
            Store::Postgres(store) => {
                store
                    .add_deal(candidate, affiliate_link, source, style, generated_content)
                    .await
            }
            Store::Memory(store) => {
                store
                    .add_deal(candidate, affiliate_link, source, style, generated_content)
                    .await
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails.
    pub async fn get_deal(&self, deal_id: i64) -> Result<Option<DealRecord>, StoreError> {
        match self {
            Store::Postgres(store) => store.get_deal(deal_id).await,
            Store::Memory(store) => store.get_deal(deal_id).await,
        }
    }

    /// Most recently posted deal carrying `asin`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails.
    pub async fn latest_deal_by_asin(&self, asin: &str) -> Result<Option<DealRecord>, StoreError> {
        match self {
            Store::Postgres(store) => store.latest_deal_by_asin(asin).await,
            Store::Memory(store) => store.latest_deal_by_asin(asin).await,
        }
    }

    /// Active deals posted within the last `hours`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub async fn recent_deals(
        &self,
        hours: i64,
        limit: i64,
        category: Option<&str>,
    ) -> Result<Vec<DealRecord>, StoreError> {
        match self {
            Store::Postgres(store) => store.recent_deals(hours, limit, category).await,
            Store::Memory(store) => store.recent_deals(hours, limit, category).await,
        }
    }

    /// Record a click event and bump the deal's click counter.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown deal, or
    /// [`StoreError`] if the write fails.
    pub async fn record_click(
        &self,
        deal_id: i64,
        user_id: i64,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        referrer: Option<&str>,
    ) -> Result<ClickRecord, StoreError> {
        match self {
            Store::Postgres(store) => {
                store
                    .record_click(deal_id, user_id, ip_address, user_agent, referrer)
                    .await
            }
            Store::Memory(store) => {
                store
                    .record_click(deal_id, user_id, ip_address, user_agent, referrer)
                    .await
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if any aggregate query fails.
    pub async fn deal_stats(&self) -> Result<DealStats, StoreError> {
        match self {
            Store::Postgres(store) => store.deal_stats().await,
            Store::Memory(store) => store.deal_stats().await,
        }
    }

    /// Delete deals older than `days`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    pub async fn cleanup_old_deals(&self, days: i64) -> Result<u64, StoreError> {
        match self {
            Store::Postgres(store) => store.cleanup_old_deals(days).await,
            Store::Memory(store) => store.cleanup_old_deals(days).await,
        }
    }

    /// Insert a user or refresh their `last_seen`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    pub async fn upsert_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<UserRecord, StoreError> {
        match self {
            Store::Postgres(store) => {
                store
                    .upsert_user(user_id, username, first_name, last_name)
                    .await
            }
            Store::Memory(store) => {
                store
                    .upsert_user(user_id, username, first_name, last_name)
                    .await
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails.
    pub async fn get_user(&self, user_id: i64) -> Result<Option<UserRecord>, StoreError> {
        match self {
            Store::Postgres(store) => store.get_user(user_id).await,
            Store::Memory(store) => store.get_user(user_id).await,
        }
    }

    /// Users seen within the last `days`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub async fn active_users(&self, days: i64) -> Result<Vec<UserRecord>, StoreError> {
        match self {
            Store::Postgres(store) => store.active_users(days).await,
            Store::Memory(store) => store.active_users(days).await,
        }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store is unreachable. The
    /// in-memory variant is always healthy.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        match self {
            Store::Postgres(store) => store.health_check().await,
            Store::Memory(_) => Ok(()),
        }
    }
}
