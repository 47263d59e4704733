//! In-memory store variant.
//!
//! Stands in for Postgres when `DATABASE_URL` is not configured, with the
//! same observable behavior. Bounded: once `max_deals` rows are held, writes
//! are refused instead of growing without limit.

use chrono::{Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use dealbot_core::{Candidate, ContentStyle};

use crate::types::{ClickRecord, DealRecord, DealStats, UserRecord};
use crate::StoreError;

const DEFAULT_MAX_DEALS: usize = 10_000;

#[derive(Default)]
struct Inner {
    deals: Vec<DealRecord>,
    users: Vec<UserRecord>,
    clicks: Vec<ClickRecord>,
    next_deal_id: i64,
    next_user_id: i64,
    next_click_id: i64,
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    max_deals: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_deals(DEFAULT_MAX_DEALS)
    }

    /// A store refusing deal writes beyond `max_deals` rows.
    #[must_use]
    pub fn with_max_deals(max_deals: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            max_deals,
        }
    }

    pub(crate) async fn add_deal(
        &self,
        candidate: &Candidate,
        affiliate_link: &str,
        source: &str,
        style: ContentStyle,
        generated_content: &str,
    ) -> Result<DealRecord, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.deals.len() >= self.max_deals {
            return Err(StoreError::Unavailable(format!(
                "in-memory deal capacity {} reached",
                self.max_deals
            )));
        }

        inner.next_deal_id += 1;
        let now = Utc::now().naive_utc();
        let deal = DealRecord {
            id: inner.next_deal_id,
            title: candidate.title.clone(),
            price: candidate.price.clone(),
            discount: candidate.discount.clone(),
            category: candidate.category.clone(),
            source: source.to_string(),
            asin: candidate.asin.clone(),
            affiliate_link: affiliate_link.to_string(),
            original_link: candidate.link.clone(),
            description: candidate.description.clone(),
            generated_content: generated_content.to_string(),
            content_style: style.to_string(),
            rating: Decimal::try_from(candidate.rating).unwrap_or_default(),
            review_count: i32::try_from(candidate.review_count).unwrap_or(i32::MAX),
            image_url: candidate.image_url.clone(),
            clicks: 0,
            conversions: 0,
            earnings: Decimal::ZERO,
            posted_at: now,
            updated_at: now,
            is_active: true,
        };
        inner.deals.push(deal.clone());
        Ok(deal)
    }

    pub(crate) async fn get_deal(&self, deal_id: i64) -> Result<Option<DealRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.deals.iter().find(|d| d.id == deal_id).cloned())
    }

    pub(crate) async fn latest_deal_by_asin(
        &self,
        asin: &str,
    ) -> Result<Option<DealRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .deals
            .iter()
            .filter(|d| d.asin == asin)
            .max_by_key(|d| d.posted_at)
            .cloned())
    }

    pub(crate) async fn recent_deals(
        &self,
        hours: i64,
        limit: i64,
        category: Option<&str>,
    ) -> Result<Vec<DealRecord>, StoreError> {
        let cutoff: NaiveDateTime = (Utc::now() - Duration::hours(hours)).naive_utc();
        let inner = self.inner.lock().await;

        let mut deals: Vec<DealRecord> = inner
            .deals
            .iter()
            .filter(|d| d.is_active && d.posted_at >= cutoff)
            .filter(|d| match category.filter(|c| !c.is_empty() && *c != "all") {
                Some(category) => d.category == category,
                None => true,
            })
            .cloned()
            .collect();
        deals.sort_by_key(|d| std::cmp::Reverse(d.posted_at));
        deals.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(deals)
    }

    pub(crate) async fn record_click(
        &self,
        deal_id: i64,
        user_id: i64,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        referrer: Option<&str>,
    ) -> Result<ClickRecord, StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.deals.iter().any(|d| d.id == deal_id) {
            return Err(StoreError::NotFound);
        }

        inner.next_click_id += 1;
        let click = ClickRecord {
            id: inner.next_click_id,
            deal_id,
            user_id,
            clicked_at: Utc::now().naive_utc(),
            ip_address: ip_address.map(ToOwned::to_owned),
            user_agent: user_agent.map(ToOwned::to_owned),
            referrer: referrer.map(ToOwned::to_owned),
        };
        inner.clicks.push(click.clone());

        if let Some(deal) = inner.deals.iter_mut().find(|d| d.id == deal_id) {
            deal.clicks += 1;
            deal.updated_at = Utc::now().naive_utc();
        }
        Ok(click)
    }

    pub(crate) async fn deal_stats(&self) -> Result<DealStats, StoreError> {
        let inner = self.inner.lock().await;
        let day_ago = (Utc::now() - Duration::hours(24)).naive_utc();
        let month_ago = (Utc::now() - Duration::days(30)).naive_utc();

        let active: Vec<&DealRecord> = inner.deals.iter().filter(|d| d.is_active).collect();

        let mut category_breakdown: HashMap<String, i64> = HashMap::new();
        let mut source_breakdown: HashMap<String, i64> = HashMap::new();
        for deal in &active {
            *category_breakdown.entry(deal.category.clone()).or_insert(0) += 1;
            *source_breakdown.entry(deal.source.clone()).or_insert(0) += 1;
        }

        let recent = active.iter().filter(|d| d.posted_at >= day_ago).count();
        let active_users = inner
            .users
            .iter()
            .filter(|u| u.is_active && u.last_seen >= month_ago)
            .count();

        Ok(DealStats {
            total_deals: i64::try_from(active.len()).unwrap_or(i64::MAX),
            recent_deals: i64::try_from(recent).unwrap_or(i64::MAX),
            total_clicks: active.iter().map(|d| i64::from(d.clicks)).sum(),
            total_conversions: active.iter().map(|d| i64::from(d.conversions)).sum(),
            total_earnings: active.iter().map(|d| d.earnings).sum(),
            active_users: i64::try_from(active_users).unwrap_or(i64::MAX),
            category_breakdown,
            source_breakdown,
        })
    }

    pub(crate) async fn cleanup_old_deals(&self, days: i64) -> Result<u64, StoreError> {
        let cutoff = (Utc::now() - Duration::days(days)).naive_utc();
        let mut inner = self.inner.lock().await;
        let before = inner.deals.len();
        inner.deals.retain(|d| d.posted_at >= cutoff);
        Ok(u64::try_from(before - inner.deals.len()).unwrap_or(0))
    }

    pub(crate) async fn upsert_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now().naive_utc();

        if let Some(user) = inner.users.iter_mut().find(|u| u.user_id == user_id) {
            user.last_seen = now;
            return Ok(user.clone());
        }

        inner.next_user_id += 1;
        let user = UserRecord {
            id: inner.next_user_id,
            user_id,
            username: username.map(ToOwned::to_owned),
            first_name: first_name.map(ToOwned::to_owned),
            last_name: last_name.map(ToOwned::to_owned),
            category: "all".to_string(),
            region: "US".to_string(),
            language_code: "en".to_string(),
            is_active: true,
            joined_at: now,
            last_seen: now,
            total_clicks: 0,
            total_conversions: 0,
            total_earnings: Decimal::ZERO,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    pub(crate) async fn get_user(&self, user_id: i64) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    pub(crate) async fn active_users(&self, days: i64) -> Result<Vec<UserRecord>, StoreError> {
        let cutoff = (Utc::now() - Duration::days(days)).naive_utc();
        let inner = self.inner.lock().await;
        let mut users: Vec<UserRecord> = inner
            .users
            .iter()
            .filter(|u| u.is_active && u.last_seen >= cutoff)
            .cloned()
            .collect();
        users.sort_by_key(|u| std::cmp::Reverse(u.last_seen));
        Ok(users)
    }

    /// Backdate a deal's posting time. Supports window tests and manual
    /// repost scenarios; Postgres deployments do this with SQL directly.
    pub async fn backdate_deal(&self, deal_id: i64, posted_at: NaiveDateTime) {
        let mut inner = self.inner.lock().await;
        if let Some(deal) = inner.deals.iter_mut().find(|d| d.id == deal_id) {
            deal.posted_at = posted_at;
        }
    }
}
