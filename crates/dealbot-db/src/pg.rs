//! Postgres-backed store variant.

use chrono::{Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;

use dealbot_core::{Candidate, ContentStyle};

use crate::types::{ClickRecord, DealRecord, DealStats, UserRecord};
use crate::StoreError;

const DEAL_COLUMNS: &str = "id, title, price, discount, category, source, asin, affiliate_link, \
     original_link, description, generated_content, content_style, rating, review_count, \
     image_url, clicks, conversions, earnings, posted_at, updated_at, is_active";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) async fn add_deal(
        &self,
        candidate: &Candidate,
        affiliate_link: &str,
        source: &str,
        style: ContentStyle,
        generated_content: &str,
    ) -> Result<DealRecord, StoreError> {
        let rating = Decimal::try_from(candidate.rating).unwrap_or_default();
        let review_count = i32::try_from(candidate.review_count).unwrap_or(i32::MAX);

        let deal = sqlx::query_as::<_, DealRecord>(&format!(
            "INSERT INTO deals \
                 (title, price, discount, category, source, asin, affiliate_link, \
                  original_link, description, generated_content, content_style, rating, \
                  review_count, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {DEAL_COLUMNS}"
        ))
        .bind(&candidate.title)
        .bind(&candidate.price)
        .bind(&candidate.discount)
        .bind(&candidate.category)
        .bind(source)
        .bind(&candidate.asin)
        .bind(affiliate_link)
        .bind(&candidate.link)
        .bind(&candidate.description)
        .bind(generated_content)
        .bind(style.to_string())
        .bind(rating)
        .bind(review_count)
        .bind(&candidate.image_url)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(deal_id = deal.id, asin = %deal.asin, "deal recorded");
        Ok(deal)
    }

    pub(crate) async fn get_deal(&self, deal_id: i64) -> Result<Option<DealRecord>, StoreError> {
        let deal = sqlx::query_as::<_, DealRecord>(&format!(
            "SELECT {DEAL_COLUMNS} FROM deals WHERE id = $1"
        ))
        .bind(deal_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(deal)
    }

    pub(crate) async fn latest_deal_by_asin(
        &self,
        asin: &str,
    ) -> Result<Option<DealRecord>, StoreError> {
        let deal = sqlx::query_as::<_, DealRecord>(&format!(
            "SELECT {DEAL_COLUMNS} FROM deals WHERE asin = $1 \
             ORDER BY posted_at DESC LIMIT 1"
        ))
        .bind(asin)
        .fetch_optional(&self.pool)
        .await?;
        Ok(deal)
    }

    pub(crate) async fn recent_deals(
        &self,
        hours: i64,
        limit: i64,
        category: Option<&str>,
    ) -> Result<Vec<DealRecord>, StoreError> {
        let cutoff: NaiveDateTime = (Utc::now() - Duration::hours(hours)).naive_utc();

        let deals = match category.filter(|c| !c.is_empty() && *c != "all") {
            Some(category) => {
                sqlx::query_as::<_, DealRecord>(&format!(
                    "SELECT {DEAL_COLUMNS} FROM deals \
                     WHERE is_active = TRUE AND posted_at >= $1 AND category = $2 \
                     ORDER BY posted_at DESC LIMIT $3"
                ))
                .bind(cutoff)
                .bind(category)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DealRecord>(&format!(
                    "SELECT {DEAL_COLUMNS} FROM deals \
                     WHERE is_active = TRUE AND posted_at >= $1 \
                     ORDER BY posted_at DESC LIMIT $2"
                ))
                .bind(cutoff)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

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
        let click = sqlx::query_as::<_, ClickRecord>(
            "INSERT INTO click_events (deal_id, user_id, ip_address, user_agent, referrer) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, deal_id, user_id, clicked_at, ip_address, user_agent, referrer",
        )
        .bind(deal_id)
        .bind(user_id)
        .bind(ip_address)
        .bind(user_agent)
        .bind(referrer)
        .fetch_one(&self.pool)
        .await?;

        sqlx::query("UPDATE deals SET clicks = clicks + 1, updated_at = $2 WHERE id = $1")
            .bind(deal_id)
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?;

        Ok(click)
    }

    pub(crate) async fn deal_stats(&self) -> Result<DealStats, StoreError> {
        let (total_deals, total_clicks, total_conversions, total_earnings): (
            i64,
            i64,
            i64,
            Decimal,
        ) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(clicks), 0)::BIGINT, \
                    COALESCE(SUM(conversions), 0)::BIGINT, COALESCE(SUM(earnings), 0) \
             FROM deals WHERE is_active = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;

        let day_ago = (Utc::now() - Duration::hours(24)).naive_utc();
        let recent_deals: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM deals WHERE is_active = TRUE AND posted_at >= $1",
        )
        .bind(day_ago)
        .fetch_one(&self.pool)
        .await?;

        let month_ago = (Utc::now() - Duration::days(30)).naive_utc();
        let active_users: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE is_active = TRUE AND last_seen >= $1",
        )
        .bind(month_ago)
        .fetch_one(&self.pool)
        .await?;

        let category_rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT category, COUNT(*) FROM deals WHERE is_active = TRUE \
             GROUP BY category ORDER BY COUNT(*) DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let source_rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT source, COUNT(*) FROM deals WHERE is_active = TRUE \
             GROUP BY source ORDER BY COUNT(*) DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(DealStats {
            total_deals,
            recent_deals,
            total_clicks,
            total_conversions,
            total_earnings,
            active_users,
            category_breakdown: category_rows.into_iter().collect::<HashMap<_, _>>(),
            source_breakdown: source_rows.into_iter().collect::<HashMap<_, _>>(),
        })
    }

    pub(crate) async fn cleanup_old_deals(&self, days: i64) -> Result<u64, StoreError> {
        let cutoff = (Utc::now() - Duration::days(days)).naive_utc();
        let result = sqlx::query("DELETE FROM deals WHERE posted_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            tracing::info!(deleted, days, "cleaned up old deals");
        }
        Ok(deleted)
    }

    pub(crate) async fn upsert_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<UserRecord, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, username, first_name, last_name) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE SET last_seen = $5 \
             RETURNING id, user_id, username, first_name, last_name, category, region, \
                       language_code, is_active, joined_at, last_seen, total_clicks, \
                       total_conversions, total_earnings",
        )
        .bind(user_id)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub(crate) async fn get_user(&self, user_id: i64) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, user_id, username, first_name, last_name, category, region, \
                    language_code, is_active, joined_at, last_seen, total_clicks, \
                    total_conversions, total_earnings \
             FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub(crate) async fn active_users(&self, days: i64) -> Result<Vec<UserRecord>, StoreError> {
        let cutoff = (Utc::now() - Duration::days(days)).naive_utc();
        let users = sqlx::query_as::<_, UserRecord>(
            "SELECT id, user_id, username, first_name, last_name, category, region, \
                    language_code, is_active, joined_at, last_seen, total_clicks, \
                    total_conversions, total_earnings \
             FROM users WHERE is_active = TRUE AND last_seen >= $1 \
             ORDER BY last_seen DESC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub(crate) async fn health_check(&self) -> Result<(), StoreError> {
        crate::ping(&self.pool).await?;
        Ok(())
    }
}
