//! Row types shared by both store variants.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// A row from the `deals` table.
///
/// Timestamps are stored zone-less (`TIMESTAMP`), always written as UTC wall
/// clock. Use [`DealRecord::posted_at_utc`] for window arithmetic so naive
/// and zone-annotated instants compare identically.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DealRecord {
    pub id: i64,
    pub title: String,
    pub price: String,
    pub discount: String,
    pub category: String,
    pub source: String,
    /// Empty when the scrape did not expose a product code.
    pub asin: String,
    pub affiliate_link: String,
    pub original_link: String,
    pub description: String,
    pub generated_content: String,
    pub content_style: String,
    pub rating: Decimal,
    pub review_count: i32,
    pub image_url: String,
    pub clicks: i32,
    pub conversions: i32,
    pub earnings: Decimal,
    pub posted_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub is_active: bool,
}

impl DealRecord {
    /// The posting instant with the stored naive timestamp pinned to UTC.
    #[must_use]
    pub fn posted_at_utc(&self) -> DateTime<Utc> {
        self.posted_at.and_utc()
    }
}

/// A row from the `users` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub category: String,
    pub region: String,
    pub language_code: String,
    pub is_active: bool,
    pub joined_at: NaiveDateTime,
    pub last_seen: NaiveDateTime,
    pub total_clicks: i32,
    pub total_conversions: i32,
    pub total_earnings: Decimal,
}

impl UserRecord {
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(first_name) = &self.first_name {
            first_name.clone()
        } else if let Some(username) = &self.username {
            format!("@{username}")
        } else {
            format!("User{}", self.user_id)
        }
    }
}

/// A row from the `click_events` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClickRecord {
    pub id: i64,
    pub deal_id: i64,
    /// Zero for anonymous dashboard clicks.
    pub user_id: i64,
    pub clicked_at: NaiveDateTime,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Aggregate counters for the dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DealStats {
    pub total_deals: i64,
    /// Deals posted in the last 24 hours.
    pub recent_deals: i64,
    pub total_clicks: i64,
    pub total_conversions: i64,
    pub total_earnings: Decimal,
    /// Users seen in the last 30 days.
    pub active_users: i64,
    pub category_breakdown: HashMap<String, i64>,
    pub source_breakdown: HashMap<String, i64>,
}

impl DealStats {
    /// Conversion rate as a percentage of clicks, 0.0 with no clicks.
    #[must_use]
    pub fn conversion_rate(&self) -> f64 {
        if self.total_clicks == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.total_conversions as f64 / self.total_clicks as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};

    fn minimal_deal(posted_at: NaiveDateTime) -> DealRecord {
        DealRecord {
            id: 1,
            title: "Deal".to_string(),
            price: "$1".to_string(),
            discount: String::new(),
            category: String::new(),
            source: "scraper".to_string(),
            asin: "B000000001".to_string(),
            affiliate_link: String::new(),
            original_link: String::new(),
            description: String::new(),
            generated_content: String::new(),
            content_style: "simple".to_string(),
            rating: Decimal::ZERO,
            review_count: 0,
            image_url: String::new(),
            clicks: 0,
            conversions: 0,
            earnings: Decimal::ZERO,
            posted_at,
            updated_at: posted_at,
            is_active: true,
        }
    }

    #[test]
    fn naive_and_zone_annotated_timestamps_agree_after_normalization() {
        // 10:30 UTC written naively vs. the same instant written at +05:30.
        let naive = chrono::NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let aware = FixedOffset::east_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 1, 16, 0, 0)
            .unwrap();

        let deal = minimal_deal(naive);
        assert_eq!(deal.posted_at_utc(), aware.with_timezone(&Utc));
    }

    #[test]
    fn display_name_prefers_first_name_then_username() {
        let mut user = UserRecord {
            id: 1,
            user_id: 42,
            username: Some("hunter".to_string()),
            first_name: Some("Dana".to_string()),
            last_name: None,
            category: "all".to_string(),
            region: "US".to_string(),
            language_code: "en".to_string(),
            is_active: true,
            joined_at: Utc::now().naive_utc(),
            last_seen: Utc::now().naive_utc(),
            total_clicks: 0,
            total_conversions: 0,
            total_earnings: Decimal::ZERO,
        };
        assert_eq!(user.display_name(), "Dana");
        user.first_name = None;
        assert_eq!(user.display_name(), "@hunter");
        user.username = None;
        assert_eq!(user.display_name(), "User42");
    }

    #[test]
    fn conversion_rate_handles_zero_clicks() {
        let stats = DealStats::default();
        assert!((stats.conversion_rate() - 0.0).abs() < f64::EPSILON);

        let stats = DealStats {
            total_clicks: 200,
            total_conversions: 30,
            ..DealStats::default()
        };
        assert!((stats.conversion_rate() - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn deal_record_serializes_for_the_dashboard() {
        let deal = minimal_deal(Utc::now().naive_utc());
        let json = serde_json::to_value(&deal).expect("serialize DealRecord");
        assert_eq!(json["asin"], "B000000001");
        assert!(json["posted_at"].is_string());
    }
}
