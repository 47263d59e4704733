//! Duplicate suppression over the deal store.

use chrono::{Duration, Utc};

use dealbot_db::Store;

/// Decides whether a product was already published within the lookback
/// window.
///
/// Fails open: a store error is logged and treated as not-a-duplicate, so a
/// storage outage degrades to occasional repeat posts instead of blocking the
/// cycle entirely.
#[derive(Clone)]
pub struct DuplicateGuard {
    store: Store,
    window: Duration,
}

impl DuplicateGuard {
    #[must_use]
    pub fn new(store: Store, window: Duration) -> Self {
        Self { store, window }
    }

    /// True when a deal with this ASIN was posted within the window.
    ///
    /// No prior posting, a posting older than the window, or a failed lookup
    /// all allow posting. Stored timestamps are normalized to UTC before
    /// comparison, so zone-less and zone-annotated instants behave alike.
    pub async fn is_duplicate(&self, asin: &str) -> bool {
        match self.store.latest_deal_by_asin(asin).await {
            Ok(Some(deal)) => {
                let age = Utc::now() - deal.posted_at_utc();
                if age < self.window {
                    tracing::info!(
                        asin,
                        age_minutes = age.num_minutes(),
                        "recent posting found within lookback window"
                    );
                    true
                } else {
                    tracing::debug!(
                        asin,
                        age_minutes = age.num_minutes(),
                        "prior posting is outside the lookback window"
                    );
                    false
                }
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(asin, error = %e, "duplicate check failed; allowing post");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealbot_core::{Candidate, ContentStyle};
    use dealbot_db::{MemoryStore, PgStore};

    fn candidate(asin: &str) -> Candidate {
        Candidate {
            title: format!("Product {asin}"),
            price: "$9.99".to_string(),
            link: format!("https://www.amazon.com/dp/{asin}"),
            asin: asin.to_string(),
            ..Candidate::default()
        }
    }

    /// Insert a deal for `asin` and backdate it `minutes_ago`.
    async fn seed(memory: &MemoryStore, asin: &str, minutes_ago: i64) {
        let store = Store::Memory(memory.clone());
        let deal = store
            .add_deal(&candidate(asin), "https://aff", "scraper", ContentStyle::Simple, "")
            .await
            .expect("seed deal");
        memory
            .backdate_deal(deal.id, (Utc::now() - Duration::minutes(minutes_ago)).naive_utc())
            .await;
    }

    #[tokio::test]
    async fn unknown_asin_is_not_a_duplicate() {
        let guard = DuplicateGuard::new(Store::Memory(MemoryStore::new()), Duration::hours(2));
        assert!(!guard.is_duplicate("B0NEVERSEEN").await);
    }

    #[tokio::test]
    async fn posting_ten_minutes_ago_is_a_duplicate() {
        let memory = MemoryStore::new();
        seed(&memory, "B0RECENT001", 10).await;

        let guard = DuplicateGuard::new(Store::Memory(memory), Duration::hours(2));
        assert!(guard.is_duplicate("B0RECENT001").await);
    }

    #[tokio::test]
    async fn posting_three_hours_ago_is_not_a_duplicate() {
        let memory = MemoryStore::new();
        seed(&memory, "B0STALE0001", 180).await;

        let guard = DuplicateGuard::new(Store::Memory(memory), Duration::hours(2));
        assert!(!guard.is_duplicate("B0STALE0001").await);
    }

    #[tokio::test]
    async fn store_failure_fails_open() {
        // A lazy pool pointed at a dead address: every query errors, nothing
        // panics, and the guard answers "not a duplicate".
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:1/nothing")
            .expect("lazy pool");
        let guard = DuplicateGuard::new(Store::Postgres(PgStore::new(pool)), Duration::hours(2));

        assert!(!guard.is_duplicate("B0ANYTHING1").await);
    }
}
