//! End-to-end posting-cycle tests over the in-memory store and wiremock
//! servers for the marketplace and the channel.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dealbot_channel::ChannelClient;
use dealbot_content::ContentGenerator;
use dealbot_core::{AffiliateLinkBuilder, Candidate, ContentStyle, Region};
use dealbot_db::{MemoryStore, Store};
use dealbot_pipeline::{ChannelTarget, DealPostingPipeline, PipelineConfig};
use dealbot_validator::{LinkValidator, ValidatorConfig};

fn link_builder() -> AffiliateLinkBuilder {
    AffiliateLinkBuilder::new("dealhunt-21".to_string(), HashMap::new(), Region::In)
}

fn validator() -> LinkValidator {
    LinkValidator::new(ValidatorConfig {
        timeout_secs: 5,
        max_retries: 0,
        retry_delay: Duration::ZERO,
        max_concurrent: 4,
        allowed_domains: vec!["127.0.0.1".to_string()],
        user_agent: "dealbot-test/0.1".to_string(),
    })
}

fn test_config() -> PipelineConfig {
    PipelineConfig {
        source: "scraper".to_string(),
        style: ContentStyle::Simple,
        region: None,
        dedup_window: chrono::Duration::hours(2),
        inter_post_delay: Duration::ZERO,
    }
}

fn pipeline(store: Store, channel: Option<ChannelTarget>) -> DealPostingPipeline {
    DealPostingPipeline::new(
        link_builder(),
        validator(),
        ContentGenerator::new(None, 5),
        channel,
        store,
        test_config(),
    )
}

/// Candidate whose link has no product path, so the affiliate builder keeps
/// the mock server's host and just appends the tag.
fn candidate(server: &MockServer, slug: &str, asin: &str) -> Candidate {
    Candidate {
        title: format!("Deal {slug}"),
        price: "$19.99".to_string(),
        discount: "30% off".to_string(),
        link: format!("{}/deal/{slug}", server.uri()),
        category: "electronics".to_string(),
        asin: asin.to_string(),
        ..Candidate::default()
    }
}

async fn mount_deal_page(server: &MockServer, slug: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/deal/{slug}")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// The three-candidate scenario: dead link, recent duplicate, fresh deal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cycle_drops_dead_link_and_duplicate_but_posts_fresh_deal() {
    let amazon = MockServer::start().await;
    mount_deal_page(&amazon, "dead", 404).await;
    mount_deal_page(&amazon, "dup", 200).await;
    mount_deal_page(&amazon, "fresh", 200).await;

    let memory = MemoryStore::new();
    let store = Store::Memory(memory.clone());

    // Candidate B's product was already posted five minutes ago.
    let b = candidate(&amazon, "dup", "B0DUPLICAT1");
    let prior = store
        .add_deal(&b, "https://aff/prior", "scraper", ContentStyle::Simple, "")
        .await
        .expect("seed duplicate");
    memory
        .backdate_deal(prior.id, (Utc::now() - chrono::Duration::minutes(5)).naive_utc())
        .await;

    let a = candidate(&amazon, "dead", "B0DEADLINK1");
    let c = candidate(&amazon, "fresh", "B0FRESHDEA1");

    let posted = pipeline(store.clone(), None)
        .run_cycle(&[a, b, c])
        .await;
    assert_eq!(posted, 1, "only the fresh candidate should be processed");

    let recent = store.recent_deals(24, 50, None).await.expect("recent");
    assert!(
        recent.iter().any(|d| d.asin == "B0FRESHDEA1"),
        "fresh deal missing from recent deals"
    );
    assert!(
        !recent.iter().any(|d| d.asin == "B0DEADLINK1"),
        "dead-link deal must not be persisted"
    );
    let dup_rows = recent.iter().filter(|d| d.asin == "B0DUPLICAT1").count();
    assert_eq!(dup_rows, 1, "duplicate must not produce a second row");
}

#[tokio::test]
async fn empty_input_returns_zero() {
    let store = Store::Memory(MemoryStore::new());
    assert_eq!(pipeline(store, None).run_cycle(&[]).await, 0);
}

#[tokio::test]
async fn unpostable_candidates_are_dropped_before_validation() {
    let store = Store::Memory(MemoryStore::new());
    let incomplete = Candidate {
        title: "No price, no link".to_string(),
        ..Candidate::default()
    };

    let posted = pipeline(store.clone(), None).run_cycle(&[incomplete]).await;
    assert_eq!(posted, 0);
    assert!(store.recent_deals(24, 50, None).await.expect("recent").is_empty());
}

// ---------------------------------------------------------------------------
// Failure containment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn storage_failure_for_one_candidate_does_not_stop_the_cycle() {
    let amazon = MockServer::start().await;
    for slug in ["one", "two", "three"] {
        mount_deal_page(&amazon, slug, 200).await;
    }

    // Capacity 2: the third persistence attempt fails, the cycle continues
    // and reports the two that made it.
    let store = Store::Memory(MemoryStore::with_max_deals(2));
    let candidates = vec![
        candidate(&amazon, "one", "B0CANDID001"),
        candidate(&amazon, "two", "B0CANDID002"),
        candidate(&amazon, "three", "B0CANDID003"),
    ];

    let posted = pipeline(store.clone(), None).run_cycle(&candidates).await;
    assert_eq!(posted, 2);
}

#[tokio::test]
async fn channel_delivery_failure_still_persists_the_deal() {
    let amazon = MockServer::start().await;
    mount_deal_page(&amazon, "fresh", 200).await;

    let telegram = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:token/sendMessage"))
        .respond_with(ResponseTemplate::new(400).set_body_json(&json!({
            "ok": false,
            "description": "Bad Request: chat not found"
        })))
        .expect(1)
        .mount(&telegram)
        .await;

    let channel = ChannelTarget {
        client: ChannelClient::with_base_url("123:token", 5, &telegram.uri()).expect("client"),
        chat_id: "@deals_channel".to_string(),
    };

    let store = Store::Memory(MemoryStore::new());
    let posted = pipeline(store.clone(), Some(channel))
        .run_cycle(&[candidate(&amazon, "fresh", "B0FRESHDEA1")])
        .await;

    assert_eq!(posted, 1, "delivery failure must not drop the deal");
    let recent = store.recent_deals(24, 50, None).await.expect("recent");
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].asin, "B0FRESHDEA1");
}

#[tokio::test]
async fn successful_delivery_records_generated_content() {
    let amazon = MockServer::start().await;
    mount_deal_page(&amazon, "fresh", 200).await;

    let telegram = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:token/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "ok": true,
            "result": { "message_id": 7 }
        })))
        .expect(1)
        .mount(&telegram)
        .await;

    let channel = ChannelTarget {
        client: ChannelClient::with_base_url("123:token", 5, &telegram.uri()).expect("client"),
        chat_id: "@deals_channel".to_string(),
    };

    let store = Store::Memory(MemoryStore::new());
    pipeline(store.clone(), Some(channel))
        .run_cycle(&[candidate(&amazon, "fresh", "B0FRESHDEA1")])
        .await;

    let recent = store.recent_deals(24, 50, None).await.expect("recent");
    assert_eq!(recent.len(), 1);
    let deal = &recent[0];
    assert!(
        deal.generated_content.contains("tag=dealhunt-21"),
        "message should carry the affiliate link: {}",
        deal.generated_content
    );
    assert!(deal.affiliate_link.contains("tag=dealhunt-21"));
    assert_eq!(deal.original_link, format!("{}/deal/fresh", amazon.uri()));
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn candidates_post_in_input_order() {
    let amazon = MockServer::start().await;
    for slug in ["one", "two", "three"] {
        mount_deal_page(&amazon, slug, 200).await;
    }

    let store = Store::Memory(MemoryStore::new());
    let candidates = vec![
        candidate(&amazon, "one", "B0CANDID001"),
        candidate(&amazon, "two", "B0CANDID002"),
        candidate(&amazon, "three", "B0CANDID003"),
    ];

    let posted = pipeline(store.clone(), None).run_cycle(&candidates).await;
    assert_eq!(posted, 3);

    // Insertion ids are monotonic, so input order shows up as id order.
    let mut ids = Vec::new();
    for asin in ["B0CANDID001", "B0CANDID002", "B0CANDID003"] {
        let deal = store
            .latest_deal_by_asin(asin)
            .await
            .expect("lookup")
            .expect("posted");
        ids.push(deal.id);
    }
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids not in input order: {ids:?}");
}

// ---------------------------------------------------------------------------
// Dedup edge: missing stable identifier
// ---------------------------------------------------------------------------

#[tokio::test]
async fn candidates_without_asin_bypass_the_duplicate_guard() {
    let amazon = MockServer::start().await;
    mount_deal_page(&amazon, "anon", 200).await;

    let store = Store::Memory(MemoryStore::new());
    let anon = candidate(&amazon, "anon", "");

    let first = pipeline(store.clone(), None).run_cycle(&[anon.clone()]).await;
    let second = pipeline(store.clone(), None).run_cycle(&[anon]).await;

    assert_eq!(first + second, 2, "no stable id means no dedup window");
}
