//! One posting cycle, end to end.

use std::time::Duration;

use dealbot_channel::ChannelClient;
use dealbot_content::ContentGenerator;
use dealbot_core::{AffiliateLinkBuilder, Candidate, ContentStyle, Region};
use dealbot_db::{Store, StoreError};
use dealbot_validator::LinkValidator;

use crate::dedup::DuplicateGuard;

/// Where posted deals are delivered. Absent when no channel is configured —
/// deals are then only persisted.
pub struct ChannelTarget {
    pub client: ChannelClient,
    pub chat_id: String,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Recorded as the deal's `source` column.
    pub source: String,
    pub style: ContentStyle,
    /// Region for affiliate tagging; `None` uses the builder's default.
    pub region: Option<Region>,
    pub dedup_window: chrono::Duration,
    /// Pause between posted items, respecting channel rate limits.
    pub inter_post_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: "scraper".to_string(),
            style: ContentStyle::Enthusiastic,
            region: None,
            dedup_window: chrono::Duration::hours(2),
            inter_post_delay: Duration::from_secs(2),
        }
    }
}

enum CandidateOutcome {
    Posted,
    SkippedDuplicate,
}

/// Composes link building, validation, dedup, content generation, delivery,
/// and persistence into `run_cycle`.
pub struct DealPostingPipeline {
    link_builder: AffiliateLinkBuilder,
    validator: LinkValidator,
    generator: ContentGenerator,
    channel: Option<ChannelTarget>,
    store: Store,
    guard: DuplicateGuard,
    config: PipelineConfig,
}

impl DealPostingPipeline {
    #[must_use]
    pub fn new(
        link_builder: AffiliateLinkBuilder,
        validator: LinkValidator,
        generator: ContentGenerator,
        channel: Option<ChannelTarget>,
        store: Store,
        config: PipelineConfig,
    ) -> Self {
        let guard = DuplicateGuard::new(store.clone(), config.dedup_window);
        Self {
            link_builder,
            validator,
            generator,
            channel,
            store,
            guard,
            config,
        }
    }

    /// The generator, exposed so schedulers can drive its degraded-mode
    /// recheck between cycles.
    #[must_use]
    pub fn content_generator(&self) -> &ContentGenerator {
        &self.generator
    }

    /// Run one posting cycle over `candidates` and return the number of deals
    /// processed.
    ///
    /// Never errors: per-candidate failures are logged and the loop moves on.
    /// Zero is a normal outcome for an empty or fully-filtered batch.
    pub async fn run_cycle(&self, candidates: &[Candidate]) -> usize {
        if candidates.is_empty() {
            tracing::info!("no candidates this cycle");
            return 0;
        }

        // Stage 1: affiliate links. Pure transform; unusable candidates are
        // dropped before any network cost.
        let prepared: Vec<(&Candidate, String)> = candidates
            .iter()
            .filter(|candidate| {
                let postable = candidate.is_postable();
                if !postable {
                    tracing::debug!(title = %candidate.title, "dropping incomplete candidate");
                }
                postable
            })
            .map(|candidate| {
                let link = self.link_builder.build(&candidate.link, self.config.region);
                (candidate, link)
            })
            .filter(|(_, link)| !link.is_empty())
            .collect();

        if prepared.is_empty() {
            tracing::info!("no postable candidates this cycle");
            return 0;
        }

        // Stage 2: one batch validation pass over every affiliate link.
        let urls: Vec<String> = prepared.iter().map(|(_, link)| link.clone()).collect();
        let outcomes = match self.validator.validate_batch(&urls).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::error!(error = %e, "link validation unavailable; skipping cycle");
                return 0;
            }
        };

        let survivors: Vec<(&Candidate, String)> = prepared
            .into_iter()
            .zip(outcomes)
            .filter_map(|((candidate, link), outcome)| {
                if outcome.is_valid {
                    Some((candidate, link))
                } else {
                    let reason = outcome
                        .failure
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    tracing::warn!(
                        title = %candidate.title,
                        url = %outcome.url,
                        reason = %reason,
                        "excluding deal with unreachable link"
                    );
                    None
                }
            })
            .collect();

        if survivors.is_empty() {
            tracing::warn!("no candidates with reachable links this cycle");
            return 0;
        }

        // Stage 3: post in input order, containing per-candidate failures.
        let mut posted = 0usize;
        for (candidate, affiliate_link) in survivors {
            match self.process_candidate(candidate, &affiliate_link).await {
                Ok(CandidateOutcome::Posted) => {
                    posted += 1;
                    tracing::info!(title = %candidate.title, "deal posted");
                    tokio::time::sleep(self.config.inter_post_delay).await;
                }
                Ok(CandidateOutcome::SkippedDuplicate) => {}
                Err(e) => {
                    tracing::error!(
                        title = %candidate.title,
                        error = %e,
                        "failed to process candidate; continuing cycle"
                    );
                }
            }
        }

        tracing::info!(posted, total = candidates.len(), "posting cycle complete");
        posted
    }

    async fn process_candidate(
        &self,
        candidate: &Candidate,
        affiliate_link: &str,
    ) -> Result<CandidateOutcome, StoreError> {
        if !candidate.asin.is_empty() && self.guard.is_duplicate(&candidate.asin).await {
            tracing::info!(
                asin = %candidate.asin,
                title = %candidate.title,
                "skipping recent duplicate"
            );
            return Ok(CandidateOutcome::SkippedDuplicate);
        }

        let message = self
            .generator
            .telegram_message(candidate, affiliate_link, self.config.style)
            .await;

        // Delivery failure does not skip persistence: the deal is still
        // recorded as processed.
        if let Some(target) = &self.channel {
            match target.client.send_message(&target.chat_id, &message).await {
                Ok(message_id) => {
                    tracing::debug!(message_id, title = %candidate.title, "delivered to channel");
                }
                Err(e) => {
                    tracing::error!(
                        chat_id = %target.chat_id,
                        title = %candidate.title,
                        error = %e,
                        "channel delivery failed; deal still recorded"
                    );
                }
            }
        }

        self.store
            .add_deal(
                candidate,
                affiliate_link,
                &self.config.source,
                self.config.style,
                &message,
            )
            .await?;

        Ok(CandidateOutcome::Posted)
    }
}
