//! The validator proper: lifecycle, single-URL probe, bounded batch fan-out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, RANGE};
use reqwest::Client;
use tokio::sync::{Mutex, Semaphore};

use crate::error::ValidatorError;
use crate::outcome::{ValidationFailure, ValidationOutcome, ValidationStats};

/// Marketplace hosts accepted for posting. A leading `www.` is stripped
/// before comparison.
pub const AMAZON_MARKETPLACES: [&str; 12] = [
    "amazon.com",
    "amazon.co.uk",
    "amazon.de",
    "amazon.fr",
    "amazon.it",
    "amazon.es",
    "amazon.ca",
    "amazon.com.mx",
    "amazon.com.br",
    "amazon.in",
    "amazon.co.jp",
    "amazon.com.au",
];

const BROWSER_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Request only the first 1 KiB of the body; we care about the status line,
/// not the page.
const PROBE_RANGE: &str = "bytes=0-1023";

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub timeout_secs: u64,
    /// Additional attempts after the first failure for transient errors.
    pub max_retries: u32,
    /// Fixed delay between attempts. The probe targets one marketplace, so
    /// exponential growth buys nothing over a short fixed pause.
    pub retry_delay: Duration,
    pub max_concurrent: usize,
    pub allowed_domains: Vec<String>,
    pub user_agent: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            max_concurrent: 10,
            allowed_domains: AMAZON_MARKETPLACES.iter().map(ToString::to_string).collect(),
            user_agent: BROWSER_UA.to_string(),
        }
    }
}

/// Session lifecycle: the pooled client is created lazily on first use and
/// torn down by [`LinkValidator::close`]. `Closed` is terminal.
enum Session {
    Idle,
    Open(Client),
    Closed,
}

struct Inner {
    config: ValidatorConfig,
    session: Mutex<Session>,
}

/// Classifies URLs as safe-to-post or not.
///
/// Cheap to clone; clones share the pooled connection context. The pool is
/// safe for concurrent use by the batch fan-out.
#[derive(Clone)]
pub struct LinkValidator {
    inner: Arc<Inner>,
}

struct Probe {
    valid: bool,
    status: u16,
    final_url: String,
}

impl LinkValidator {
    #[must_use]
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                session: Mutex::new(Session::Idle),
            }),
        }
    }

    /// Tear down the pooled connection context. Any later use of this
    /// validator (or a clone sharing the session) returns
    /// [`ValidatorError::Closed`].
    pub async fn close(&self) {
        let mut session = self.inner.session.lock().await;
        *session = Session::Closed;
    }

    /// Validate a single URL.
    ///
    /// Syntactic and allow-list rejects return an invalid outcome without any
    /// network traffic. Reachable checks probe with a ranged GET (200/206/416
    /// accepted, 405 retried once without the range), retrying transient
    /// transport errors with a fixed delay. Every outcome records elapsed
    /// wall-clock time.
    ///
    /// # Errors
    ///
    /// [`ValidatorError::Closed`] if [`LinkValidator::close`] was called;
    /// [`ValidatorError::ClientBuild`] if the lazy client cannot be built.
    pub async fn validate(&self, url: &str) -> Result<ValidationOutcome, ValidatorError> {
        let started = Instant::now();

        {
            let session = self.inner.session.lock().await;
            if matches!(*session, Session::Closed) {
                return Err(ValidatorError::Closed);
            }
        }

        let Some(host) = parsed_host(url) else {
            return Ok(ValidationOutcome::invalid(
                url.to_string(),
                ValidationFailure::InvalidFormat,
                started.elapsed(),
            ));
        };

        if !self.is_allowed_domain(&host) {
            return Ok(ValidationOutcome::invalid(
                url.to_string(),
                ValidationFailure::DisallowedDomain,
                started.elapsed(),
            ));
        }

        let client = self.client().await?;

        let mut attempt = 0u32;
        let failure = loop {
            match Self::probe(&client, url).await {
                Ok(probe) => {
                    let elapsed = started.elapsed();
                    if probe.valid {
                        let resolved =
                            (probe.final_url != url).then_some(probe.final_url);
                        tracing::debug!(url, status = probe.status, "link validated");
                        return Ok(ValidationOutcome::valid(
                            url.to_string(),
                            probe.status,
                            resolved,
                            elapsed,
                        ));
                    }
                    tracing::warn!(url, status = probe.status, "link rejected by server");
                    return Ok(ValidationOutcome::invalid(
                        url.to_string(),
                        ValidationFailure::HttpStatus(probe.status),
                        elapsed,
                    ));
                }
                Err(e) => {
                    if attempt >= self.inner.config.max_retries {
                        break classify_transport(&e);
                    }
                    attempt += 1;
                    tracing::debug!(
                        url,
                        attempt,
                        error = %e,
                        "transient probe error — retrying after fixed delay"
                    );
                    tokio::time::sleep(self.inner.config.retry_delay).await;
                }
            }
        };

        Ok(ValidationOutcome::invalid(
            url.to_string(),
            failure,
            started.elapsed(),
        ))
    }

    /// Validate many URLs with the configured concurrency bound.
    ///
    /// # Errors
    ///
    /// Same hard failures as [`LinkValidator::validate`].
    pub async fn validate_batch(
        &self,
        urls: &[String],
    ) -> Result<Vec<ValidationOutcome>, ValidatorError> {
        self.validate_batch_with_limit(urls, self.inner.config.max_concurrent)
            .await
    }

    /// Validate many URLs, bounding in-flight probes to `max_concurrent`.
    ///
    /// `outcomes[i]` always corresponds to `urls[i]`, regardless of
    /// completion order. A task that dies for one URL becomes a
    /// [`ValidationFailure::Task`] outcome for that URL alone. Empty input
    /// returns immediately without opening the session.
    ///
    /// # Errors
    ///
    /// Same hard failures as [`LinkValidator::validate`].
    pub async fn validate_batch_with_limit(
        &self,
        urls: &[String],
        max_concurrent: usize,
    ) -> Result<Vec<ValidationOutcome>, ValidatorError> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        // Surface Closed/build errors once, before the fan-out.
        self.client().await?;

        tracing::info!(
            count = urls.len(),
            max_concurrent,
            "validating link batch"
        );

        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let handles: Vec<_> = urls
            .iter()
            .map(|url| {
                let validator = self.clone();
                let url = url.clone();
                let semaphore = Arc::clone(&semaphore);
                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .expect("batch semaphore closed");
                    validator.validate(&url).await
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (handle, url) in handles.into_iter().zip(urls) {
            let outcome = match handle.await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    tracing::error!(url = %url, error = %e, "validation task failed");
                    ValidationOutcome::invalid(
                        url.clone(),
                        ValidationFailure::Task(e.to_string()),
                        Duration::ZERO,
                    )
                }
                Err(join_error) => {
                    tracing::error!(url = %url, error = %join_error, "validation task died");
                    ValidationOutcome::invalid(
                        url.clone(),
                        ValidationFailure::Task(join_error.to_string()),
                        Duration::ZERO,
                    )
                }
            };
            outcomes.push(outcome);
        }

        let stats = ValidationStats::from_outcomes(&outcomes);
        let success_rate = format!("{:.1}%", stats.success_rate);
        tracing::info!(
            valid = stats.valid,
            invalid = stats.invalid,
            success_rate = %success_rate,
            "link batch validated"
        );

        Ok(outcomes)
    }

    fn is_allowed_domain(&self, host: &str) -> bool {
        let host = host.strip_prefix("www.").unwrap_or(host);
        self.inner
            .config
            .allowed_domains
            .iter()
            .any(|domain| domain.eq_ignore_ascii_case(host))
    }

    /// Get the pooled client, building it on first use.
    async fn client(&self) -> Result<Client, ValidatorError> {
        let mut session = self.inner.session.lock().await;
        match &*session {
            Session::Open(client) => Ok(client.clone()),
            Session::Closed => Err(ValidatorError::Closed),
            Session::Idle => {
                let client = build_client(&self.inner.config)?;
                tracing::debug!("link validator session opened");
                *session = Session::Open(client.clone());
                Ok(client)
            }
        }
    }

    async fn probe(client: &Client, url: &str) -> Result<Probe, reqwest::Error> {
        let response = client.get(url).header(RANGE, PROBE_RANGE).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        if matches!(status, 200 | 206 | 416) {
            return Ok(Probe {
                valid: true,
                status,
                final_url,
            });
        }

        if status == 405 {
            // Server rejects ranged requests outright; retry plain, accepting
            // only an unambiguous 200.
            let retry = client.get(url).send().await?;
            let status = retry.status().as_u16();
            let final_url = retry.url().to_string();
            return Ok(Probe {
                valid: status == 200,
                status,
                final_url,
            });
        }

        Ok(Probe {
            valid: false,
            status,
            final_url,
        })
    }
}

fn classify_transport(error: &reqwest::Error) -> ValidationFailure {
    if error.is_timeout() {
        ValidationFailure::Timeout
    } else {
        ValidationFailure::Transport(error.to_string())
    }
}

/// Lowercased host of `url`, or `None` when the string lacks a scheme or host.
fn parsed_host(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed.host_str().map(str::to_ascii_lowercase)
}

fn build_client(config: &ValidatorConfig) -> Result<Client, ValidatorError> {
    // Browser-like headers reduce false rejections from anti-bot filters.
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(20)
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .build()
        .map_err(ValidatorError::ClientBuild)
}
