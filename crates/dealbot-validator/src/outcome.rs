use std::collections::HashMap;
use std::time::Duration;

/// Why a URL was judged unsafe to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// The string lacks a scheme or host; no network call was made.
    InvalidFormat,
    /// The host is not on the accepted marketplace list; no network call was made.
    DisallowedDomain,
    /// The server answered with a status outside the accepted set.
    HttpStatus(u16),
    /// The request timed out after exhausting retries.
    Timeout,
    /// A non-timeout transport failure after exhausting retries.
    Transport(String),
    /// The batch task for this URL died instead of returning an outcome.
    Task(String),
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationFailure::InvalidFormat => write!(f, "Invalid URL format"),
            ValidationFailure::DisallowedDomain => {
                write!(f, "not an accepted marketplace domain")
            }
            ValidationFailure::HttpStatus(status) => write!(f, "HTTP {status}"),
            ValidationFailure::Timeout => write!(f, "request timed out"),
            ValidationFailure::Transport(reason) => write!(f, "transport error: {reason}"),
            ValidationFailure::Task(reason) => write!(f, "task failure: {reason}"),
        }
    }
}

/// Result of one validation attempt. Immutable once returned; consumed within
/// the posting cycle and never persisted.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub url: String,
    pub is_valid: bool,
    pub status_code: Option<u16>,
    pub failure: Option<ValidationFailure>,
    /// Final URL after redirects, when it differs from the input.
    pub resolved_url: Option<String>,
    /// Wall-clock time from call start to return, retries included.
    pub elapsed: Duration,
}

impl ValidationOutcome {
    pub(crate) fn valid(
        url: String,
        status_code: u16,
        resolved_url: Option<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            url,
            is_valid: true,
            status_code: Some(status_code),
            failure: None,
            resolved_url,
            elapsed,
        }
    }

    pub(crate) fn invalid(url: String, failure: ValidationFailure, elapsed: Duration) -> Self {
        let status_code = match &failure {
            ValidationFailure::HttpStatus(status) => Some(*status),
            _ => None,
        };
        Self {
            url,
            is_valid: false,
            status_code,
            failure: Some(failure),
            resolved_url: None,
            elapsed,
        }
    }
}

/// Aggregate view over a batch of outcomes, for cycle summary logs.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Percentage of valid outcomes, 0.0 for an empty batch.
    pub success_rate: f64,
    pub mean_elapsed: Duration,
    /// Invalid outcomes grouped by failure description.
    pub failure_breakdown: HashMap<String, usize>,
}

impl ValidationStats {
    #[must_use]
    pub fn from_outcomes(outcomes: &[ValidationOutcome]) -> Self {
        let total = outcomes.len();
        let valid = outcomes.iter().filter(|o| o.is_valid).count();
        let invalid = total - valid;

        #[allow(clippy::cast_precision_loss)]
        let success_rate = if total == 0 {
            0.0
        } else {
            valid as f64 / total as f64 * 100.0
        };

        let timed: Vec<Duration> = outcomes
            .iter()
            .filter(|o| !o.elapsed.is_zero())
            .map(|o| o.elapsed)
            .collect();
        let mean_elapsed = if timed.is_empty() {
            Duration::ZERO
        } else {
            timed.iter().sum::<Duration>() / u32::try_from(timed.len()).unwrap_or(u32::MAX)
        };

        let mut failure_breakdown: HashMap<String, usize> = HashMap::new();
        for outcome in outcomes.iter().filter(|o| !o.is_valid) {
            let key = outcome
                .failure
                .as_ref()
                .map_or_else(|| "unknown".to_string(), ToString::to_string);
            *failure_breakdown.entry(key).or_insert(0) += 1;
        }

        Self {
            total,
            valid,
            invalid,
            success_rate,
            mean_elapsed,
            failure_breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_outcome_carries_status_for_http_failures() {
        let outcome = ValidationOutcome::invalid(
            "https://amazon.com/dp/B000000001".to_string(),
            ValidationFailure::HttpStatus(404),
            Duration::from_millis(12),
        );
        assert!(!outcome.is_valid);
        assert_eq!(outcome.status_code, Some(404));
    }

    #[test]
    fn invalid_outcome_has_no_status_for_local_rejects() {
        let outcome = ValidationOutcome::invalid(
            "not a url".to_string(),
            ValidationFailure::InvalidFormat,
            Duration::ZERO,
        );
        assert_eq!(outcome.status_code, None);
        assert_eq!(
            outcome.failure.as_ref().map(ToString::to_string),
            Some("Invalid URL format".to_string())
        );
    }

    #[test]
    fn stats_empty_batch_is_all_zero() {
        let stats = ValidationStats::from_outcomes(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.valid, 0);
        assert!((stats.success_rate - 0.0).abs() < f64::EPSILON);
        assert_eq!(stats.mean_elapsed, Duration::ZERO);
    }

    #[test]
    fn stats_counts_and_groups_failures() {
        let outcomes = vec![
            ValidationOutcome::valid(
                "https://amazon.com/dp/B000000001".to_string(),
                200,
                None,
                Duration::from_millis(100),
            ),
            ValidationOutcome::invalid(
                "https://amazon.com/dp/B000000002".to_string(),
                ValidationFailure::HttpStatus(404),
                Duration::from_millis(300),
            ),
            ValidationOutcome::invalid(
                "bad".to_string(),
                ValidationFailure::InvalidFormat,
                Duration::ZERO,
            ),
        ];
        let stats = ValidationStats::from_outcomes(&outcomes);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.invalid, 2);
        assert!((stats.success_rate - 100.0 / 3.0).abs() < 0.01);
        // Zero-elapsed local rejects do not drag the mean down.
        assert_eq!(stats.mean_elapsed, Duration::from_millis(200));
        assert_eq!(stats.failure_breakdown.get("HTTP 404"), Some(&1));
        assert_eq!(stats.failure_breakdown.get("Invalid URL format"), Some(&1));
    }
}
