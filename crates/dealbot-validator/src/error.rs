use thiserror::Error;

/// Hard failures from the validator.
///
/// Network problems are never reported here — they are folded into the
/// [`crate::ValidationOutcome`] for the URL in question. The variants below
/// are caller mistakes.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("validator used after close()")]
    Closed,

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}
