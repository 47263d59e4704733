//! Channel copy generation.
//!
//! The generator prefers an AI backend and degrades to deterministic
//! templates. Degradation is an explicit, observable state: auth or quota
//! rejection flips the generator to `Degraded` once, and only
//! [`ContentGenerator::recheck`] can bring it back to `Live`.

mod error;
mod fallback;
mod generator;
mod openai;

pub use error::ContentError;
pub use generator::{ContentGenerator, GeneratorMode};
pub use openai::OpenAiClient;
