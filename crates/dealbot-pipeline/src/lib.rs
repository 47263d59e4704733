//! The posting pipeline.
//!
//! Orchestrates one cycle from raw candidates to posted deals: affiliate-link
//! attachment, batch link validation, duplicate suppression, content
//! generation, channel delivery, and persistence. Each stage may drop items;
//! nothing flows backward, and no per-candidate failure escapes the cycle.

mod dedup;
mod pipeline;

pub use dedup::DuplicateGuard;
pub use pipeline::{ChannelTarget, DealPostingPipeline, PipelineConfig};
