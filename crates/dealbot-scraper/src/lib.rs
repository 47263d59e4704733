//! Deal-listing scraper.
//!
//! Fetches configured marketplace listing pages and extracts product
//! candidates with regex-level matching (product-path anchors, price tokens).
//! Extraction is best-effort: missing fields stay empty and unpostable
//! candidates are filtered downstream.

mod error;
mod extract;
mod scraper;

pub use error::ScraperError;
pub use extract::extract_candidates;
pub use scraper::{DealScraper, ScraperConfig};
