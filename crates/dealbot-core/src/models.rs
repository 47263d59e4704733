//! Domain models shared across the workspace.

use serde::{Deserialize, Serialize};

/// An unvalidated, unpersisted product record produced by the scraper.
///
/// Fields are best-effort: anything the source page did not expose is left
/// empty (strings) or zero (numbers). A candidate only moves through the
/// posting pipeline when [`Candidate::is_postable`] holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    /// Display price as scraped, e.g. `"₹1,299"` — never parsed to a number.
    pub price: String,
    pub discount: String,
    /// Raw product URL before affiliate rewriting.
    pub link: String,
    pub category: String,
    /// Marketplace product code (ASIN). May be empty when the source page
    /// did not expose one; dedup is skipped for such candidates.
    pub asin: String,
    pub description: String,
    pub rating: f64,
    pub review_count: i64,
    pub image_url: String,
}

impl Candidate {
    /// A candidate is postable only when title, price, and link are all
    /// non-empty.
    #[must_use]
    pub fn is_postable(&self) -> bool {
        !self.title.is_empty() && !self.price.is_empty() && !self.link.is_empty()
    }
}

/// Tone of the generated channel message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStyle {
    Simple,
    Enthusiastic,
    Professional,
}

impl ContentStyle {
    /// Parse a style name; unrecognized values fall back to `Simple`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "enthusiastic" => ContentStyle::Enthusiastic,
            "professional" => ContentStyle::Professional,
            _ => ContentStyle::Simple,
        }
    }
}

impl std::fmt::Display for ContentStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentStyle::Simple => write!(f, "simple"),
            ContentStyle::Enthusiastic => write!(f, "enthusiastic"),
            ContentStyle::Professional => write!(f, "professional"),
        }
    }
}

/// Amazon marketplace region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Us,
    Uk,
    De,
    Fr,
    Ca,
    Jp,
    Au,
    In,
}

impl Region {
    pub const ALL: [Region; 8] = [
        Region::Us,
        Region::Uk,
        Region::De,
        Region::Fr,
        Region::Ca,
        Region::Jp,
        Region::Au,
        Region::In,
    ];

    /// The marketplace domain served to customers in this region.
    #[must_use]
    pub fn marketplace_domain(self) -> &'static str {
        match self {
            Region::Us => "amazon.com",
            Region::Uk => "amazon.co.uk",
            Region::De => "amazon.de",
            Region::Fr => "amazon.fr",
            Region::Ca => "amazon.ca",
            Region::Jp => "amazon.co.jp",
            Region::Au => "amazon.com.au",
            Region::In => "amazon.in",
        }
    }

    /// Parse a two-letter region code, case-insensitively.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "US" => Some(Region::Us),
            "UK" => Some(Region::Uk),
            "DE" => Some(Region::De),
            "FR" => Some(Region::Fr),
            "CA" => Some(Region::Ca),
            "JP" => Some(Region::Jp),
            "AU" => Some(Region::Au),
            "IN" => Some(Region::In),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Region::Us => "US",
            Region::Uk => "UK",
            Region::De => "DE",
            Region::Fr => "FR",
            Region::Ca => "CA",
            Region::Jp => "JP",
            Region::Au => "AU",
            Region::In => "IN",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
