//! Affiliate link construction.
//!
//! Rewrites raw marketplace product URLs into tagged affiliate URLs. The
//! builder is pure and never fails: the worst case appends the tag to the
//! original URL unchanged.

use std::collections::HashMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use crate::app_config::AppConfig;
use crate::models::Region;

/// Affiliate tags commonly contain `-` and `_`; keep those literal.
const TAG_ENCODE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

const LINK_SUFFIX: &str = "linkCode=as2&camp=1789&creative=9325";

/// Builds tagged affiliate URLs from raw product URLs.
#[derive(Debug, Clone)]
pub struct AffiliateLinkBuilder {
    tags: HashMap<Region, String>,
    default_tag: String,
    default_region: Region,
}

impl AffiliateLinkBuilder {
    #[must_use]
    pub fn new(
        default_tag: String,
        tags: HashMap<Region, String>,
        default_region: Region,
    ) -> Self {
        Self {
            tags,
            default_tag,
            default_region,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.affiliate_tag.clone(),
            config.regional_affiliate_tags.clone(),
            config.default_region,
        )
    }

    /// Rewrite `raw_url` into an affiliate URL for `region` (or the default
    /// region).
    ///
    /// When the URL carries an ASIN the result is the canonical
    /// `https://{domain}/dp/{asin}` form with tag parameters; otherwise the
    /// tag parameters are appended to the URL as-is. An empty input yields an
    /// empty output so callers can drop the candidate before any network cost.
    #[must_use]
    pub fn build(&self, raw_url: &str, region: Option<Region>) -> String {
        if raw_url.is_empty() {
            return String::new();
        }

        let region = region.unwrap_or(self.default_region);
        let tag = self
            .tags
            .get(&region)
            .map_or(self.default_tag.as_str(), String::as_str);
        let tag = utf8_percent_encode(tag, TAG_ENCODE).to_string();

        if let Some(asin) = extract_asin(raw_url) {
            let domain = marketplace_domain_in(raw_url)
                .unwrap_or_else(|| region.marketplace_domain().to_string());
            return format!("https://{domain}/dp/{asin}?tag={tag}&{LINK_SUFFIX}");
        }

        // No ASIN — append the tag to the URL unchanged.
        let separator = if raw_url.contains('?') { '&' } else { '?' };
        format!("{raw_url}{separator}tag={tag}&{LINK_SUFFIX}")
    }
}

/// Extract a 10-character ASIN from `/dp/` or `/gp/product/` path segments.
#[must_use]
pub fn extract_asin(url: &str) -> Option<String> {
    let dp = Regex::new(r"/dp/([A-Z0-9]{10})").expect("valid dp regex");
    if let Some(captures) = dp.captures(url) {
        return Some(captures[1].to_string());
    }
    let gp = Regex::new(r"/gp/product/([A-Z0-9]{10})").expect("valid gp regex");
    gp.captures(url).map(|captures| captures[1].to_string())
}

/// The marketplace domain mentioned in `url`, if any.
///
/// Longer domains are matched first so `amazon.com.au` is not mistaken for
/// `amazon.com`.
fn marketplace_domain_in(url: &str) -> Option<String> {
    let mut domains: Vec<&str> = Region::ALL
        .iter()
        .map(|r| r.marketplace_domain())
        .collect();
    domains.sort_by_key(|d| std::cmp::Reverse(d.len()));
    domains
        .into_iter()
        .find(|domain| url.contains(domain))
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> AffiliateLinkBuilder {
        AffiliateLinkBuilder::new("dealhunt-21".to_string(), HashMap::new(), Region::In)
    }

    #[test]
    fn builds_canonical_dp_link_preserving_domain() {
        let link = builder().build(
            "https://www.amazon.com/Some-Product-Name/dp/B0ABCDEF12?ref=xyz",
            None,
        );
        assert_eq!(
            link,
            "https://amazon.com/dp/B0ABCDEF12?tag=dealhunt-21&linkCode=as2&camp=1789&creative=9325"
        );
    }

    #[test]
    fn extracts_asin_from_gp_product_path() {
        let link = builder().build("https://www.amazon.in/gp/product/B0XYZ01234", None);
        assert!(link.starts_with("https://amazon.in/dp/B0XYZ01234?tag=dealhunt-21"));
    }

    #[test]
    fn falls_back_to_region_domain_when_url_has_none() {
        let link = builder().build("https://amzn.example/dp/B0ABCDEF12", Some(Region::Uk));
        assert!(
            link.starts_with("https://amazon.co.uk/dp/B0ABCDEF12?"),
            "unexpected link: {link}"
        );
    }

    #[test]
    fn does_not_mistake_com_au_for_com() {
        let link = builder().build("https://www.amazon.com.au/dp/B0ABCDEF12", None);
        assert!(
            link.starts_with("https://amazon.com.au/dp/"),
            "unexpected link: {link}"
        );
    }

    #[test]
    fn appends_tag_when_no_asin_present() {
        let link = builder().build("https://www.amazon.in/deals", None);
        assert_eq!(
            link,
            "https://www.amazon.in/deals?tag=dealhunt-21&linkCode=as2&camp=1789&creative=9325"
        );
    }

    #[test]
    fn appends_with_ampersand_when_query_exists() {
        let link = builder().build("https://www.amazon.in/s?k=deals", None);
        assert!(link.starts_with("https://www.amazon.in/s?k=deals&tag=dealhunt-21"));
    }

    #[test]
    fn empty_url_yields_empty_link() {
        assert_eq!(builder().build("", None), "");
    }

    #[test]
    fn uses_regional_tag_override() {
        let mut tags = HashMap::new();
        tags.insert(Region::Uk, "dealhunt-uk-21".to_string());
        let builder = AffiliateLinkBuilder::new("dealhunt-21".to_string(), tags, Region::In);
        let link = builder.build("https://amazon.co.uk/dp/B0ABCDEF12", Some(Region::Uk));
        assert!(link.contains("tag=dealhunt-uk-21"), "unexpected link: {link}");
    }

    #[test]
    fn percent_encodes_unusual_tag_characters() {
        let builder =
            AffiliateLinkBuilder::new("my tag&x".to_string(), HashMap::new(), Region::Us);
        let link = builder.build("https://amazon.com/dp/B0ABCDEF12", None);
        assert!(link.contains("tag=my%20tag%26x"), "unexpected link: {link}");
    }

    #[test]
    fn extract_asin_rejects_short_codes() {
        assert_eq!(extract_asin("https://amazon.com/dp/B0SHORT"), None);
    }
}
