//! Candidate extraction from listing-page HTML.
//!
//! Regex-level only: product anchors are located by their `/dp/{ASIN}` path,
//! the title comes from the anchor text, and price/discount/image tokens are
//! searched in the anchor body plus a short window after it. No DOM
//! traversal.

use regex::Regex;
use reqwest::Url;

use dealbot_core::Candidate;

/// How far past a product anchor to look for price and discount tokens.
const TRAILING_WINDOW_CHARS: usize = 600;

/// Extract product candidates from `html`.
///
/// `source_url` resolves relative product links; `category` is attached to
/// every candidate. Candidates are deduplicated by ASIN within the page,
/// first occurrence wins.
#[must_use]
pub fn extract_candidates(html: &str, source_url: &str, category: &str) -> Vec<Candidate> {
    let anchor =
        Regex::new(r#"(?is)<a[^>]+href\s*=\s*["']([^"']*/dp/([A-Z0-9]{10})[^"']*)["'][^>]*>(.*?)</a>"#)
            .expect("valid product anchor regex");

    let mut candidates: Vec<Candidate> = Vec::new();

    for m in anchor.captures_iter(html) {
        let href = &m[1];
        let asin = m[2].to_string();
        let inner = &m[3];

        if candidates.iter().any(|c| c.asin == asin) {
            continue;
        }

        let Some(link) = resolve_link(source_url, href) else {
            continue;
        };

        // Price/discount may sit outside the anchor itself; scan the anchor
        // body first, then a short window following it.
        let anchor_end = m.get(0).map_or(0, |full| full.end());
        let trailing: String = html[anchor_end..].chars().take(TRAILING_WINDOW_CHARS).collect();

        let price = find_price(inner).or_else(|| find_price(&trailing));
        let discount = find_discount(inner).or_else(|| find_discount(&trailing));

        candidates.push(Candidate {
            title: anchor_text(inner),
            price: price.unwrap_or_default(),
            discount: discount.unwrap_or_default(),
            link,
            category: category.to_string(),
            asin,
            description: String::new(),
            rating: 0.0,
            review_count: 0,
            image_url: find_image(inner).unwrap_or_default(),
        });
    }

    candidates
}

fn resolve_link(source_url: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base = Url::parse(source_url).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Visible text of an anchor body: tags stripped, image-only anchors fall
/// back to the image `alt` text.
fn anchor_text(inner: &str) -> String {
    let tags = Regex::new(r"(?is)<[^>]+>").expect("valid tag-strip regex");
    let text = tags.replace_all(inner, " ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        return collapsed;
    }

    let alt = Regex::new(r#"(?is)<img[^>]+alt\s*=\s*["']([^"']+)["']"#)
        .expect("valid img alt regex");
    alt.captures(inner)
        .map(|c| c[1].split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

fn find_price(text: &str) -> Option<String> {
    let price = Regex::new(r"[₹$€£]\s?\d[\d,]*(?:\.\d{1,2})?").expect("valid price regex");
    price.find(text).map(|m| m.as_str().replace(' ', ""))
}

fn find_discount(text: &str) -> Option<String> {
    let discount = Regex::new(r"(?i)\d{1,2}%\s*off").expect("valid discount regex");
    discount.find(text).map(|m| m.as_str().to_string())
}

fn find_image(inner: &str) -> Option<String> {
    let img = Regex::new(r#"(?is)<img[^>]+src\s*=\s*["']([^"']+)["']"#)
        .expect("valid img src regex");
    img.captures(inner).map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "https://www.amazon.in/gp/goldbox";

    #[test]
    fn extracts_candidate_from_product_anchor() {
        let html = r#"
            <div class="deal">
              <a href="/dp/B0ABCDEF12?ref=deal">Wireless Earbuds Pro</a>
              <span class="price">₹1,299</span>
              <span class="badge">40% off</span>
            </div>
        "#;
        let candidates = extract_candidates(html, SOURCE, "electronics");

        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.asin, "B0ABCDEF12");
        assert_eq!(c.title, "Wireless Earbuds Pro");
        assert_eq!(c.price, "₹1,299");
        assert_eq!(c.discount, "40% off");
        assert_eq!(c.category, "electronics");
        assert_eq!(c.link, "https://www.amazon.in/dp/B0ABCDEF12?ref=deal");
    }

    #[test]
    fn deduplicates_by_asin_within_page() {
        let html = r#"
            <a href="/dp/B0ABCDEF12">Earbuds</a> <span>₹999</span>
            <a href="/dp/B0ABCDEF12?tag=x">Earbuds again</a>
            <a href="/dp/B0OTHERSKU">Kettle</a> <span>₹1,499</span>
        "#;
        let candidates = extract_candidates(html, SOURCE, "");
        let asins: Vec<&str> = candidates.iter().map(|c| c.asin.as_str()).collect();
        assert_eq!(asins, vec!["B0ABCDEF12", "B0OTHERSKU"]);
    }

    #[test]
    fn keeps_absolute_links_unchanged() {
        let html = r#"<a href="https://www.amazon.com/dp/B0ABCDEF12">Deal</a>"#;
        let candidates = extract_candidates(html, SOURCE, "");
        assert_eq!(candidates[0].link, "https://www.amazon.com/dp/B0ABCDEF12");
    }

    #[test]
    fn image_only_anchor_uses_alt_text_and_records_image() {
        let html = r#"<a href="/dp/B0ABCDEF12"><img src="https://img.example/x.jpg" alt="Smart Watch Series 5"></a>"#;
        let candidates = extract_candidates(html, SOURCE, "");
        assert_eq!(candidates[0].title, "Smart Watch Series 5");
        assert_eq!(candidates[0].image_url, "https://img.example/x.jpg");
    }

    #[test]
    fn missing_price_leaves_field_empty() {
        let html = r#"<a href="/dp/B0ABCDEF12">Mystery Deal</a>"#;
        let candidates = extract_candidates(html, SOURCE, "");
        assert_eq!(candidates[0].price, "");
        assert!(!candidates[0].is_postable());
    }

    #[test]
    fn dollar_price_with_decimals_is_matched() {
        let html = r#"<a href="/dp/B0ABCDEF12">Deal <b>$ 29.99</b></a>"#;
        let candidates = extract_candidates(html, SOURCE, "");
        assert_eq!(candidates[0].price, "$29.99");
    }

    #[test]
    fn short_product_codes_are_ignored() {
        let html = r#"<a href="/dp/SHORT1">Not a product</a>"#;
        assert!(extract_candidates(html, SOURCE, "").is_empty());
    }

    #[test]
    fn empty_page_yields_no_candidates() {
        assert!(extract_candidates("", SOURCE, "").is_empty());
    }
}
