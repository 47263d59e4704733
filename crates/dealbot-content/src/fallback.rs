//! Deterministic message templates used when the AI backend is unavailable.

use dealbot_core::{Candidate, ContentStyle};

const MAX_TITLE_CHARS: usize = 80;

const ENTHUSIASTIC: [&str; 2] = [
    "🔥 **AMAZING DEAL ALERT!** 🔥\n\n💫 {title}\n💰 **{price}** ({discount})\n⭐ {rating}/5 ({reviews} reviews)\n\n🚨 LIMITED TIME OFFER! Don't miss out!\n\n🛒 **[Get This Deal Now]({link})**",
    "💥 **INCREDIBLE SAVINGS!** 💥\n\n✨ {title}\n🎯 **{price}** - Save with {discount}!\n⭐ {rating}/5 stars ({reviews} reviews)\n\n⏰ Hurry! This deal won't last long!\n\n🛒 **[Shop Now]({link})**",
];

const PROFESSIONAL: [&str; 2] = [
    "📦 **Featured Deal**\n\n**{title}**\n\n💵 Price: **{price}**\n🏷️ Discount: {discount}\n⭐ Rating: {rating}/5 ({reviews} reviews)\n\n🛒 **[View Deal]({link})**",
    "🛍️ **Product Spotlight**\n\n{title}\n\n**Price:** {price}\n**Savings:** {discount}\n**Customer Rating:** {rating}/5 ⭐\n\n🔗 **[Get This Deal]({link})**",
];

const SIMPLE: [&str; 2] = [
    "🛒 **{title}**\n\n💰 {price} ({discount})\n⭐ {rating}/5\n\n🔗 **[Buy Now]({link})**",
    "📦 {title}\n\n{price} - {discount}\n{rating}/5 ⭐ ({reviews} reviews)\n\n**[Get Deal]({link})**",
];

/// Render a fallback channel message. Pure aside from template choice.
pub(crate) fn render(candidate: &Candidate, affiliate_url: &str, style: ContentStyle) -> String {
    let templates: &[&str] = match style {
        ContentStyle::Enthusiastic => &ENTHUSIASTIC,
        ContentStyle::Professional => &PROFESSIONAL,
        ContentStyle::Simple => &SIMPLE,
    };
    let template = templates[rand::random::<u32>() as usize % templates.len()];

    let title: String = if candidate.title.chars().count() > MAX_TITLE_CHARS {
        let truncated: String = candidate.title.chars().take(MAX_TITLE_CHARS).collect();
        format!("{truncated}...")
    } else {
        candidate.title.clone()
    };

    let rating = if candidate.rating > 0.0 {
        format!("{:.1}", candidate.rating)
    } else {
        "4.0".to_string()
    };
    let reviews = if candidate.review_count > 0 {
        candidate.review_count.to_string()
    } else {
        "100+".to_string()
    };

    template
        .replace("{title}", &title)
        .replace("{price}", &candidate.price)
        .replace("{discount}", &candidate.discount)
        .replace("{rating}", &rating)
        .replace("{reviews}", &reviews)
        .replace("{link}", affiliate_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> Candidate {
        Candidate {
            title: "Wireless Earbuds Pro".to_string(),
            price: "₹1,299".to_string(),
            discount: "40% off".to_string(),
            link: "https://www.amazon.in/dp/B0ABCDEF12".to_string(),
            rating: 4.3,
            review_count: 512,
            ..Candidate::default()
        }
    }

    #[test]
    fn rendered_message_contains_core_fields() {
        let url = "https://amazon.in/dp/B0ABCDEF12?tag=dealhunt-21";
        for style in [
            ContentStyle::Simple,
            ContentStyle::Enthusiastic,
            ContentStyle::Professional,
        ] {
            let message = render(&candidate(), url, style);
            assert!(message.contains("Wireless Earbuds Pro"), "{style}: {message}");
            assert!(message.contains("₹1,299"), "{style}: {message}");
            assert!(message.contains(url), "{style}: {message}");
        }
    }

    #[test]
    fn long_titles_are_truncated() {
        let mut c = candidate();
        c.title = "X".repeat(120);
        let message = render(&c, "https://example.test", ContentStyle::Simple);
        assert!(message.contains(&format!("{}...", "X".repeat(80))));
        assert!(!message.contains(&"X".repeat(81)));
    }

    #[test]
    fn zero_rating_uses_placeholder() {
        let mut c = candidate();
        c.rating = 0.0;
        c.review_count = 0;
        let message = render(&c, "https://example.test", ContentStyle::Professional);
        assert!(message.contains("4.0/5"), "{message}");
    }

    #[test]
    fn no_unexpanded_placeholders_remain() {
        let message = render(&candidate(), "https://example.test", ContentStyle::Enthusiastic);
        for token in ["{title}", "{price}", "{discount}", "{rating}", "{reviews}", "{link}"] {
            assert!(!message.contains(token), "unexpanded {token} in: {message}");
        }
    }
}
