use chrono::{TimeZone, Utc};

use crate::transcode::DisplayArticle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub label: &'static str,
}

/// Categories offered by the filter bar. The server accepts any string.
pub const CATEGORIES: &[Category] = &[
    Category { name: "all", label: "All" },
    Category { name: "technology", label: "Technology" },
    Category { name: "business", label: "Business" },
    Category { name: "sports", label: "Sports" },
    Category { name: "entertainment", label: "Entertainment" },
    Category { name: "science", label: "Science" },
];

/// Display label for a category, or the raw name when it is not one of ours.
pub fn category_label(name: &str) -> &str {
    CATEGORIES
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.label)
        .unwrap_or(name)
}

struct Bundled {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    content: &'static str,
    image_url: &'static str,
    published_at: (u32, u32),
    source: &'static str,
    category: &'static str,
    author: &'static str,
    url: &'static str,
}

const BUNDLED: [Bundled; 5] = [
    Bundled {
        id: "1",
        title: "The latest in AI: how generative models are changing the future",
        description: "Rapid progress in artificial intelligence is accelerating innovation across industries.",
        content: "Artificial intelligence has advanced remarkably in recent years, and generative AI in particular keeps producing breakthroughs...",
        image_url: "https://images.unsplash.com/photo-1677442136019-21780ecad995?w=800&q=80",
        published_at: (7, 0),
        source: "Tech News",
        category: "technology",
        author: "Taro Tanaka",
        url: "https://example.com/ai-advancement",
    },
    Bundled {
        id: "2",
        title: "Growth strategies for new companies: startup investment trends",
        description: "Startup investment in 2025 is concentrating on AI, fintech and health tech.",
        content: "Venture capital investment rose 30% over the previous year, with AI companies drawing the most attention...",
        image_url: "https://images.unsplash.com/photo-1559136555-9303baea8ebd?w=800&q=80",
        published_at: (6, 30),
        source: "Business Today",
        category: "business",
        author: "Hanako Sato",
        url: "https://example.com/startup-investment",
    },
    Bundled {
        id: "3",
        title: "Olympic legacy: putting sports venues to use",
        description: "An analysis of how post-Olympic venues affect their local communities.",
        content: "A year after the games, making good use of the competition venues has become a pressing issue...",
        image_url: "https://images.unsplash.com/photo-1461896836934-ffe607ba8211?w=800&q=80",
        published_at: (6, 0),
        source: "Sports Weekly",
        category: "sports",
        author: "Jiro Yamada",
        url: "https://example.com/olympics-legacy",
    },
    Bundled {
        id: "4",
        title: "New trends in film: streaming versus theaters",
        description: "Coexistence of streaming services and cinemas is producing new business models.",
        content: "The spread of streaming services has reshaped how the film industry earns its revenue...",
        image_url: "https://images.unsplash.com/photo-1489599849927-2ee91cede3ba?w=800&q=80",
        published_at: (5, 30),
        source: "Entertainment News",
        category: "entertainment",
        author: "Misaki Suzuki",
        url: "https://example.com/movie-industry",
    },
    Bundled {
        id: "5",
        title: "Space exploration: a lunar base project takes shape",
        description: "An international plan to build a base on the Moon is under way, opening a new era for science.",
        content: "The international project aiming at sustainable human presence on the Moon entered its concrete phase in 2025...",
        image_url: "https://images.unsplash.com/photo-1446776877081-d282a0f896e2?w=800&q=80",
        published_at: (5, 0),
        source: "Science Daily",
        category: "science",
        author: "Kenichi Takahashi",
        url: "https://example.com/moon-base",
    },
];

/// The dataset shown when the server cannot provide one.
pub fn fallback_articles() -> Vec<DisplayArticle> {
    BUNDLED
        .iter()
        .map(|b| {
            let (hour, minute) = b.published_at;
            DisplayArticle {
                id: b.id.to_string(),
                title: b.title.to_string(),
                description: b.description.to_string(),
                content: b.content.to_string(),
                image_url: b.image_url.to_string(),
                published_at: Utc
                    .with_ymd_and_hms(2025, 9, 1, hour, minute, 0)
                    .single()
                    .unwrap_or_default(),
                source: b.source.to_string(),
                category: b.category.to_string(),
                author: Some(b.author.to_string()),
                url: b.url.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_dataset() {
        let articles = fallback_articles();
        assert_eq!(articles.len(), 5);
        assert!(articles.windows(2).all(|w| w[0].published_at > w[1].published_at));
        for article in &articles {
            assert!(CATEGORIES.iter().any(|c| c.name == article.category));
        }
    }

    #[test]
    fn test_category_label() {
        assert_eq!(category_label("science"), "Science");
        assert_eq!(category_label("politics"), "politics");
    }
}
