use chrono::Utc;
use nd_client::catalog::category_label;
use nd_client::{DisplayArticle, ListingView, Visible};
use nd_core::ValidationErrors;
use std::fmt::Write;

const DESCRIPTION_EXCERPT: usize = 100;

pub fn card(article: &DisplayArticle) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[{}] {} · {}{}",
        article.id,
        article.source,
        article.local_published_at("%Y-%m-%d %H:%M"),
        if article.is_published(Utc::now()) { "" } else { " (scheduled)" }
    );
    let _ = writeln!(out, "  {}", article.title);
    let _ = writeln!(out, "  {}", DisplayArticle::excerpt(&article.description, DESCRIPTION_EXCERPT));
    let byline = article
        .author
        .as_deref()
        .map(|a| format!("by {} · ", a))
        .unwrap_or_default();
    let _ = writeln!(out, "  {}{}", byline, category_label(&article.category));
    out
}

pub fn detail(article: &DisplayArticle) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} · {} · {}",
        category_label(&article.category),
        article.source,
        article.local_published_at("%Y-%m-%d %H:%M")
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", article.title);
    if let Some(author) = &article.author {
        let _ = writeln!(out, "Author: {}", author);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", article.description);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", article.content);
    if !article.image_url.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Image: {}", article.image_url);
    }
    let _ = writeln!(out, "Read the original: {}", article.url);
    out
}

pub fn listing(view: &ListingView) -> String {
    let mut out = String::new();
    if let Some(notice) = view.notice() {
        let _ = writeln!(out, "⚠️  {}", notice);
        let _ = writeln!(out);
    }
    match view.visible() {
        Visible::Loading => {
            let _ = writeln!(out, "Loading...");
        }
        Visible::Empty => {
            let _ = writeln!(out, "No articles in this category");
        }
        Visible::Articles(articles) => {
            for article in articles {
                let _ = writeln!(out, "{}", card(article));
            }
        }
    }
    out
}

pub fn validation_errors(errors: &ValidationErrors) -> String {
    let mut out = String::new();
    for (field, messages) in errors.iter() {
        for message in messages {
            let _ = writeln!(out, "  {}: {}", field, message);
        }
    }
    out
}
