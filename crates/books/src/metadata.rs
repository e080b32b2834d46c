use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<meta name="title" content="([^"]+)">"#).expect("title regex"));

static TITLE_BYLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" by [^|]+$").expect("byline regex"));

static AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a href="/ebooks/author/\d+" rel="marcrel:aut"[^>]*>([^<]+)</a>"#).expect("author regex")
});

static LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<tr[^>]*itemprop="inLanguage"[^>]*>.*?<td>([^<]+)</td>"#).expect("language regex")
});

static SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<th>Subject</th>\s*<td[^>]*>\s*<a[^>]*>([^<]+)</a>").expect("subject regex")
});

static SUMMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<span class="toggle-content">\s*([^<]+)"#).expect("summary regex"));

static COVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img class="cover-art" src="([^"]+)""#).expect("cover regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub subjects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

/// Scrape what we can from a Gutenberg ebook page. Missing pieces stay empty.
pub fn extract_book_metadata(html: &str) -> BookMetadata {
    let title = first_capture(&TITLE, html).map(|title| TITLE_BYLINE.replace(&title, "").trim().to_string());

    let subjects = SUBJECT
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect();

    BookMetadata {
        title,
        author: first_capture(&AUTHOR, html),
        language: first_capture(&LANGUAGE, html),
        subjects,
        summary: first_capture(&SUMMARY, html),
        cover_image: COVER
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
    }
}

fn first_capture(pattern: &Regex, html: &str) -> Option<String> {
    pattern
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}
