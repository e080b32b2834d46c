use reqwest::StatusCode;
use reqwest::header::USER_AGENT;
use tracing::{debug, warn};

use crate::metadata::extract_book_metadata;
use crate::{Book, BookError, truncate_content, validate_book_id};

const AGENT: &str = "Mozilla/5.0 (compatible; GutenbergAnalyzer/1.0)";

#[derive(Clone)]
pub struct GutenbergClient {
    base_url: String,
    max_content_chars: usize,
    client: reqwest::Client,
}

impl GutenbergClient {
    pub fn new(base_url: String, max_content_chars: usize) -> Self {
        Self {
            base_url,
            max_content_chars,
            client: reqwest::Client::new(),
        }
    }

    pub fn metadata_url(&self, book_id: &str) -> String {
        format!("{}/ebooks/{}", self.base_url.trim_end_matches('/'), book_id)
    }

    pub fn content_url(&self, book_id: &str) -> String {
        format!(
            "{}/files/{}/{}-0.txt",
            self.base_url.trim_end_matches('/'),
            book_id,
            book_id
        )
    }

    /// Fetch the ebook page and plain-text body together.
    pub async fn fetch_book(&self, book_id: &str) -> Result<Book, BookError> {
        validate_book_id(book_id)?;

        let metadata_url = self.metadata_url(book_id);
        let content_url = self.content_url(book_id);
        let (metadata_page, content) = tokio::join!(
            self.get_text(&metadata_url),
            self.get_text(&content_url),
        );

        let metadata_html = match metadata_page? {
            Ok(html) => html,
            Err(status) => return Err(BookError::MetadataStatus(status.as_u16())),
        };
        let content = match content? {
            Ok(text) => text,
            Err(status) => return Err(BookError::ContentStatus(status.as_u16())),
        };

        let metadata = extract_book_metadata(&metadata_html);
        debug!(
            book_id,
            title = metadata.title.as_deref().unwrap_or(""),
            content_chars = content.chars().count(),
            "Fetched book"
        );

        Ok(Book {
            book_id: book_id.to_string(),
            metadata_available: true,
            metadata,
            content: truncate_content(&content, self.max_content_chars),
        })
    }

    /// Outer error is transport, inner is a non-success status.
    async fn get_text(&self, url: &str) -> Result<Result<String, StatusCode>, BookError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, AGENT)
            .send()
            .await
            .map_err(|e| {
                warn!(url, error = %e, "Gutenberg request failed");
                BookError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Ok(Err(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BookError::Transport(e.to_string()))?;
        Ok(Ok(body))
    }
}
