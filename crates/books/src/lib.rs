pub mod gutenberg;
pub mod metadata;

pub use gutenberg::GutenbergClient;
pub use metadata::{BookMetadata, extract_book_metadata};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BookError {
    #[error("invalid book id: {0:?}")]
    InvalidId(String),

    #[error("failed to fetch book metadata (status {0})")]
    MetadataStatus(u16),

    #[error("failed to fetch book content (status {0})")]
    ContentStatus(u16),

    #[error("request to Project Gutenberg failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub book_id: String,
    pub metadata_available: bool,
    pub metadata: BookMetadata,
    pub content: String,
}

/// Gutenberg ebook numbers are plain decimal ids.
pub fn validate_book_id(book_id: &str) -> Result<(), BookError> {
    if book_id.is_empty() || !book_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BookError::InvalidId(book_id.to_string()));
    }
    Ok(())
}

/// Keep the first `max_chars` characters and mark the cut with "...".
///
/// The marker is appended even when nothing was cut, matching what clients
/// of the book endpoint already expect.
pub fn truncate_content(text: &str, max_chars: usize) -> String {
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
