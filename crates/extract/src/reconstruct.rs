//! Field-level fallback for output that defeats whole-document parsing.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::candidate::balanced_span;
use crate::parser::{DraftAnalysis, StructuralParseError, parse_candidate};
use crate::repair::repair;

static CHARACTERS_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:"characters"|\bcharacters\b)\s*:\s*\["#).expect("characters regex"));

static INTERACTIONS_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:"interactions"|\binteractions\b)\s*:\s*\["#).expect("interactions regex"));

static GENRE_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""genre"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("genre regex")
});

static WRITING_STYLE_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""writingStyle"\s*:\s*\{"#).expect("writing style regex"));

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconstructionFailed {
    #[error("no balanced `{0}` array in model output")]
    MissingFragment(&'static str),

    #[error("reassembled document did not parse: {0}")]
    Unparseable(#[from] StructuralParseError),
}

/// Rebuild a minimal document from the `characters` and `interactions`
/// arrays found in `raw`.
///
/// `genre` and `writingStyle` are dropped unless `salvage_metadata` is set, in
/// which case well-formed ones are carried over when present.
pub fn reconstruct(raw: &str, salvage_metadata: bool) -> Result<DraftAnalysis, ReconstructionFailed> {
    let characters = first_balanced(&CHARACTERS_ARRAY, raw, '[', ']')
        .ok_or(ReconstructionFailed::MissingFragment("characters"))?;
    let interactions = first_balanced(&INTERACTIONS_ARRAY, raw, '[', ']')
        .ok_or(ReconstructionFailed::MissingFragment("interactions"))?;

    let mut document = format!("{{\"characters\": {characters}, \"interactions\": {interactions}");
    if salvage_metadata {
        if let Some(genre) = GENRE_STRING.captures(raw).and_then(|c| c.get(1)) {
            document.push_str(&format!(", \"genre\": \"{}\"", genre.as_str()));
        }
        if let Some(style) = first_balanced(&WRITING_STYLE_OBJECT, raw, '{', '}') {
            document.push_str(&format!(", \"writingStyle\": {style}"));
        }
    }
    document.push('}');

    Ok(parse_candidate(&repair(&document))?)
}

/// First match of `key` whose opening delimiter closes within the text.
fn first_balanced<'a>(key: &Regex, text: &'a str, open: char, close: char) -> Option<&'a str> {
    key.find_iter(text)
        .find_map(|m| balanced_span(text, m.end() - open.len_utf8(), open, close))
}
