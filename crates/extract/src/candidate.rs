//! Locating the JSON document inside raw model output.
//!
//! Strategies run in a fixed priority order and the first one that matches
//! wins. Every strategy is a pure function of the text, so each can be tested
//! on its own and the chain can be reordered or extended by the caller.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::repair::{bracket_deficits, is_valid_json};

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```").expect("fenced block regex")
});

static SECTION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:JSON\s+format|بتنسيق\s+JSON|صيغة\s+JSON)").expect("section label regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    FencedBlock,
    LabeledSection,
    StructuralMatch,
    WholeText,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::FencedBlock => "fenced_block",
            StrategyKind::LabeledSection => "labeled_section",
            StrategyKind::StructuralMatch => "structural_match",
            StrategyKind::WholeText => "whole_text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionCandidate {
    pub text: String,
    pub strategy: StrategyKind,
}

impl ExtractionCandidate {
    fn new(text: impl Into<String>, strategy: StrategyKind) -> Self {
        Self {
            text: text.into(),
            strategy,
        }
    }
}

pub trait CandidateStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// `None` when the strategy does not apply; a returned candidate is never empty.
    fn try_extract(&self, text: &str) -> Option<ExtractionCandidate>;
}

/// Content of the first ``` fence pair, with or without a `json` tag.
pub struct FencedBlock;

impl CandidateStrategy for FencedBlock {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FencedBlock
    }

    fn try_extract(&self, text: &str) -> Option<ExtractionCandidate> {
        let captures = FENCED_BLOCK.captures(text)?;
        let body = captures.get(1)?.as_str().trim();
        if body.is_empty() {
            return None;
        }
        Some(ExtractionCandidate::new(body, self.kind()))
    }
}

/// First balanced object after a "JSON format" marker, skipping restated instructions.
pub struct LabeledSection;

impl CandidateStrategy for LabeledSection {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LabeledSection
    }

    fn try_extract(&self, text: &str) -> Option<ExtractionCandidate> {
        let label = SECTION_LABEL.find(text)?;
        let open = label.end() + text[label.end()..].find('{')?;
        let object = balanced_span(text, open, '{', '}')?;
        Some(ExtractionCandidate::new(object, self.kind()))
    }
}

/// From the first `{` to the end of text, closed off when truncated.
pub struct StructuralMatch;

impl CandidateStrategy for StructuralMatch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StructuralMatch
    }

    fn try_extract(&self, text: &str) -> Option<ExtractionCandidate> {
        let start = text.find('{')?;
        let tail = text[start..].trim_end();
        if !tail.contains("\"characters\"") || !tail.contains("\"interactions\"") {
            return None;
        }

        let mut candidate = tail.to_string();
        let deficits = bracket_deficits(tail);
        if deficits.braces > 0 && !is_valid_json(tail) {
            candidate.push_str(&"]".repeat(deficits.brackets));
            candidate.push_str(&"}".repeat(deficits.braces));
        }
        Some(ExtractionCandidate::new(candidate, self.kind()))
    }
}

pub struct WholeText;

impl CandidateStrategy for WholeText {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WholeText
    }

    fn try_extract(&self, text: &str) -> Option<ExtractionCandidate> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(ExtractionCandidate::new(trimmed, self.kind()))
    }
}

pub fn default_strategies() -> Vec<Box<dyn CandidateStrategy>> {
    vec![
        Box::new(FencedBlock),
        Box::new(LabeledSection),
        Box::new(StructuralMatch),
        Box::new(WholeText),
    ]
}

/// Run `strategies` in order. Falls back to the raw text when nothing matches.
pub fn extract_candidate(strategies: &[Box<dyn CandidateStrategy>], text: &str) -> ExtractionCandidate {
    strategies
        .iter()
        .find_map(|strategy| strategy.try_extract(text))
        .unwrap_or_else(|| ExtractionCandidate::new(text, StrategyKind::WholeText))
}

/// The `open`..`close` span starting at byte `start`, ignoring delimiters
/// inside string literals. `None` if it never closes.
pub(crate) fn balanced_span(text: &str, start: usize, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_with_tag() {
        let text = "Sure!\n```json\n{\"characters\":[],\"interactions\":[]}\n```\nEnjoy.";
        let candidate = FencedBlock.try_extract(text).unwrap();
        assert_eq!(candidate.text, "{\"characters\":[],\"interactions\":[]}");
        assert_eq!(candidate.strategy, StrategyKind::FencedBlock);
    }

    #[test]
    fn test_fenced_block_without_tag_takes_first_pair() {
        let text = "```\n{\"a\":1}\n```\n```json\n{\"b\":2}\n```";
        assert_eq!(FencedBlock.try_extract(text).unwrap().text, "{\"a\":1}");
    }

    #[test]
    fn test_unclosed_or_empty_fence_does_not_match() {
        assert!(FencedBlock.try_extract("```json\n{\"characters\": [").is_none());
        assert!(FencedBlock.try_extract("```json\n\n```").is_none());
    }

    #[test]
    fn test_labeled_section_skips_preamble() {
        let text = "You asked for the data in JSON format, so here it is:\n\
                    {\"characters\": [{\"name\": \"Ahab\"}], \"interactions\": []}\n\
                    Let me know if you need more {details}.";
        let candidate = LabeledSection.try_extract(text).unwrap();
        assert_eq!(
            candidate.text,
            "{\"characters\": [{\"name\": \"Ahab\"}], \"interactions\": []}"
        );
    }

    #[test]
    fn test_labeled_section_arabic_marker() {
        let text = "إليك النتائج بتنسيق JSON: {\"characters\": [], \"interactions\": []}";
        let candidate = LabeledSection.try_extract(text).unwrap();
        assert_eq!(candidate.strategy, StrategyKind::LabeledSection);
        assert!(candidate.text.starts_with('{'));
    }

    #[test]
    fn test_labeled_section_ignores_braces_in_strings() {
        let text = "json format {\"genre\": \"a } b\", \"characters\": []} trailing";
        let candidate = LabeledSection.try_extract(text).unwrap();
        assert_eq!(candidate.text, "{\"genre\": \"a } b\", \"characters\": []}");
    }

    #[test]
    fn test_structural_match_closes_truncated_document() {
        let text = "{\"characters\":[{\"name\":\"A\",\"description\":\"d\"}],\"interactions\":[";
        let candidate = StructuralMatch.try_extract(text).unwrap();
        assert_eq!(
            candidate.text,
            "{\"characters\":[{\"name\":\"A\",\"description\":\"d\"}],\"interactions\":[]}"
        );
    }

    #[test]
    fn test_structural_match_never_over_closes() {
        let text = "{\"characters\":[],\"interactions\":[]}";
        assert_eq!(StructuralMatch.try_extract(text).unwrap().text, text);
    }

    #[test]
    fn test_structural_match_keeps_valid_document_with_literal_brace() {
        let text = "{\"characters\": [{\"name\": \"A\", \"description\": \"draws a { on the wall\"}], \"interactions\": []}";
        assert_eq!(StructuralMatch.try_extract(text).unwrap().text, text);
    }

    #[test]
    fn test_structural_match_requires_both_keys() {
        assert!(StructuralMatch.try_extract("{\"characters\": []}").is_none());
    }

    #[test]
    fn test_priority_order_prefers_fence() {
        let text = "in JSON format: {\"x\": 1}\n```json\n{\"characters\":[],\"interactions\":[]}\n```";
        let candidate = extract_candidate(&default_strategies(), text);
        assert_eq!(candidate.strategy, StrategyKind::FencedBlock);
    }

    #[test]
    fn test_falls_back_to_whole_text() {
        let candidate = extract_candidate(&default_strategies(), "  no json here ");
        assert_eq!(candidate.strategy, StrategyKind::WholeText);
        assert_eq!(candidate.text, "no json here");

        let candidate = extract_candidate(&[], "raw");
        assert_eq!(candidate.text, "raw");
    }
}
