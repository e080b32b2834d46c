use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub description: String,
    /// Nominally 1-10; passed through unclamped.
    pub strength: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingStyle {
    #[serde(default)]
    pub formality: String,
    #[serde(default)]
    pub approach: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub characters: Vec<CharacterRecord>,
    pub interactions: Vec<InteractionRecord>,
    #[serde(default)]
    pub genre: String,
    #[serde(default, rename = "writingStyle")]
    pub writing_style: WritingStyle,
}

impl AnalysisResult {
    /// Interactions whose source or target names no character in this result.
    pub fn dangling_interactions(&self) -> Vec<&InteractionRecord> {
        self.interactions
            .iter()
            .filter(|i| !self.has_character(&i.source) || !self.has_character(&i.target))
            .collect()
    }

    fn has_character(&self, name: &str) -> bool {
        self.characters.iter().any(|c| c.name == name)
    }
}

/// Language the caller asked the model to answer in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedLocale {
    /// English
    #[default]
    Default,
    /// Arabic
    Alternate,
}

impl RequestedLocale {
    pub fn tag(&self) -> &'static str {
        match self {
            RequestedLocale::Default => "en",
            RequestedLocale::Alternate => "ar",
        }
    }

    /// Resolve a locale tag or an `Accept-Language` value such as `ar-EG,ar;q=0.9`.
    /// Only the first listed language counts; anything not Arabic is the default.
    pub fn from_language_tag(value: &str) -> Self {
        let primary = value
            .split(',')
            .next()
            .and_then(|lang| lang.split(';').next())
            .map(|lang| lang.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if primary == "ar" || primary.starts_with("ar-") {
            RequestedLocale::Alternate
        } else {
            RequestedLocale::Default
        }
    }
}

impl fmt::Display for RequestedLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_from_accept_language() {
        assert_eq!(RequestedLocale::from_language_tag("ar"), RequestedLocale::Alternate);
        assert_eq!(RequestedLocale::from_language_tag("AR-eg,en;q=0.5"), RequestedLocale::Alternate);
        assert_eq!(RequestedLocale::from_language_tag("en-US,ar;q=0.9"), RequestedLocale::Default);
        assert_eq!(RequestedLocale::from_language_tag("arn"), RequestedLocale::Default);
        assert_eq!(RequestedLocale::from_language_tag(""), RequestedLocale::Default);
    }

    #[test]
    fn test_writing_style_serializes_camel_case_key() {
        let result = AnalysisResult {
            characters: vec![],
            interactions: vec![],
            genre: "Satire".to_string(),
            writing_style: WritingStyle::default(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("writingStyle").is_some());
        assert!(json.get("writing_style").is_none());
    }

    #[test]
    fn test_dangling_interactions() {
        let result = AnalysisResult {
            characters: vec![CharacterRecord {
                name: "Alice".to_string(),
                description: String::new(),
            }],
            interactions: vec![
                InteractionRecord {
                    source: "Alice".to_string(),
                    target: "Alice".to_string(),
                    description: "talks to herself".to_string(),
                    strength: 2,
                },
                InteractionRecord {
                    source: "Alice".to_string(),
                    target: "Hatter".to_string(),
                    description: "tea party".to_string(),
                    strength: 7,
                },
            ],
            genre: String::new(),
            writing_style: WritingStyle::default(),
        };

        let dangling = result.dangling_interactions();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].target, "Hatter");
    }
}
