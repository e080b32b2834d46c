use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::snippet;

/// Structurally valid document whose entries are not yet typed.
///
/// Field-level problems (a character without a name, a non-numeric strength)
/// are left for the validator so they are reported as schema errors rather
/// than parse errors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DraftAnalysis {
    pub characters: Vec<Value>,
    pub interactions: Vec<Value>,
    #[serde(default)]
    pub genre: Option<Value>,
    #[serde(default, rename = "writingStyle")]
    pub writing_style: Option<Value>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("structural parse error: {message}")]
pub struct StructuralParseError {
    pub message: String,
    pub snippet: String,
}

impl StructuralParseError {
    fn new(text: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            snippet: snippet(text),
        }
    }
}

/// Strictly parse a repaired candidate. Unknown fields are ignored.
pub fn parse_candidate(text: &str) -> Result<DraftAnalysis, StructuralParseError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| StructuralParseError::new(text, e.to_string()))?;

    if !value.is_object() {
        return Err(StructuralParseError::new(text, "top-level value is not an object"));
    }

    serde_json::from_value(value).map_err(|e| StructuralParseError::new(text, e.to_string()))
}
