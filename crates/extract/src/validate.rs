use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PipelineError, snippet};
use crate::parser::DraftAnalysis;
use crate::schema::{AnalysisResult, CharacterRecord, InteractionRecord, RequestedLocale, WritingStyle};

/// English words frequent enough that any real sentence contains one.
const FUNCTION_WORDS: &[&str] = &[
    "the", "and", "is", "in", "of", "to", "a", "an", "was", "are", "he", "she", "his", "her",
    "with", "for", "on", "that", "it", "as", "by", "at", "from", "who", "their",
];

/// Decides whether a piece of model output is written only in the default language.
pub trait LanguageCheck: Send + Sync {
    fn is_default_language_only(&self, text: &str) -> bool;
}

/// English function words present and no Arabic script present.
///
/// Short or mixed text can fool it in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionWordHeuristic;

impl LanguageCheck for FunctionWordHeuristic {
    fn is_default_language_only(&self, text: &str) -> bool {
        if text.chars().any(is_arabic_script) {
            return false;
        }
        text.split(|c: char| !c.is_alphabetic())
            .filter(|word| !word.is_empty())
            .any(|word| FUNCTION_WORDS.contains(&word.to_lowercase().as_str()))
    }
}

fn is_arabic_script(c: char) -> bool {
    matches!(
        c,
        '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}'
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Inclusive bounds for interaction strength. `None` lets any integer through.
    pub strength_range: Option<(i64, i64)>,
}

/// Type every entry of `draft`, failing on the first field that does not fit.
pub fn validate_schema(
    draft: &DraftAnalysis,
    policy: &ValidationPolicy,
) -> Result<AnalysisResult, PipelineError> {
    let characters = draft
        .characters
        .iter()
        .enumerate()
        .map(|(i, value)| character(value, &format!("characters[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    let interactions = draft
        .interactions
        .iter()
        .enumerate()
        .map(|(i, value)| interaction(value, &format!("interactions[{i}]"), policy))
        .collect::<Result<Vec<_>, _>>()?;

    let genre = match &draft.genre {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(genre)) => genre.clone(),
        Some(_) => return Err(PipelineError::schema("genre", "must be text")),
    };

    let writing_style = match &draft.writing_style {
        None | Some(Value::Null) => WritingStyle::default(),
        Some(Value::Object(style)) => WritingStyle {
            formality: optional_text(style, "formality", "writingStyle")?,
            approach: optional_text(style, "approach", "writingStyle")?,
            notes: optional_text(style, "notes", "writingStyle")?,
        },
        Some(_) => return Err(PipelineError::schema("writingStyle", "must be an object")),
    };

    Ok(AnalysisResult {
        characters,
        interactions,
        genre,
        writing_style,
    })
}

/// Reject alternate-locale results that read as default-language text.
pub fn check_locale(
    result: &AnalysisResult,
    locale: RequestedLocale,
    language: &dyn LanguageCheck,
) -> Result<(), PipelineError> {
    if locale == RequestedLocale::Default {
        return Ok(());
    }

    match locale_sample(result) {
        Some(sample) if language.is_default_language_only(sample) => {
            Err(PipelineError::LocaleMismatch {
                requested: locale,
                sample: snippet(sample),
            })
        }
        _ => Ok(()),
    }
}

/// The first non-empty descriptive field, in a fixed order of preference.
pub fn locale_sample(result: &AnalysisResult) -> Option<&str> {
    let first_character = result.characters.first().map(|c| c.description.as_str());
    let first_interaction = result.interactions.first().map(|i| i.description.as_str());

    [
        first_character,
        first_interaction,
        Some(result.genre.as_str()),
        Some(result.writing_style.notes.as_str()),
    ]
    .into_iter()
    .flatten()
    .find(|text| !text.trim().is_empty())
}

fn character(value: &Value, path: &str) -> Result<CharacterRecord, PipelineError> {
    let fields = as_object(value, path)?;
    Ok(CharacterRecord {
        name: required_text(fields, "name", path)?,
        description: optional_text(fields, "description", path)?,
    })
}

fn interaction(
    value: &Value,
    path: &str,
    policy: &ValidationPolicy,
) -> Result<InteractionRecord, PipelineError> {
    let fields = as_object(value, path)?;
    let source = required_text(fields, "source", path)?;
    let target = required_text(fields, "target", path)?;
    let description = optional_text(fields, "description", path)?;
    let strength = strength(fields.get("strength"), &format!("{path}.strength"))?;

    if let Some((low, high)) = policy.strength_range {
        if strength < low || strength > high {
            return Err(PipelineError::schema(
                format!("{path}.strength"),
                format!("{strength} is outside {low}..={high}"),
            ));
        }
    }

    Ok(InteractionRecord {
        source,
        target,
        description,
        strength,
    })
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, PipelineError> {
    value
        .as_object()
        .ok_or_else(|| PipelineError::schema(path, "must be an object"))
}

fn required_text(fields: &Map<String, Value>, key: &str, path: &str) -> Result<String, PipelineError> {
    match fields.get(key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.clone()),
        Some(Value::String(_)) => Err(PipelineError::schema(format!("{path}.{key}"), "must not be empty")),
        None | Some(Value::Null) => Err(PipelineError::schema(format!("{path}.{key}"), "is missing")),
        Some(_) => Err(PipelineError::schema(format!("{path}.{key}"), "must be text")),
    }
}

fn optional_text(fields: &Map<String, Value>, key: &str, path: &str) -> Result<String, PipelineError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(PipelineError::schema(format!("{path}.{key}"), "must be text")),
    }
}

/// Integers pass as-is; fractional and numeric-looking text values round to nearest.
fn strength(value: Option<&Value>, path: &str) -> Result<i64, PipelineError> {
    let coerced = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(round_to_i64)),
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(round_to_i64))
        }
        None | Some(Value::Null) => return Err(PipelineError::schema(path, "is missing")),
        Some(_) => None,
    };
    coerced.ok_or_else(|| PipelineError::schema(path, "must be numeric"))
}

fn round_to_i64(value: f64) -> Option<i64> {
    let rounded = value.round();
    if rounded.is_finite() && rounded.abs() < 9.0e18 {
        Some(rounded as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(value: Value) -> DraftAnalysis {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_types_a_complete_document() {
        let result = validate_schema(
            &draft(json!({
                "characters": [{"name": "Elizabeth", "description": "second daughter"}, {"name": "Darcy"}],
                "interactions": [{"source": "Elizabeth", "target": "Darcy", "description": "spar", "strength": 9}],
                "genre": "Romance",
                "writingStyle": {"formality": "formal", "approach": "ironic"}
            })),
            &ValidationPolicy::default(),
        )
        .unwrap();

        assert_eq!(result.characters[1].description, "");
        assert_eq!(result.interactions[0].strength, 9);
        assert_eq!(result.writing_style.approach, "ironic");
        assert_eq!(result.writing_style.notes, "");
    }

    #[test]
    fn test_missing_name_is_schema_invalid() {
        let err = validate_schema(
            &draft(json!({"characters": [{"name": "A"}, {"description": "nameless"}], "interactions": []})),
            &ValidationPolicy::default(),
        )
        .unwrap_err();

        assert_eq!(err, PipelineError::schema("characters[1].name", "is missing"));
    }

    #[test]
    fn test_blank_source_is_schema_invalid() {
        let err = validate_schema(
            &draft(json!({"characters": [], "interactions": [{"source": " ", "target": "B", "strength": 1}]})),
            &ValidationPolicy::default(),
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::SchemaInvalid { ref path, .. } if path == "interactions[0].source"));
    }

    #[test]
    fn test_strength_coercion() {
        let cases = [(json!(7), 7), (json!("8"), 8), (json!(" 3 "), 3), (json!(6.6), 7), (json!("2.4"), 2), (json!(42), 42)];
        for (raw, expected) in cases {
            let result = validate_schema(
                &draft(json!({"characters": [], "interactions": [{"source": "A", "target": "B", "strength": raw}]})),
                &ValidationPolicy::default(),
            )
            .unwrap();
            assert_eq!(result.interactions[0].strength, expected);
        }
    }

    #[test]
    fn test_non_numeric_strength_fails() {
        for raw in [json!("strong"), json!(true), json!([5])] {
            let err = validate_schema(
                &draft(json!({"characters": [], "interactions": [{"source": "A", "target": "B", "strength": raw}]})),
                &ValidationPolicy::default(),
            )
            .unwrap_err();
            assert_eq!(err, PipelineError::schema("interactions[0].strength", "must be numeric"));
        }
    }

    #[test]
    fn test_strength_range_policy() {
        let doc = draft(json!({"characters": [], "interactions": [{"source": "A", "target": "B", "strength": 12}]}));

        assert!(validate_schema(&doc, &ValidationPolicy::default()).is_ok());

        let strict = ValidationPolicy {
            strength_range: Some((1, 10)),
        };
        assert!(matches!(
            validate_schema(&doc, &strict),
            Err(PipelineError::SchemaInvalid { .. })
        ));
    }

    #[test]
    fn test_non_object_entries_and_metadata() {
        let policy = ValidationPolicy::default();
        assert!(validate_schema(&draft(json!({"characters": ["A"], "interactions": []})), &policy).is_err());
        assert!(validate_schema(&draft(json!({"characters": [], "interactions": [], "genre": 5})), &policy).is_err());
        assert!(
            validate_schema(&draft(json!({"characters": [], "interactions": [], "writingStyle": "plain"})), &policy)
                .is_err()
        );
    }

    #[test]
    fn test_heuristic_flags_english() {
        let check = FunctionWordHeuristic;
        assert!(check.is_default_language_only("the quick man"));
        assert!(check.is_default_language_only("Captain of THE ship"));
        assert!(!check.is_default_language_only("رجل سريع"));
        assert!(!check.is_default_language_only("the رجل"));
        // "theory" and "island" contain function words but are not function words.
        assert!(!check.is_default_language_only("theory island"));
    }

    fn with_description(description: &str) -> AnalysisResult {
        AnalysisResult {
            characters: vec![CharacterRecord {
                name: "Ahab".to_string(),
                description: description.to_string(),
            }],
            interactions: vec![],
            genre: String::new(),
            writing_style: WritingStyle::default(),
        }
    }

    #[test]
    fn test_locale_mismatch_only_for_alternate() {
        let english = with_description("the quick man");

        assert!(check_locale(&english, RequestedLocale::Default, &FunctionWordHeuristic).is_ok());
        assert!(matches!(
            check_locale(&english, RequestedLocale::Alternate, &FunctionWordHeuristic),
            Err(PipelineError::LocaleMismatch { requested: RequestedLocale::Alternate, .. })
        ));

        let arabic = with_description("قبطان السفينة");
        assert!(check_locale(&arabic, RequestedLocale::Alternate, &FunctionWordHeuristic).is_ok());
    }

    #[test]
    fn test_locale_sample_falls_through_empty_fields() {
        let mut result = with_description("");
        result.genre = "the genre".to_string();
        assert_eq!(locale_sample(&result), Some("the genre"));

        result.genre.clear();
        assert_eq!(locale_sample(&result), None);
        assert!(check_locale(&result, RequestedLocale::Alternate, &FunctionWordHeuristic).is_ok());
    }
}
