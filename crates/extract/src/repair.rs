//! Textual healing for near-valid JSON.
//!
//! The comma and key rules only touch text outside string literals. Brace
//! balancing counts every delimiter, string contents included, and only ever
//! appends closers. It is skipped when the healed text already parses.

use regex::Regex;
use serde::de::IgnoredAny;
use std::sync::LazyLock;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:,\s*)+([}\]])").expect("trailing comma regex"));

static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*):").expect("bare key regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Deficits {
    pub braces: usize,
    pub brackets: usize,
}

/// How many `}` and `]` are missing, by plain counting.
pub(crate) fn bracket_deficits(text: &str) -> Deficits {
    let (mut open_brace, mut close_brace, mut open_bracket, mut close_bracket) = (0usize, 0usize, 0usize, 0usize);
    for c in text.chars() {
        match c {
            '{' => open_brace += 1,
            '}' => close_brace += 1,
            '[' => open_bracket += 1,
            ']' => close_bracket += 1,
            _ => {}
        }
    }
    Deficits {
        braces: open_brace.saturating_sub(close_brace),
        brackets: open_bracket.saturating_sub(close_bracket),
    }
}

/// Whether `text` is already a complete JSON value.
pub(crate) fn is_valid_json(text: &str) -> bool {
    serde_json::from_str::<IgnoredAny>(text).is_ok()
}

/// Apply every healing rule. Total and idempotent; the result may still be invalid JSON.
pub fn repair(candidate: &str) -> String {
    let mut healed = heal_outside_strings(candidate);
    if is_valid_json(&healed) {
        return healed;
    }

    let deficits = bracket_deficits(&healed);
    if deficits == Deficits::default() {
        return healed;
    }
    healed.push_str(&"]".repeat(deficits.brackets));
    healed.push_str(&"}".repeat(deficits.braces));

    // Closers can land right after a dangling comma.
    heal_outside_strings(&healed)
}

fn heal_outside_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut code = String::new();
    let mut in_string = false;
    let mut escape_next = false;

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c == '"' {
            out.push_str(&heal_code(&code));
            code.clear();
            out.push(c);
            in_string = true;
        } else {
            code.push(c);
        }
    }
    out.push_str(&heal_code(&code));
    out
}

fn heal_code(code: &str) -> String {
    let without_commas = TRAILING_COMMA.replace_all(code, "${1}");
    BARE_KEY
        .replace_all(&without_commas, "${1}\"${2}\"${3}:")
        .into_owned()
}
