//! Cleanup of OCR text into a search-ready card name.
//!
//! The Magic-term filter matches substrings, so a real name word that merely
//! contains a term (e.g. "Highland", "Other") is dropped as well. This is
//! a known source of false positives; the lookup cascade retries with the
//! unfiltered text to compensate.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Symbols OCR tends to inject around the title bar.
const ARTIFACT_PATTERN: &str = r#"[@#$%^&*()_+={}\[\]|\\:;"'<>?!]"#;

static ARTIFACTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ARTIFACT_PATTERN).expect("artifact pattern is a valid regex"));

const STOP_WORDS: &[&str] = &["and", "or", "of", "a", "an"];

/// Type-line words that leak into the name band.
const MAGIC_TERMS: &[&str] = &[
    "planeswalker",
    "instant",
    "sorcery",
    "creature",
    "enchantment",
    "artifact",
    "land",
    "basic land",
    "legendary",
    "token",
    "the",
];

/// A cleaned card name together with the OCR line it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedName {
    /// Search-ready name
    pub value: String,
    /// The line of OCR text it was derived from
    pub source_line: String,
}

impl NormalizedName {
    /// Picks the name line out of OCR text and cleans it.
    /// Returns `None` when no usable line remains.
    pub fn from_ocr_text(text: &str) -> Option<Self> {
        let line = select_name_line(text)?;
        let value = clean_card_name(line);
        if value.is_empty() {
            return None;
        }
        Some(Self {
            value,
            source_line: line.to_string(),
        })
    }
}

/// First non-blank line longer than two characters, trimmed.
pub fn select_name_line(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| line.chars().count() > 2)
}

/// Removes OCR artifacts, stop words and leaked type-line terms.
///
/// Falls back to the artifact-free text when filtering would remove every
/// word, so a name is never erased outright.
pub fn clean_card_name(name: &str) -> String {
    let stripped = ARTIFACTS.replace_all(name, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    let filtered: Vec<&str> = collapsed
        .split(' ')
        .filter(|word| keep_word(word))
        .collect();

    if filtered.is_empty() {
        collapsed
    } else {
        filtered.join(" ")
    }
}

fn keep_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    word.chars().count() > 1
        && !STOP_WORDS.contains(&lower.as_str())
        && !MAGIC_TERMS.iter().any(|term| lower.contains(term))
}
