//! crates/assessment_core/src/domain.rs
//!
//! Defines the pure, core data structures for passage generation and caching.
//! These structs carry serde derives only so the web layer can return them as-is.

use crate::languages;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A normalized ISO 639 language identifier (2 letters, occasionally 3).
///
/// Only constructible through [`LanguageCode::parse`] or
/// [`LanguageCode::from_two_letter`], so every value in the cache is lowercase ASCII.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Accepts 2 or 3 ASCII letters in any case, returning the lowercase code.
    pub fn parse(input: &str) -> Option<Self> {
        languages::is_language_code(input).then(|| Self(input.trim().to_ascii_lowercase()))
    }

    /// Accepts exactly 2 ASCII letters in any case.
    pub fn from_two_letter(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.len() == 2 && trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
            Some(Self(trimmed.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A reading passage presented to an assessment taker. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    pub id: Uuid,
    pub text: String,
    pub title: String,
    /// Expected reading time in seconds.
    pub estimated_duration: u32,
    pub language_code: LanguageCode,
    pub generated_at: DateTime<Utc>,
}

impl Passage {
    /// Stamps raw generator output with a fresh id, its language and the current time.
    pub fn from_generated(generated: GeneratedPassage, language_code: LanguageCode) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: generated.text,
            title: generated.title,
            estimated_duration: generated.estimated_duration,
            language_code,
            generated_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> PassageSummary {
        PassageSummary {
            id: self.id,
            language_code: self.language_code.clone(),
            title: self.title.clone(),
            generated_at: self.generated_at,
        }
    }
}

/// Raw output of a passage generator, before the manager stamps it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPassage {
    pub text: String,
    pub title: String,
    pub estimated_duration: u32,
}

/// What the manager asks a generator for.
#[derive(Debug, Clone, PartialEq)]
pub struct PassageRequest {
    pub language_code: LanguageCode,
    /// English display name of the language, used in prompts.
    pub language_name: String,
    /// Set when the caller explicitly asked for a different passage.
    pub regenerate: bool,
}

/// A compact view of a cached passage for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageSummary {
    pub id: Uuid,
    pub language_code: LanguageCode,
    pub title: String,
    pub generated_at: DateTime<Utc>,
}

/// Read-only introspection of both cache tiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_cached: usize,
    pub session_cached: usize,
    pub languages: Vec<LanguageCode>,
    /// Most recent durable writes, oldest first.
    pub recent_passages: Vec<PassageSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_letter_codes_are_lowercased() {
        let code = LanguageCode::from_two_letter(" FR ").unwrap();
        assert_eq!(code.as_str(), "fr");
    }

    #[test]
    fn test_two_letter_rejects_other_shapes() {
        assert!(LanguageCode::from_two_letter("eng").is_none());
        assert!(LanguageCode::from_two_letter("e1").is_none());
        assert!(LanguageCode::from_two_letter("").is_none());
        assert!(LanguageCode::from_two_letter("中文").is_none());
    }

    #[test]
    fn test_parse_allows_three_letter_codes() {
        assert_eq!(LanguageCode::parse("Haw").unwrap().as_str(), "haw");
        assert!(LanguageCode::parse("engl").is_none());
    }

    #[test]
    fn test_passage_serializes_in_camel_case() {
        let passage = Passage::from_generated(
            GeneratedPassage {
                text: "Il était une fois.".to_string(),
                title: "Conte".to_string(),
                estimated_duration: 45,
            },
            LanguageCode::from_two_letter("fr").unwrap(),
        );
        let json = serde_json::to_value(&passage).unwrap();
        assert_eq!(json["languageCode"], "fr");
        assert_eq!(json["estimatedDuration"], 45);
        assert!(json.get("generatedAt").is_some());
    }

    #[test]
    fn test_generated_passage_requires_all_fields() {
        let bad_json = r#"{"text": "Hello", "title": "Hi"}"#;
        let result: Result<GeneratedPassage, _> = serde_json::from_str(bad_json);
        assert!(result.is_err());
    }
}
