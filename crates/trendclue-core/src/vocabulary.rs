use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::trends::KeywordType;
use crate::ConfigError;

/// Vocabulary compiled into the binary, used when no file is configured.
const BUNDLED_VOCABULARY: &str = include_str!("../../../config/vocabulary.yaml");

/// Per-type keyword priority lists for the deterministic strategies.
///
/// List order is significant: a term earlier in a list outranks later terms
/// that match the same text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vocabulary {
    pub version: u32,
    pub ingredient: Vec<String>,
    pub format: Vec<String>,
    pub effect: Vec<String>,
    pub mood: Vec<String>,
}

impl Vocabulary {
    /// The vocabulary shipped in `config/vocabulary.yaml` at build time.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the bundled file fails to parse or validate.
    pub fn bundled() -> Result<Self, ConfigError> {
        parse_vocabulary(BUNDLED_VOCABULARY)
    }

    /// The priority list for one keyword type.
    #[must_use]
    pub fn terms(&self, kind: KeywordType) -> &[String] {
        match kind {
            KeywordType::Ingredient => &self.ingredient,
            KeywordType::Format => &self.format,
            KeywordType::Effect => &self.effect,
            KeywordType::Mood => &self.mood,
        }
    }

    /// Terms of `kind` contained in `lowercase_text`, in priority order.
    ///
    /// The caller lowercases the text once; matching is plain substring
    /// containment.
    #[must_use]
    pub fn matches<'a>(&'a self, kind: KeywordType, lowercase_text: &str) -> Vec<&'a str> {
        self.terms(kind)
            .iter()
            .map(String::as_str)
            .filter(|term| lowercase_text.contains(term))
            .collect()
    }
}

/// Load and validate the vocabulary from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_vocabulary(path: &Path) -> Result<Vocabulary, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::VocabularyFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_vocabulary(&content)
}

fn parse_vocabulary(content: &str) -> Result<Vocabulary, ConfigError> {
    let vocabulary: Vocabulary = serde_yaml::from_str(content)?;
    validate_vocabulary(&vocabulary)?;
    Ok(vocabulary)
}

fn validate_vocabulary(vocabulary: &Vocabulary) -> Result<(), ConfigError> {
    for kind in KeywordType::ALL {
        let terms = vocabulary.terms(kind);
        if terms.is_empty() {
            return Err(ConfigError::Validation(format!(
                "{kind} list must contain at least one term"
            )));
        }

        let mut seen = HashSet::new();
        for term in terms {
            if term.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{kind} list contains an empty term"
                )));
            }
            if term != &term.trim().to_lowercase() {
                return Err(ConfigError::Validation(format!(
                    "{kind} term '{term}' must be trimmed lowercase"
                )));
            }
            if !seen.insert(term.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate {kind} term: '{term}'"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_yaml(ingredient: &str) -> String {
        format!(
            "version: 2\n\
             ingredient: [{ingredient}]\n\
             format: [serum, cream]\n\
             effect: [hydrating, soothing]\n\
             mood: [dewy]\n"
        )
    }

    #[test]
    fn bundled_vocabulary_parses_and_validates() {
        let vocab = Vocabulary::bundled().expect("bundled vocabulary must be valid");
        assert_eq!(vocab.version, 1);
        assert_eq!(vocab.ingredient.first().map(String::as_str), Some("hyaluronic acid"));
        assert!(vocab.format.iter().any(|t| t == "serum"));
        assert!(vocab.effect.iter().any(|t| t == "hydrating"));
        assert!(vocab.mood.iter().any(|t| t == "glass skin"));
    }

    #[test]
    fn matches_preserve_priority_order() {
        let vocab = parse_vocabulary(&small_yaml("retinol, niacinamide")).unwrap();
        // Text mentions niacinamide first, but retinol has higher priority.
        let found = vocab.matches(KeywordType::Ingredient, "niacinamide and retinol serum");
        assert_eq!(found, vec!["retinol", "niacinamide"]);
    }

    #[test]
    fn matches_empty_text_yields_nothing() {
        let vocab = parse_vocabulary(&small_yaml("retinol")).unwrap();
        assert!(vocab.matches(KeywordType::Format, "").is_empty());
    }

    #[test]
    fn rejects_duplicate_terms() {
        let err = parse_vocabulary(&small_yaml("retinol, retinol")).unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(ref msg) if msg.contains("duplicate")),
            "got: {err:?}"
        );
    }

    #[test]
    fn rejects_uppercase_terms() {
        let err = parse_vocabulary(&small_yaml("Retinol")).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)), "got: {err:?}");
    }

    #[test]
    fn rejects_empty_list() {
        let err = parse_vocabulary(&small_yaml("")).unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(ref msg) if msg.contains("ingredient")),
            "got: {err:?}"
        );
    }

    #[test]
    fn rejects_unknown_sections() {
        let yaml = format!("{}colour: [red]\n", small_yaml("retinol"));
        let err = parse_vocabulary(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::VocabularyFileParse(_)), "got: {err:?}");
    }

    #[test]
    fn load_vocabulary_reports_missing_file() {
        let err = load_vocabulary(Path::new("/nonexistent/vocabulary.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::VocabularyFileIo { .. }), "got: {err:?}");
    }
}
