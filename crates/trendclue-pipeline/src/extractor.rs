//! Keyword extraction: product text to typed keyword lists.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use trendclue_core::{KeywordType, Vocabulary};

use crate::breaker::{BreakerState, StrategyBreaker};
use crate::completion::{complete_within, extract_json_object, Completion, Prompt};
use crate::error::CompletionError;

const EXTRACT_SYSTEM_PROMPT: &str = "You are a cosmetics analyst. Extract keywords from the \
product description into exactly four categories: ingredients (active ingredients), formats \
(product form or texture), effects (skin benefits) and mood (visual, sensory or lifestyle \
elements). Return ONLY a JSON object: \
{\"ingredients\": [...], \"formats\": [...], \"effects\": [...], \"mood\": [...]}";

/// Typed keyword lists for one product, each ordered by confidence,
/// de-duplicated, and capped per [`KeywordType::per_product_cap`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedKeywords {
    pub ingredient: Vec<String>,
    pub format: Vec<String>,
    pub effect: Vec<String>,
    pub mood: Vec<String>,
}

impl ExtractedKeywords {
    #[must_use]
    pub fn get(&self, kind: KeywordType) -> &[String] {
        match kind {
            KeywordType::Ingredient => &self.ingredient,
            KeywordType::Format => &self.format,
            KeywordType::Effect => &self.effect,
            KeywordType::Mood => &self.mood,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        KeywordType::ALL.iter().all(|&k| self.get(k).is_empty())
    }

    /// Every keyword with its type, ingredients first, then formats,
    /// effects, moods.
    pub fn iter(&self) -> impl Iterator<Item = (KeywordType, &str)> + '_ {
        KeywordType::ALL
            .into_iter()
            .flat_map(move |kind| self.get(kind).iter().map(move |k| (kind, k.as_str())))
    }

    #[must_use]
    pub fn total(&self) -> usize {
        KeywordType::ALL.iter().map(|&k| self.get(k).len()).sum()
    }

    fn from_lists<S: AsRef<str>>(
        ingredient: &[S],
        format: &[S],
        effect: &[S],
        mood: &[S],
    ) -> Self {
        Self {
            ingredient: normalize(ingredient, KeywordType::Ingredient.per_product_cap()),
            format: normalize(format, KeywordType::Format.per_product_cap()),
            effect: normalize(effect, KeywordType::Effect.per_product_cap()),
            mood: normalize(mood, KeywordType::Mood.per_product_cap()),
        }
    }
}

/// Trim, lowercase, drop blanks, de-duplicate keeping first occurrence, cap.
fn normalize<S: AsRef<str>>(raw: &[S], cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .take(cap)
        .collect()
}

#[derive(Debug, Deserialize)]
struct LearnedKeywords {
    #[serde(default)]
    ingredients: Vec<String>,
    #[serde(default, alias = "formulas")]
    formats: Vec<String>,
    #[serde(default)]
    effects: Vec<String>,
    #[serde(default, alias = "moods")]
    mood: Vec<String>,
}

/// Match `"<name> <text>"` against the vocabulary priority lists.
#[must_use]
pub fn extract_deterministic(vocabulary: &Vocabulary, text: &str, name: &str) -> ExtractedKeywords {
    let haystack = format!("{name} {text}").to_lowercase();
    ExtractedKeywords::from_lists(
        &vocabulary.matches(KeywordType::Ingredient, &haystack),
        &vocabulary.matches(KeywordType::Format, &haystack),
        &vocabulary.matches(KeywordType::Effect, &haystack),
        &vocabulary.matches(KeywordType::Mood, &haystack),
    )
}

fn parse_learned(raw: &str) -> Result<ExtractedKeywords, CompletionError> {
    let value = extract_json_object(raw)?;
    let learned: LearnedKeywords = serde_json::from_value(value)
        .map_err(|e| CompletionError::Unparseable(format!("keyword object: {e}")))?;
    Ok(ExtractedKeywords::from_lists(
        &learned.ingredients,
        &learned.formats,
        &learned.effects,
        &learned.mood,
    ))
}

/// Learned extraction with a one-shot fallback to the vocabulary.
pub struct KeywordExtractor<'a, C> {
    completion: &'a C,
    vocabulary: &'a Vocabulary,
    breaker: StrategyBreaker,
    timeout: Duration,
}

impl<'a, C: Completion> KeywordExtractor<'a, C> {
    #[must_use]
    pub fn new(completion: &'a C, vocabulary: &'a Vocabulary, timeout: Duration) -> Self {
        Self {
            completion,
            vocabulary,
            breaker: StrategyBreaker::new("keyword_extraction"),
            timeout,
        }
    }

    #[must_use]
    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    /// Extract keywords from one product's description.
    ///
    /// Empty text yields empty lists without consulting the breaker. A
    /// failed learned call trips the breaker and the same product is
    /// re-extracted deterministically.
    pub async fn extract(&mut self, text: &str, name: &str) -> ExtractedKeywords {
        if text.trim().is_empty() {
            return ExtractedKeywords::default();
        }

        if self.breaker.allows_learned() {
            let user = format!("Product: {name}\nDescription: {text}");
            let prompt = Prompt {
                system: EXTRACT_SYSTEM_PROMPT,
                user: &user,
            };
            let outcome = complete_within(self.completion, &prompt, self.timeout)
                .await
                .and_then(|raw| parse_learned(&raw));

            match outcome {
                Ok(keywords) => {
                    self.breaker.record_success();
                    return keywords;
                }
                Err(e) => self.breaker.record_failure(&e),
            }
        }

        extract_deterministic(self.vocabulary, text, name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::completion::DisabledCompletion;

    fn vocab() -> Vocabulary {
        Vocabulary {
            version: 1,
            ingredient: vec!["hyaluronic acid".into(), "retinol".into(), "niacinamide".into()],
            format: vec!["serum".into(), "cream".into()],
            effect: vec!["hydrating".into(), "brightening".into(), "soothing".into()],
            mood: vec!["dewy".into(), "glass skin".into()],
        }
    }

    struct Canned {
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl Completion for Canned {
        async fn complete(&self, _prompt: &Prompt<'_>) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_owned())
        }
    }

    #[test]
    fn deterministic_matches_name_and_text_in_priority_order() {
        let kw = extract_deterministic(
            &vocab(),
            "A niacinamide serum with retinol for a dewy, brightening finish",
            "Glow Serum",
        );
        assert_eq!(kw.ingredient, vec!["retinol", "niacinamide"]);
        assert_eq!(kw.format, vec!["serum"]);
        assert_eq!(kw.effect, vec!["brightening"]);
        assert_eq!(kw.mood, vec!["dewy"]);
    }

    #[test]
    fn deterministic_is_case_insensitive() {
        let kw = extract_deterministic(&vocab(), "HYALURONIC ACID CREAM", "");
        assert_eq!(kw.ingredient, vec!["hyaluronic acid"]);
        assert_eq!(kw.format, vec!["cream"]);
    }

    #[test]
    fn normalize_dedupes_and_caps() {
        let raw = ["Retinol", " retinol ", "", "Peptides", "a", "b", "c", "d", "e", "f", "g"];
        let out = normalize(&raw, 8);
        assert_eq!(out.len(), 8);
        assert_eq!(out[0], "retinol");
        assert_eq!(out[1], "peptides");
    }

    #[test]
    fn iter_yields_types_in_fixed_order() {
        let kw = ExtractedKeywords {
            ingredient: vec!["retinol".into()],
            format: vec!["serum".into()],
            effect: vec![],
            mood: vec!["dewy".into()],
        };
        let items: Vec<_> = kw.iter().collect();
        assert_eq!(
            items,
            vec![
                (KeywordType::Ingredient, "retinol"),
                (KeywordType::Format, "serum"),
                (KeywordType::Mood, "dewy"),
            ]
        );
        assert_eq!(kw.total(), 3);
    }

    #[tokio::test]
    async fn empty_text_does_not_consult_breaker() {
        let vocab = vocab();
        let mut extractor = KeywordExtractor::new(&DisabledCompletion, &vocab, Duration::from_secs(1));
        let kw = extractor.extract("   ", "Retinol Serum").await;
        assert!(kw.is_empty());
        assert_eq!(extractor.breaker_state(), BreakerState::Untested);
    }

    #[tokio::test]
    async fn failing_completion_falls_back_for_same_record() {
        let vocab = vocab();
        let mut extractor = KeywordExtractor::new(&DisabledCompletion, &vocab, Duration::from_secs(1));
        let kw = extractor.extract("retinol serum", "").await;
        assert_eq!(kw.ingredient, vec!["retinol"]);
        assert_eq!(extractor.breaker_state(), BreakerState::FallbackOnly);
    }

    #[tokio::test]
    async fn learned_response_is_parsed_with_formulas_alias() {
        let vocab = vocab();
        let completion = Canned {
            reply: "```json\n{\"ingredients\": [\"Snail Mucin\"], \"formulas\": [\"essence\"], \
                    \"effects\": [\"repairing\"], \"mood\": []}\n```",
            calls: AtomicUsize::new(0),
        };
        let mut extractor = KeywordExtractor::new(&completion, &vocab, Duration::from_secs(1));
        let kw = extractor.extract("snail essence", "Repair Essence").await;
        assert_eq!(kw.ingredient, vec!["snail mucin"]);
        assert_eq!(kw.format, vec!["essence"]);
        assert_eq!(kw.effect, vec!["repairing"]);
        assert_eq!(extractor.breaker_state(), BreakerState::LearnedAvailable);
    }

    #[tokio::test]
    async fn unparseable_response_trips_and_stays_tripped() {
        let vocab = vocab();
        let completion = Canned {
            reply: "I cannot help with that.",
            calls: AtomicUsize::new(0),
        };
        let mut extractor = KeywordExtractor::new(&completion, &vocab, Duration::from_secs(1));
        let first = extractor.extract("retinol serum", "").await;
        let second = extractor.extract("niacinamide cream", "").await;

        assert_eq!(first.ingredient, vec!["retinol"]);
        assert_eq!(second.ingredient, vec!["niacinamide"]);
        assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
        assert_eq!(extractor.breaker_state(), BreakerState::FallbackOnly);
    }
}
