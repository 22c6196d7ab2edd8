//! Effect mapping: which effects a product's reviews evidence per keyword.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use trendclue_core::{KeywordType, ReviewRecord, Vocabulary};

use crate::breaker::{BreakerState, StrategyBreaker};
use crate::completion::{complete_within, extract_json_object, Completion, Prompt};
use crate::error::CompletionError;
use crate::extractor::ExtractedKeywords;

/// Reviews considered per product, most recent first.
pub const REVIEWS_PER_PRODUCT: usize = 10;
/// Keywords sent to the learned strategy per product.
const LEARNED_KEYWORD_LIMIT: usize = 15;
/// Characters of review excerpt sent to the learned strategy.
const EXCERPT_CHAR_LIMIT: usize = 2000;
/// Effects attached per keyword by the deterministic strategy.
const DETERMINISTIC_EFFECT_LIMIT: usize = 3;

const EFFECT_SYSTEM_PROMPT: &str = "You are a cosmetics effects analyst. Based on the product \
keywords and customer reviews, map each keyword to the effects the reviews clearly evidence. \
Return ONLY a JSON object mapping keywords to arrays of effects: \
{\"keyword1\": [\"effect1\"], \"keyword2\": [\"effect2\"]}";

/// Keyword to evidenced effects, for one product.
pub type EffectMap = BTreeMap<String, Vec<String>>;

/// `[Rating: r] content` lines of the given reviews, truncated.
fn review_excerpt(reviews: &[&ReviewRecord]) -> String {
    let joined = reviews
        .iter()
        .map(|r| format!("[Rating: {}] {}", r.rating, r.content))
        .collect::<Vec<_>>()
        .join("\n");
    joined.chars().take(EXCERPT_CHAR_LIMIT).collect()
}

/// Attach the top vocabulary effects found in the excerpt to every keyword.
#[must_use]
pub fn map_deterministic(
    vocabulary: &Vocabulary,
    keywords: &ExtractedKeywords,
    excerpt: &str,
) -> EffectMap {
    let lowered = excerpt.to_lowercase();
    let effects: Vec<String> = vocabulary
        .matches(KeywordType::Effect, &lowered)
        .into_iter()
        .take(DETERMINISTIC_EFFECT_LIMIT)
        .map(str::to_owned)
        .collect();

    if effects.is_empty() {
        return EffectMap::new();
    }

    keywords
        .iter()
        .map(|(_, keyword)| (keyword.to_owned(), effects.clone()))
        .collect()
}

fn parse_learned(raw: &str, keywords: &ExtractedKeywords) -> Result<EffectMap, CompletionError> {
    let value = extract_json_object(raw)?;
    let serde_json::Value::Object(entries) = value else {
        return Err(CompletionError::Unparseable("effect map is not an object".into()));
    };

    let known: HashSet<&str> = keywords.iter().map(|(_, k)| k).collect();
    let cap = KeywordType::Effect.per_product_cap();
    let mut map = EffectMap::new();

    for (keyword, effects) in entries {
        let keyword = keyword.trim().to_lowercase();
        if !known.contains(keyword.as_str()) {
            continue;
        }
        let serde_json::Value::Array(items) = effects else {
            continue;
        };

        let mut seen = HashSet::new();
        let effects: Vec<String> = items
            .iter()
            .filter_map(serde_json::Value::as_str)
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty() && seen.insert(e.clone()))
            .take(cap)
            .collect();
        if !effects.is_empty() {
            map.insert(keyword, effects);
        }
    }

    Ok(map)
}

/// Learned effect mapping with its own one-shot fallback breaker.
pub struct EffectMapper<'a, C> {
    completion: &'a C,
    vocabulary: &'a Vocabulary,
    breaker: StrategyBreaker,
    timeout: Duration,
}

impl<'a, C: Completion> EffectMapper<'a, C> {
    #[must_use]
    pub fn new(completion: &'a C, vocabulary: &'a Vocabulary, timeout: Duration) -> Self {
        Self {
            completion,
            vocabulary,
            breaker: StrategyBreaker::new("effect_mapping"),
            timeout,
        }
    }

    #[must_use]
    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    /// Map one product's keywords to the effects its recent reviews evidence.
    ///
    /// Only the [`REVIEWS_PER_PRODUCT`] most recent reviews are read. No
    /// keywords or no reviews yields an empty map.
    pub async fn map(&mut self, keywords: &ExtractedKeywords, reviews: &[&ReviewRecord]) -> EffectMap {
        if keywords.is_empty() || reviews.is_empty() {
            return EffectMap::new();
        }

        let mut recent = reviews.to_vec();
        recent.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        recent.truncate(REVIEWS_PER_PRODUCT);
        let excerpt = review_excerpt(&recent);

        if self.breaker.allows_learned() {
            let keyword_list = keywords
                .iter()
                .take(LEARNED_KEYWORD_LIMIT)
                .map(|(_, k)| k)
                .collect::<Vec<_>>()
                .join(", ");
            let user = format!("Keywords: {keyword_list}\n\nCustomer Reviews:\n{excerpt}");
            let prompt = Prompt {
                system: EFFECT_SYSTEM_PROMPT,
                user: &user,
            };
            let outcome = complete_within(self.completion, &prompt, self.timeout)
                .await
                .and_then(|raw| parse_learned(&raw, keywords));

            match outcome {
                Ok(map) => {
                    self.breaker.record_success();
                    return map;
                }
                Err(e) => self.breaker.record_failure(&e),
            }
        }

        map_deterministic(self.vocabulary, keywords, &excerpt)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::completion::DisabledCompletion;

    fn vocab() -> Vocabulary {
        Vocabulary {
            version: 1,
            ingredient: vec!["retinol".into()],
            format: vec!["serum".into()],
            effect: vec![
                "hydrating".into(),
                "soothing".into(),
                "brightening".into(),
                "firming".into(),
            ],
            mood: vec!["dewy".into()],
        }
    }

    fn keywords() -> ExtractedKeywords {
        ExtractedKeywords {
            ingredient: vec!["retinol".into()],
            format: vec!["serum".into()],
            effect: vec![],
            mood: vec![],
        }
    }

    fn review(day: u32, rating: i16, content: &str) -> ReviewRecord {
        ReviewRecord {
            product_id: "p1".into(),
            content: content.into(),
            rating,
            sentiment: None,
            posted_at: Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
        }
    }

    struct Canned(&'static str);

    impl Completion for Canned {
        async fn complete(&self, _prompt: &Prompt<'_>) -> Result<String, CompletionError> {
            Ok(self.0.to_owned())
        }
    }

    #[test]
    fn excerpt_is_rating_prefixed_and_truncated() {
        let long = "x".repeat(3000);
        let reviews = [review(1, 5, "so soothing"), review(2, 4, &long)];
        let refs: Vec<&ReviewRecord> = reviews.iter().collect();
        let excerpt = review_excerpt(&refs);
        assert!(excerpt.starts_with("[Rating: 5] so soothing\n[Rating: 4] x"));
        assert_eq!(excerpt.chars().count(), EXCERPT_CHAR_LIMIT);
    }

    #[test]
    fn deterministic_attaches_top_three_effects_to_every_keyword() {
        let map = map_deterministic(
            &vocab(),
            &keywords(),
            "Firming and soothing, very hydrating. Also brightening!",
        );
        let expected = vec!["hydrating".to_owned(), "soothing".into(), "brightening".into()];
        assert_eq!(map.get("retinol"), Some(&expected));
        assert_eq!(map.get("serum"), Some(&expected));
    }

    #[test]
    fn deterministic_without_matches_is_empty() {
        let map = map_deterministic(&vocab(), &keywords(), "arrived quickly");
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn no_reviews_yields_empty_map_without_tripping() {
        let vocab = vocab();
        let mut mapper = EffectMapper::new(&DisabledCompletion, &vocab, Duration::from_secs(1));
        let map = mapper.map(&keywords(), &[]).await;
        assert!(map.is_empty());
        assert_eq!(mapper.breaker_state(), BreakerState::Untested);
    }

    #[tokio::test]
    async fn failure_falls_back_to_vocabulary() {
        let vocab = vocab();
        let reviews = [review(1, 5, "So hydrating")];
        let refs: Vec<&ReviewRecord> = reviews.iter().collect();
        let mut mapper = EffectMapper::new(&DisabledCompletion, &vocab, Duration::from_secs(1));
        let map = mapper.map(&keywords(), &refs).await;
        assert_eq!(map.get("retinol"), Some(&vec!["hydrating".to_owned()]));
        assert_eq!(mapper.breaker_state(), BreakerState::FallbackOnly);
    }

    #[tokio::test]
    async fn only_the_ten_most_recent_reviews_are_read() {
        let vocab = vocab();
        // Oldest first; the only effect mention is in the oldest review.
        let reviews: Vec<ReviewRecord> = (1..=11)
            .map(|d| {
                let content = if d == 1 { "So hydrating" } else { "arrived quickly" };
                review(d, 5, content)
            })
            .collect();
        let refs: Vec<&ReviewRecord> = reviews.iter().collect();
        let mut mapper = EffectMapper::new(&DisabledCompletion, &vocab, Duration::from_secs(1));
        assert!(mapper.map(&keywords(), &refs).await.is_empty());

        let newest = review(12, 4, "very soothing");
        let mut with_newest: Vec<&ReviewRecord> = refs[1..].to_vec();
        with_newest.push(&newest);
        let map = mapper.map(&keywords(), &with_newest).await;
        assert_eq!(map.get("retinol"), Some(&vec!["soothing".to_owned()]));
    }

    #[tokio::test]
    async fn learned_map_keeps_only_product_keywords() {
        let vocab = vocab();
        let reviews = [review(1, 5, "calming")];
        let refs: Vec<&ReviewRecord> = reviews.iter().collect();
        let completion = Canned(r#"{"Retinol": ["Calming", "calming"], "vitamin c": ["glow"], "serum": "oops"}"#);
        let mut mapper = EffectMapper::new(&completion, &vocab, Duration::from_secs(1));
        let map = mapper.map(&keywords(), &refs).await;
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("retinol"), Some(&vec!["calming".to_owned()]));
        assert_eq!(mapper.breaker_state(), BreakerState::LearnedAvailable);
    }
}
