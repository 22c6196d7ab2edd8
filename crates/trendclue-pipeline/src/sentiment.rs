//! Lexicon scorer for beauty-product reviews.
//!
//! Used only for reviews that arrive without a stored sentiment label.

use trendclue_core::Sentiment;

/// Keys are lowercase single words. Positive weights in `(0.0, 1.0]`,
/// negative in `[-1.0, 0.0)`.
pub(crate) const LEXICON: &[(&str, f32)] = &[
    // Positive signals
    ("love", 0.5),
    ("loved", 0.5),
    ("amazing", 0.5),
    ("great", 0.4),
    ("good", 0.3),
    ("excellent", 0.5),
    ("perfect", 0.5),
    ("best", 0.5),
    ("recommend", 0.4),
    ("favorite", 0.4),
    ("gentle", 0.3),
    ("glowing", 0.4),
    ("smooth", 0.3),
    ("soft", 0.3),
    ("hydrated", 0.3),
    ("works", 0.3),
    ("repurchase", 0.5),
    ("nice", 0.3),
    // Negative signals
    ("breakout", -0.6),
    ("breakouts", -0.6),
    ("irritation", -0.6),
    ("irritated", -0.6),
    ("burning", -0.6),
    ("burned", -0.6),
    ("rash", -0.7),
    ("itchy", -0.5),
    ("sticky", -0.3),
    ("greasy", -0.3),
    ("bad", -0.4),
    ("terrible", -0.6),
    ("worst", -0.6),
    ("waste", -0.5),
    ("disappointed", -0.5),
    ("disappointing", -0.5),
    ("returned", -0.4),
    ("useless", -0.5),
];

const POSITIVE_THRESHOLD: f32 = 0.1;
const NEGATIVE_THRESHOLD: f32 = -0.1;

/// Sum matching word weights, clamped to `[-1.0, 1.0]`. Unknown or empty
/// text scores `0.0`.
#[must_use]
pub fn lexicon_score(text: &str) -> f32 {
    let mut score = 0.0_f32;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        if let Some(&(_, weight)) = LEXICON.iter().find(|(lex_word, _)| *lex_word == w) {
            score += weight;
        }
    }
    score.clamp(-1.0, 1.0)
}

#[must_use]
pub fn classify_sentiment(text: &str) -> Sentiment {
    let score = lexicon_score(text);
    if score > POSITIVE_THRESHOLD {
        Sentiment::Positive
    } else if score < NEGATIVE_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}
