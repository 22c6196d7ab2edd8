//! Source records read by the pipeline. All of them are read-only inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The (country, category) pair every run and every output row is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub country: String,
    pub category: String,
}

impl Scope {
    #[must_use]
    pub fn new(country: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            category: category.into(),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.country, self.category)
    }
}

/// One retail observation of a product: its rank and volume at `observed_at`.
///
/// A product usually has several observations across the window; together
/// they form its rank history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub product_name: String,
    /// Free-text product description. May be empty.
    pub description: String,
    pub brand: String,
    /// Retail rank, 1 = best seller. `None` when the source row had no usable rank.
    pub sales_rank: Option<i32>,
    pub sales_volume: Option<i64>,
    pub country: String,
    pub category: String,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Parse a stored sentiment label. Unknown labels yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub product_id: String,
    pub content: String,
    /// Star rating, expected in `1..=5`.
    pub rating: i16,
    /// Stored sentiment label; `None` when the review was never classified.
    pub sentiment: Option<Sentiment>,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    /// Channel name as stored, e.g. `"Instagram"`.
    pub platform: String,
    pub content: String,
    pub hashtags: Vec<String>,
    pub posted_at: DateTime<Utc>,
    pub country: String,
}
