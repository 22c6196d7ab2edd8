//! Pipeline output types: keyword assignments, classified trends, and the
//! two leaderboards. These are the rows the persistence sink writes.

use serde::{Deserialize, Serialize};

/// The four keyword categories. No other value can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordType {
    Ingredient,
    Format,
    Effect,
    Mood,
}

impl KeywordType {
    pub const ALL: [KeywordType; 4] = [
        KeywordType::Ingredient,
        KeywordType::Format,
        KeywordType::Effect,
        KeywordType::Mood,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KeywordType::Ingredient => "ingredient",
            KeywordType::Format => "format",
            KeywordType::Effect => "effect",
            KeywordType::Mood => "mood",
        }
    }

    /// Maximum number of keywords of this type kept per product.
    #[must_use]
    pub fn per_product_cap(self) -> usize {
        match self {
            KeywordType::Ingredient => 8,
            KeywordType::Format | KeywordType::Mood => 4,
            KeywordType::Effect => 6,
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ingredient" => Some(KeywordType::Ingredient),
            "format" => Some(KeywordType::Format),
            "effect" => Some(KeywordType::Effect),
            "mood" => Some(KeywordType::Mood),
            _ => None,
        }
    }
}

impl std::fmt::Display for KeywordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market-maturity classification. Ordered so that `max` picks the best tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrendTier {
    Early,
    Growing,
    Actionable,
}

impl TrendTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrendTier::Early => "Early",
            TrendTier::Growing => "Growing",
            TrendTier::Actionable => "Actionable",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Early" => Some(TrendTier::Early),
            "Growing" => Some(TrendTier::Growing),
            "Actionable" => Some(TrendTier::Actionable),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrendTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed channel list the per-platform leaderboard is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Instagram,
    TikTok,
    YouTube,
    Amazon,
    Shopee,
    Cosme,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Instagram,
        Platform::TikTok,
        Platform::YouTube,
        Platform::Amazon,
        Platform::Shopee,
        Platform::Cosme,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
            Platform::YouTube => "YouTube",
            Platform::Amazon => "Amazon",
            Platform::Shopee => "Shopee",
            Platform::Cosme => "Cosme",
        }
    }

    /// Case-insensitive parse of a stored channel name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-channel signal strengths, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    pub social: f64,
    pub retail: f64,
    pub review: f64,
}

impl Signals {
    #[must_use]
    pub fn average(&self) -> f64 {
        (self.social + self.retail + self.review) / 3.0
    }
}

/// One extracted keyword on one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordAssignment {
    pub keyword: String,
    pub keyword_type: KeywordType,
    pub source_product_id: String,
    /// Effect keywords evidenced for this keyword in the product's reviews.
    pub effects: Vec<String>,
}

/// A classified ingredient + format + effect combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// `"<ingredient> + <format> + <effect>"`.
    pub combination_key: String,
    pub ingredients: Vec<String>,
    pub formats: Vec<String>,
    pub effects: Vec<String>,
    pub product_ids: Vec<String>,
    pub product_count: usize,
    pub avg_rank: f64,
    pub total_sales: i64,
    /// Commercial breadth in `[0, 1]`.
    pub synergy_score: f64,
    pub signals: Signals,
    pub composite_score: f64,
    pub tier: TrendTier,
}

impl Trend {
    /// Whether `keyword` appears in any of this trend's member sets.
    #[must_use]
    pub fn mentions_keyword(&self, keyword: &str) -> bool {
        self.ingredients
            .iter()
            .chain(&self.formats)
            .chain(&self.effects)
            .any(|k| k == keyword)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformLeaderboardEntry {
    pub platform: Platform,
    /// 1-based position within the platform's board.
    pub rank: usize,
    pub keyword: String,
    pub keyword_type: KeywordType,
    /// `min(100, mentions * 10)`.
    pub value: f64,
    pub growth_pct: f64,
    pub mention_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordLeaderboardEntry {
    /// 1-based position within the keyword type's board.
    pub rank: usize,
    pub keyword: String,
    pub keyword_type: KeywordType,
    pub score: f64,
    pub assignment_count: usize,
    pub product_count: usize,
    pub tier: TrendTier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_type_round_trips_through_str() {
        for kind in KeywordType::ALL {
            assert_eq!(KeywordType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(KeywordType::parse("formula"), None);
    }

    #[test]
    fn keyword_type_serializes_lowercase() {
        let json = serde_json::to_string(&KeywordType::Ingredient).unwrap();
        assert_eq!(json, "\"ingredient\"");
    }

    #[test]
    fn per_product_caps_match_taxonomy() {
        assert_eq!(KeywordType::Ingredient.per_product_cap(), 8);
        assert_eq!(KeywordType::Format.per_product_cap(), 4);
        assert_eq!(KeywordType::Effect.per_product_cap(), 6);
        assert_eq!(KeywordType::Mood.per_product_cap(), 4);
    }

    #[test]
    fn tier_ordering_puts_actionable_on_top() {
        let best = [TrendTier::Growing, TrendTier::Actionable, TrendTier::Early]
            .into_iter()
            .max();
        assert_eq!(best, Some(TrendTier::Actionable));
        assert!(TrendTier::Early < TrendTier::Growing);
    }

    #[test]
    fn platform_parse_ignores_case() {
        assert_eq!(Platform::parse("tiktok"), Some(Platform::TikTok));
        assert_eq!(Platform::parse("YOUTUBE"), Some(Platform::YouTube));
        assert_eq!(Platform::parse("Weibo"), None);
    }

    #[test]
    fn signals_average() {
        let s = Signals {
            social: 50.0,
            retail: 70.0,
            review: 90.0,
        };
        assert!((s.average() - 70.0).abs() < f64::EPSILON);
    }
}
