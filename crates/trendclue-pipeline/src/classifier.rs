//! Composite scoring and tier classification.

use trendclue_core::{Signals, Trend, TrendTier};

use crate::combination::Combination;
use crate::scoring::round_to;

/// 100 at rank 1, falling 1.5 points per rank, floored at 0.
#[must_use]
pub fn rank_score(avg_rank: f64) -> f64 {
    (100.0 - (avg_rank - 1.0) * 1.5).clamp(0.0, 100.0)
}

/// `0.3 * rank + 0.4 * mean(signals) + 0.3 * synergy * 100`, two decimals.
#[must_use]
pub fn composite_score(avg_rank: f64, signals: &Signals, synergy_score: f64) -> f64 {
    let score =
        0.3 * rank_score(avg_rank) + 0.4 * signals.average() + 0.3 * (synergy_score * 100.0);
    round_to(score, 2)
}

/// First match wins: Actionable, then Growing, else Early.
#[must_use]
pub fn classify(composite: f64, signals: &Signals) -> TrendTier {
    if composite >= 75.0 && signals.social >= 60.0 && signals.retail >= 60.0 {
        TrendTier::Actionable
    } else if composite >= 55.0 && (signals.social >= 50.0 || signals.retail >= 50.0) {
        TrendTier::Growing
    } else {
        TrendTier::Early
    }
}

#[must_use]
pub fn build_trend(combination: Combination, signals: Signals) -> Trend {
    let composite = composite_score(combination.avg_rank, &signals, combination.synergy_score);
    Trend {
        combination_key: combination.key,
        ingredients: combination.ingredients,
        formats: combination.formats,
        effects: combination.effects,
        product_ids: combination.product_ids,
        product_count: combination.product_count,
        avg_rank: combination.avg_rank,
        total_sales: combination.total_sales,
        synergy_score: combination.synergy_score,
        tier: classify(composite, &signals),
        signals,
        composite_score: composite,
    }
}

/// Composite descending, ties by combination key.
pub fn sort_trends(trends: &mut [Trend]) {
    trends.sort_by(|a, b| {
        b.composite_score
            .total_cmp(&a.composite_score)
            .then_with(|| a.combination_key.cmp(&b.combination_key))
    });
}
