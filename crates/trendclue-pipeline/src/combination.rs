//! Combination building: group products by their dominant
//! ingredient + format + effect triple.

use std::collections::HashMap;

use trendclue_core::ProductRecord;

use crate::extractor::ExtractedKeywords;
use crate::scoring::round_to;

const MAX_INGREDIENTS: usize = 5;
const MAX_FORMATS: usize = 3;
const MAX_EFFECTS: usize = 5;

/// Rank assumed for a combination whose members carry no rank.
const DEFAULT_AVG_RANK: f64 = 500.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub key: String,
    pub ingredients: Vec<String>,
    pub formats: Vec<String>,
    pub effects: Vec<String>,
    pub product_ids: Vec<String>,
    pub product_count: usize,
    /// Mean member rank, one decimal.
    pub avg_rank: f64,
    pub total_sales: i64,
    /// In `[0, 1]`, three decimals.
    pub synergy_score: f64,
}

#[must_use]
pub fn combination_key(ingredient: &str, format: &str, effect: &str) -> String {
    format!("{ingredient} + {format} + {effect}")
}

/// `0.5 * rank + 0.3 * volume + 0.2 * diversity`, clamped to `[0, 1]`.
#[must_use]
pub fn synergy_score(avg_rank: f64, total_sales: i64, product_count: usize) -> f64 {
    let rank_score = (1.0 - (avg_rank - 1.0) / 100.0).max(0.0);
    #[allow(clippy::cast_precision_loss)]
    let volume_score = (total_sales as f64 / 50_000.0).min(1.0);
    #[allow(clippy::cast_precision_loss)]
    let diversity_score = (product_count as f64 / 5.0).min(1.0);
    (0.5 * rank_score + 0.3 * volume_score + 0.2 * diversity_score).clamp(0.0, 1.0)
}

#[derive(Default)]
struct Accumulator {
    ingredients: Vec<String>,
    formats: Vec<String>,
    effects: Vec<String>,
    product_ids: Vec<String>,
    ranks: Vec<i32>,
    total_sales: i64,
}

fn extend_capped(target: &mut Vec<String>, source: &[String], cap: usize) {
    for item in source {
        if target.len() >= cap {
            break;
        }
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

/// Build combinations from products and their extracted keywords.
///
/// Products missing an ingredient, format, or effect are skipped. The result
/// is ordered by synergy descending, ties by key ascending.
#[must_use]
pub fn build_combinations(products: &[(&ProductRecord, &ExtractedKeywords)]) -> Vec<Combination> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Accumulator> = HashMap::new();

    for (product, keywords) in products {
        let (Some(ingredient), Some(format), Some(effect)) = (
            keywords.ingredient.first(),
            keywords.format.first(),
            keywords.effect.first(),
        ) else {
            continue;
        };

        let key = combination_key(ingredient, format, effect);
        let acc = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Accumulator::default()
        });

        extend_capped(&mut acc.ingredients, &keywords.ingredient, MAX_INGREDIENTS);
        extend_capped(&mut acc.formats, &keywords.format, MAX_FORMATS);
        extend_capped(&mut acc.effects, &keywords.effect, MAX_EFFECTS);
        if !acc.product_ids.contains(&product.product_id) {
            acc.product_ids.push(product.product_id.clone());
            acc.ranks.extend(product.sales_rank);
            acc.total_sales += product.sales_volume.unwrap_or(0);
        }
    }

    let mut combinations: Vec<Combination> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key).map(|acc| (key, acc)))
        .map(|(key, acc)| {
            let avg_rank = if acc.ranks.is_empty() {
                DEFAULT_AVG_RANK
            } else {
                let sum: f64 = acc.ranks.iter().map(|&r| f64::from(r)).sum();
                #[allow(clippy::cast_precision_loss)]
                let n = acc.ranks.len() as f64;
                sum / n
            };
            let product_count = acc.product_ids.len();
            Combination {
                key,
                ingredients: acc.ingredients,
                formats: acc.formats,
                effects: acc.effects,
                synergy_score: round_to(synergy_score(avg_rank, acc.total_sales, product_count), 3),
                avg_rank: round_to(avg_rank, 1),
                total_sales: acc.total_sales,
                product_ids: acc.product_ids,
                product_count,
            }
        })
        .collect();

    combinations.sort_by(|a, b| {
        b.synergy_score
            .total_cmp(&a.synergy_score)
            .then_with(|| a.key.cmp(&b.key))
    });
    combinations
}
