//! Trend pipeline orchestration.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use trendclue_core::{
    KeywordAssignment, ProductRecord, ReviewRecord, Scope, Vocabulary, MAX_WEEKS,
};

use crate::classifier::{build_trend, sort_trends};
use crate::combination::build_combinations;
use crate::completion::Completion;
use crate::effects::EffectMapper;
use crate::error::{PipelineError, RecordError, StoreError};
use crate::extractor::{ExtractedKeywords, KeywordExtractor};
use crate::leaderboard::{build_keyword_leaderboard, build_platform_leaderboards};
use crate::sentiment::classify_sentiment;
use crate::signals::{RankPoint, SignalCalculator};
use crate::store::TrendStore;
use crate::types::{PersistSummary, PipelineOutput, PipelineSettings};
use crate::window::TimeWindow;

/// Explicit dependencies of a run. Nothing in the pipeline reaches for a
/// global connection or client.
pub struct PipelineContext<'a, S, C> {
    pub store: &'a S,
    pub completion: &'a C,
    pub vocabulary: &'a Vocabulary,
    pub settings: PipelineSettings,
}

fn validate_retail(record: &ProductRecord) -> Result<i32, RecordError> {
    if record.product_id.trim().is_empty() {
        return Err(RecordError::MissingProductId);
    }
    match record.sales_rank {
        Some(rank) if rank > 0 => Ok(rank),
        _ => Err(RecordError::InvalidRank {
            product_id: record.product_id.clone(),
        }),
    }
}

fn validate_review(review: &ReviewRecord) -> Result<(), RecordError> {
    if (1..=5).contains(&review.rating) {
        Ok(())
    } else {
        Err(RecordError::InvalidRating {
            product_id: review.product_id.clone(),
            rating: review.rating,
        })
    }
}

/// Split retail observations into per-product rank history and the latest
/// observation per product. Malformed rows are skipped.
fn index_retail(
    records: Vec<ProductRecord>,
    skipped: &mut usize,
) -> (
    BTreeMap<String, ProductRecord>,
    HashMap<String, Vec<RankPoint>>,
) {
    let mut latest: BTreeMap<String, ProductRecord> = BTreeMap::new();
    let mut history: HashMap<String, Vec<RankPoint>> = HashMap::new();

    for record in records {
        let rank = match validate_retail(&record) {
            Ok(rank) => rank,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed retail record");
                *skipped += 1;
                continue;
            }
        };

        history
            .entry(record.product_id.clone())
            .or_default()
            .push(RankPoint {
                observed_at: record.observed_at,
                rank,
            });

        match latest.get(&record.product_id) {
            Some(current) if current.observed_at >= record.observed_at => {}
            _ => {
                latest.insert(record.product_id.clone(), record);
            }
        }
    }

    (latest, history)
}

/// Group reviews per product, most recent first, with sentiment resolved.
fn index_reviews(
    reviews: Vec<ReviewRecord>,
    skipped: &mut usize,
) -> HashMap<String, Vec<ReviewRecord>> {
    let mut by_product: HashMap<String, Vec<ReviewRecord>> = HashMap::new();

    for mut review in reviews {
        if let Err(e) = validate_review(&review) {
            tracing::warn!(error = %e, "skipping malformed review");
            *skipped += 1;
            continue;
        }
        if review.sentiment.is_none() {
            review.sentiment = Some(classify_sentiment(&review.content));
        }
        by_product
            .entry(review.product_id.clone())
            .or_default()
            .push(review);
    }

    for list in by_product.values_mut() {
        list.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
    }

    by_product
}

/// Compute trends and leaderboards for one scope. Nothing is written.
///
/// 1. Resolve the time window from the scope's retail span.
/// 2. Read retail records; skip malformed rows; keep the latest observation
///    per product and the full rank history.
/// 3. Read reviews for those products and social posts for the country.
/// 4. Extract keywords per product (learned, falling back to vocabulary).
/// 5. Map keywords to review-evidenced effects per product.
/// 6. Build combinations, compute signals, classify trends.
/// 7. Build the platform and keyword leaderboards.
///
/// # Errors
///
/// - [`PipelineError::InvalidWindow`] if `weeks` is zero or above
///   [`MAX_WEEKS`].
/// - [`PipelineError::Store`] if a source read fails.
/// - [`PipelineError::DataAbsent`] if the scope has no usable products.
///
/// Learned-strategy failures are not errors; they switch the stage to its
/// deterministic strategy for the rest of the run.
pub async fn run_trend_pipeline<S: TrendStore, C: Completion>(
    ctx: &PipelineContext<'_, S, C>,
    scope: &Scope,
    weeks: u32,
) -> Result<PipelineOutput, PipelineError> {
    if weeks == 0 || weeks > MAX_WEEKS {
        return Err(PipelineError::InvalidWindow);
    }

    // Step 1: Window.
    let span = ctx
        .store
        .retail_span(scope)
        .await
        .map_err(PipelineError::Store)?;
    let window = TimeWindow::resolve(span, weeks, Utc::now())?;
    tracing::info!(
        scope = %scope,
        start = %window.start,
        end = %window.end,
        weeks,
        "window resolved"
    );

    // Step 2: Retail records.
    let records = ctx
        .store
        .retail_records(scope, window.start, window.end)
        .await
        .map_err(PipelineError::Store)?;
    let mut skipped = 0_usize;
    let (latest, rank_history) = index_retail(records, &mut skipped);
    if latest.is_empty() {
        return Err(PipelineError::DataAbsent(scope.clone()));
    }

    // Step 3: Reviews and posts.
    let product_ids: Vec<String> = latest.keys().cloned().collect();
    let reviews = ctx
        .store
        .reviews_for_products(&product_ids)
        .await
        .map_err(PipelineError::Store)?;
    let reviews = index_reviews(reviews, &mut skipped);
    let posts = ctx
        .store
        .social_posts(&scope.country, window.start, window.end)
        .await
        .map_err(PipelineError::Store)?;

    // Step 4: Keyword extraction.
    let timeout = ctx.settings.completion_timeout;
    let mut extractor = KeywordExtractor::new(ctx.completion, ctx.vocabulary, timeout);
    let mut extracted: Vec<(&ProductRecord, ExtractedKeywords)> = Vec::with_capacity(latest.len());
    for product in latest.values() {
        let keywords = extractor
            .extract(&product.description, &product.product_name)
            .await;
        tracing::debug!(
            product_id = %product.product_id,
            keywords = keywords.total(),
            "keywords extracted"
        );
        extracted.push((product, keywords));
    }

    // Step 5: Effect mapping.
    let mut mapper = EffectMapper::new(ctx.completion, ctx.vocabulary, timeout);
    let mut assignments: Vec<KeywordAssignment> = Vec::new();
    for (product, keywords) in &extracted {
        let product_reviews: Vec<&ReviewRecord> = reviews
            .get(&product.product_id)
            .map(|list| list.iter().collect())
            .unwrap_or_default();
        let effect_map = mapper.map(keywords, &product_reviews).await;

        assignments.extend(keywords.iter().map(|(keyword_type, keyword)| KeywordAssignment {
            keyword: keyword.to_owned(),
            keyword_type,
            source_product_id: product.product_id.clone(),
            effects: effect_map.get(keyword).cloned().unwrap_or_default(),
        }));
    }

    // Step 6: Combinations, signals, classification.
    let pairs: Vec<(&ProductRecord, &ExtractedKeywords)> =
        extracted.iter().map(|(p, k)| (*p, k)).collect();
    let combinations = build_combinations(&pairs);
    let calculator = SignalCalculator {
        window: &window,
        posts: &posts,
        rank_history: &rank_history,
        reviews: &reviews,
    };
    let mut trends: Vec<_> = combinations
        .into_iter()
        .filter(|c| c.product_count > 0)
        .map(|c| {
            let signals = calculator.compute(&c);
            build_trend(c, signals)
        })
        .collect();
    sort_trends(&mut trends);

    // Step 7: Leaderboards.
    let platform_leaderboard = build_platform_leaderboards(&window, &posts, &assignments);
    let keyword_leaderboard = build_keyword_leaderboard(&assignments, &trends);

    tracing::info!(
        scope = %scope,
        products = latest.len(),
        skipped,
        assignments = assignments.len(),
        trends = trends.len(),
        platform_entries = platform_leaderboard.len(),
        keyword_entries = keyword_leaderboard.len(),
        "trend pipeline computed"
    );

    Ok(PipelineOutput {
        scope: scope.clone(),
        product_count: latest.len(),
        skipped_records: skipped,
        assignments,
        trends,
        platform_leaderboard,
        keyword_leaderboard,
        extraction_strategy: extractor.breaker_state(),
        effect_strategy: mapper.breaker_state(),
        window,
    })
}

/// Full-replace every output collection for the output's scope, in order:
/// keyword assignments, trends, platform leaderboard, keyword leaderboard.
///
/// # Errors
///
/// Returns [`PipelineError::Persistence`] naming the first collection whose
/// write failed. Collections written before it are not rolled back.
pub async fn persist_outputs<S: TrendStore>(
    store: &S,
    output: &PipelineOutput,
) -> Result<PersistSummary, PipelineError> {
    let scope = &output.scope;
    let persistence = |collection: &'static str| {
        move |source: StoreError| PipelineError::Persistence { collection, source }
    };

    let assignments = store
        .replace_keyword_assignments(scope, &output.assignments)
        .await
        .map_err(persistence("keyword_assignments"))?;

    let trends: Vec<_> = output
        .trends
        .iter()
        .filter(|t| t.product_count >= 1)
        .cloned()
        .collect();
    let trends = store
        .replace_trends(scope, &trends)
        .await
        .map_err(persistence("trends"))?;

    let platform_entries = store
        .replace_platform_leaderboard(scope, &output.platform_leaderboard)
        .await
        .map_err(persistence("platform_leaderboard"))?;

    let keyword_entries = store
        .replace_keyword_leaderboard(scope, &output.keyword_leaderboard)
        .await
        .map_err(persistence("keyword_leaderboard"))?;

    let summary = PersistSummary {
        assignments,
        trends,
        platform_entries,
        keyword_entries,
    };
    tracing::info!(scope = %scope, ?summary, "trend outputs persisted");
    Ok(summary)
}

/// [`run_trend_pipeline`] followed by [`persist_outputs`].
///
/// # Errors
///
/// Any error of either step. Nothing is written when computation fails.
pub async fn run_and_persist<S: TrendStore, C: Completion>(
    ctx: &PipelineContext<'_, S, C>,
    scope: &Scope,
    weeks: u32,
) -> Result<(PipelineOutput, PersistSummary), PipelineError> {
    let output = run_trend_pipeline(ctx, scope, weeks).await?;
    let summary = persist_outputs(ctx.store, &output).await?;
    Ok((output, summary))
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
