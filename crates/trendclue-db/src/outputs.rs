//! Database operations for the pipeline's output collections.
//!
//! Every `replace_*` function deletes the scope's rows and inserts the new
//! ones inside one transaction, so readers see either the previous run's
//! rows or the new run's rows for that collection, never a mix. Collections
//! are independent: a failure in one leaves the others as they were.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use trendclue_core::{
    KeywordAssignment, KeywordLeaderboardEntry, PlatformLeaderboardEntry, Scope, Trend,
};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `keyword_assignments` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeywordAssignmentRow {
    pub id: i64,
    pub country: String,
    pub category: String,
    pub position: i32,
    pub keyword: String,
    pub keyword_type: String,
    pub source_product_id: String,
    pub effects: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `trends` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendRow {
    pub id: i64,
    pub country: String,
    pub category: String,
    pub position: i32,
    pub combination_key: String,
    pub ingredients: Vec<String>,
    pub formats: Vec<String>,
    pub effects: Vec<String>,
    pub product_ids: Vec<String>,
    pub product_count: i32,
    /// `NUMERIC(12,1)`.
    pub avg_rank: Decimal,
    pub total_sales: i64,
    /// `NUMERIC(4,3)`.
    pub synergy_score: Decimal,
    pub social_signal: Decimal,
    pub retail_signal: Decimal,
    pub review_signal: Decimal,
    /// `NUMERIC(6,2)`.
    pub composite_score: Decimal,
    pub tier: String,
    pub created_at: DateTime<Utc>,
}

/// A row from the `platform_leaderboard` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlatformLeaderboardRow {
    pub id: i64,
    pub country: String,
    pub category: String,
    pub platform: String,
    pub rank: i32,
    pub keyword: String,
    pub keyword_type: String,
    pub value: Decimal,
    pub growth_pct: Decimal,
    pub mention_count: i32,
    pub created_at: DateTime<Utc>,
}

/// A row from the `keyword_leaderboard` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeywordLeaderboardRow {
    pub id: i64,
    pub country: String,
    pub category: String,
    pub rank: i32,
    pub keyword: String,
    pub keyword_type: String,
    pub score: Decimal,
    pub assignment_count: i32,
    pub product_count: i32,
    pub tier: String,
    pub created_at: DateTime<Utc>,
}

fn to_decimal(field: &'static str, value: f64, dp: u32) -> Result<Decimal, DbError> {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(dp))
        .ok_or(DbError::NonFiniteScore { field })
}

fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

// ---------------------------------------------------------------------------
// Full-replace writes
// ---------------------------------------------------------------------------

/// Replaces the scope's keyword assignments. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete, any insert, or the commit fails.
pub async fn replace_keyword_assignments(
    pool: &PgPool,
    scope: &Scope,
    rows: &[KeywordAssignment],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM keyword_assignments WHERE country = $1 AND category = $2")
        .bind(&scope.country)
        .bind(&scope.category)
        .execute(&mut *tx)
        .await?;

    for (position, row) in rows.iter().enumerate() {
        sqlx::query(
            "INSERT INTO keyword_assignments \
                 (country, category, position, keyword, keyword_type, source_product_id, effects) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&scope.country)
        .bind(&scope.category)
        .bind(to_i32(position))
        .bind(&row.keyword)
        .bind(row.keyword_type.as_str())
        .bind(&row.source_product_id)
        .bind(row.effects.as_slice())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

/// Replaces the scope's trends. Trends with no member products are skipped
/// and not counted.
///
/// # Errors
///
/// Returns [`DbError::NonFiniteScore`] if a score cannot be stored (the
/// transaction is rolled back), or [`DbError::Sqlx`] if any statement fails.
pub async fn replace_trends(pool: &PgPool, scope: &Scope, rows: &[Trend]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM trends WHERE country = $1 AND category = $2")
        .bind(&scope.country)
        .bind(&scope.category)
        .execute(&mut *tx)
        .await?;

    let mut written = 0_usize;
    for trend in rows.iter().filter(|t| t.product_count >= 1) {
        sqlx::query(
            "INSERT INTO trends \
                 (country, category, position, combination_key, \
                  ingredients, formats, effects, product_ids, product_count, \
                  avg_rank, total_sales, synergy_score, \
                  social_signal, retail_signal, review_signal, composite_score, tier) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(&scope.country)
        .bind(&scope.category)
        .bind(to_i32(written))
        .bind(&trend.combination_key)
        .bind(trend.ingredients.as_slice())
        .bind(trend.formats.as_slice())
        .bind(trend.effects.as_slice())
        .bind(trend.product_ids.as_slice())
        .bind(to_i32(trend.product_count))
        .bind(to_decimal("avg_rank", trend.avg_rank, 1)?)
        .bind(trend.total_sales)
        .bind(to_decimal("synergy_score", trend.synergy_score, 3)?)
        .bind(to_decimal("social_signal", trend.signals.social, 1)?)
        .bind(to_decimal("retail_signal", trend.signals.retail, 1)?)
        .bind(to_decimal("review_signal", trend.signals.review, 1)?)
        .bind(to_decimal("composite_score", trend.composite_score, 2)?)
        .bind(trend.tier.as_str())
        .execute(&mut *tx)
        .await?;
        written += 1;
    }

    tx.commit().await?;
    Ok(written)
}

/// Replaces the scope's per-platform leaderboard.
///
/// # Errors
///
/// Returns [`DbError::NonFiniteScore`] or [`DbError::Sqlx`]; the scope's
/// previous rows survive either way.
pub async fn replace_platform_leaderboard(
    pool: &PgPool,
    scope: &Scope,
    rows: &[PlatformLeaderboardEntry],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM platform_leaderboard WHERE country = $1 AND category = $2")
        .bind(&scope.country)
        .bind(&scope.category)
        .execute(&mut *tx)
        .await?;

    for row in rows {
        sqlx::query(
            "INSERT INTO platform_leaderboard \
                 (country, category, platform, rank, keyword, keyword_type, \
                  value, growth_pct, mention_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&scope.country)
        .bind(&scope.category)
        .bind(row.platform.as_str())
        .bind(to_i32(row.rank))
        .bind(&row.keyword)
        .bind(row.keyword_type.as_str())
        .bind(to_decimal("value", row.value, 1)?)
        .bind(to_decimal("growth_pct", row.growth_pct, 1)?)
        .bind(to_i32(row.mention_count))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

/// Replaces the scope's cross-platform keyword leaderboard.
///
/// # Errors
///
/// Returns [`DbError::NonFiniteScore`] or [`DbError::Sqlx`].
pub async fn replace_keyword_leaderboard(
    pool: &PgPool,
    scope: &Scope,
    rows: &[KeywordLeaderboardEntry],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM keyword_leaderboard WHERE country = $1 AND category = $2")
        .bind(&scope.country)
        .bind(&scope.category)
        .execute(&mut *tx)
        .await?;

    for row in rows {
        sqlx::query(
            "INSERT INTO keyword_leaderboard \
                 (country, category, rank, keyword, keyword_type, \
                  score, assignment_count, product_count, tier) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&scope.country)
        .bind(&scope.category)
        .bind(to_i32(row.rank))
        .bind(&row.keyword)
        .bind(row.keyword_type.as_str())
        .bind(to_decimal("score", row.score, 2)?)
        .bind(to_i32(row.assignment_count))
        .bind(to_i32(row.product_count))
        .bind(row.tier.as_str())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns the scope's keyword assignments in the order they were written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_keyword_assignments(
    pool: &PgPool,
    scope: &Scope,
) -> Result<Vec<KeywordAssignmentRow>, DbError> {
    let rows = sqlx::query_as::<_, KeywordAssignmentRow>(
        "SELECT id, country, category, position, keyword, keyword_type, \
                source_product_id, effects, created_at \
         FROM keyword_assignments \
         WHERE country = $1 AND category = $2 \
         ORDER BY position",
    )
    .bind(&scope.country)
    .bind(&scope.category)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns up to `limit` trends for a country, optionally narrowed to one
/// category, strongest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_trends(
    pool: &PgPool,
    country: &str,
    category: Option<&str>,
    limit: i64,
) -> Result<Vec<TrendRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendRow>(
        "SELECT id, country, category, position, combination_key, \
                ingredients, formats, effects, product_ids, product_count, \
                avg_rank, total_sales, synergy_score, \
                social_signal, retail_signal, review_signal, composite_score, tier, created_at \
         FROM trends \
         WHERE country = $1 AND ($2::TEXT IS NULL OR category = $2) \
         ORDER BY composite_score DESC, combination_key, category \
         LIMIT $3",
    )
    .bind(country)
    .bind(category)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the scope's platform leaderboard, optionally for one platform,
/// ordered by platform then rank.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_platform_leaderboard(
    pool: &PgPool,
    scope: &Scope,
    platform: Option<&str>,
) -> Result<Vec<PlatformLeaderboardRow>, DbError> {
    let rows = sqlx::query_as::<_, PlatformLeaderboardRow>(
        "SELECT id, country, category, platform, rank, keyword, keyword_type, \
                value, growth_pct, mention_count, created_at \
         FROM platform_leaderboard \
         WHERE country = $1 AND category = $2 AND ($3::TEXT IS NULL OR platform = $3) \
         ORDER BY platform, rank",
    )
    .bind(&scope.country)
    .bind(&scope.category)
    .bind(platform)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the scope's keyword leaderboard ordered by type then rank.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_keyword_leaderboard(
    pool: &PgPool,
    scope: &Scope,
) -> Result<Vec<KeywordLeaderboardRow>, DbError> {
    let rows = sqlx::query_as::<_, KeywordLeaderboardRow>(
        "SELECT id, country, category, rank, keyword, keyword_type, \
                score, assignment_count, product_count, tier, created_at \
         FROM keyword_leaderboard \
         WHERE country = $1 AND category = $2 \
         ORDER BY keyword_type, rank",
    )
    .bind(&scope.country)
    .bind(&scope.category)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
