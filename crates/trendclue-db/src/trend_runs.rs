//! Database operations for `trend_runs`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use trendclue_core::Scope;
use uuid::Uuid;

use crate::DbError;

/// A row from the `trend_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub country: String,
    pub category: String,
    pub weeks: i32,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub products_analyzed: i32,
    pub trends_written: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Creates a new trend run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_trend_run(
    pool: &PgPool,
    scope: &Scope,
    weeks: i32,
    trigger_source: &str,
) -> Result<TrendRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, TrendRunRow>(
        "INSERT INTO trend_runs (public_id, country, category, weeks, trigger_source, status) \
         VALUES ($1, $2, $3, $4, $5, 'queued') \
         RETURNING id, public_id, country, category, weeks, trigger_source, status, \
                   started_at, completed_at, products_analyzed, trends_written, \
                   error_message, created_at",
    )
    .bind(public_id)
    .bind(&scope.country)
    .bind(&scope.category)
    .bind(weeks)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a queued run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `queued`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_trend_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE trend_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a running run as `succeeded` and records its counts.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_trend_run(
    pool: &PgPool,
    id: i64,
    products_analyzed: i32,
    trends_written: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE trend_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             products_analyzed = $1, trends_written = $2 \
         WHERE id = $3 AND status = 'running'",
    )
    .bind(products_analyzed)
    .bind(trends_written)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a running run as `failed` with `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_trend_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE trend_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_trend_run(pool: &PgPool, id: i64) -> Result<TrendRunRow, DbError> {
    let row = sqlx::query_as::<_, TrendRunRow>(
        "SELECT id, public_id, country, category, weeks, trigger_source, status, \
                started_at, completed_at, products_analyzed, trends_written, \
                error_message, created_at \
         FROM trend_runs \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_trend_runs(pool: &PgPool, limit: i64) -> Result<Vec<TrendRunRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendRunRow>(
        "SELECT id, public_id, country, category, weeks, trigger_source, status, \
                started_at, completed_at, products_analyzed, trends_written, \
                error_message, created_at \
         FROM trend_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
