//! Read-only access to the source collections: `retail_records`,
//! `product_reviews`, and `social_posts`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use trendclue_core::{ProductRecord, ReviewRecord, Scope, Sentiment, SocialPost};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `retail_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RetailRecordRow {
    pub id: i64,
    pub product_id: String,
    pub product_name: String,
    pub description: String,
    pub brand: String,
    pub sales_rank: Option<i32>,
    pub sales_volume: Option<i64>,
    pub country: String,
    pub category: String,
    pub observed_at: DateTime<Utc>,
}

impl From<RetailRecordRow> for ProductRecord {
    fn from(row: RetailRecordRow) -> Self {
        ProductRecord {
            product_id: row.product_id,
            product_name: row.product_name,
            description: row.description,
            brand: row.brand,
            sales_rank: row.sales_rank,
            sales_volume: row.sales_volume,
            country: row.country,
            category: row.category,
            observed_at: row.observed_at,
        }
    }
}

/// A row from the `product_reviews` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: i64,
    pub product_id: String,
    pub content: String,
    pub rating: i16,
    /// Free-text label; unknown labels are treated as unclassified.
    pub sentiment: Option<String>,
    pub posted_at: DateTime<Utc>,
}

impl From<ReviewRow> for ReviewRecord {
    fn from(row: ReviewRow) -> Self {
        ReviewRecord {
            product_id: row.product_id,
            content: row.content,
            rating: row.rating,
            sentiment: row.sentiment.as_deref().and_then(Sentiment::parse),
            posted_at: row.posted_at,
        }
    }
}

/// A row from the `social_posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SocialPostRow {
    pub id: i64,
    pub platform: String,
    pub content: String,
    pub hashtags: Vec<String>,
    pub country: String,
    pub posted_at: DateTime<Utc>,
}

impl From<SocialPostRow> for SocialPost {
    fn from(row: SocialPostRow) -> Self {
        SocialPost {
            platform: row.platform,
            content: row.content,
            hashtags: row.hashtags,
            posted_at: row.posted_at,
            country: row.country,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the earliest and latest `observed_at` of the scope's retail
/// records, or `None` when the scope has none.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn retail_span(
    pool: &PgPool,
    scope: &Scope,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, DbError> {
    let (min, max) = sqlx::query_as::<_, (Option<DateTime<Utc>>, Option<DateTime<Utc>>)>(
        "SELECT MIN(observed_at), MAX(observed_at) \
         FROM retail_records \
         WHERE country = $1 AND category = $2",
    )
    .bind(&scope.country)
    .bind(&scope.category)
    .fetch_one(pool)
    .await?;

    Ok(min.zip(max))
}

/// Returns the scope's retail observations with `observed_at` in
/// `[start, end]`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_retail_records(
    pool: &PgPool,
    scope: &Scope,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<RetailRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, RetailRecordRow>(
        "SELECT id, product_id, product_name, description, brand, \
                sales_rank, sales_volume, country, category, observed_at \
         FROM retail_records \
         WHERE country = $1 AND category = $2 \
           AND observed_at BETWEEN $3 AND $4 \
         ORDER BY observed_at, id",
    )
    .bind(&scope.country)
    .bind(&scope.category)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every review for the given products, newest first per product.
///
/// An empty id list short-circuits without a query.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reviews_for_products(
    pool: &PgPool,
    product_ids: &[String],
) -> Result<Vec<ReviewRow>, DbError> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT id, product_id, content, rating, sentiment, posted_at \
         FROM product_reviews \
         WHERE product_id = ANY($1) \
         ORDER BY product_id, posted_at DESC, id DESC",
    )
    .bind(product_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the country's social posts with `posted_at` in `[start, end]`,
/// oldest first. Posts are not category-scoped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_social_posts(
    pool: &PgPool,
    country: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<SocialPostRow>, DbError> {
    let rows = sqlx::query_as::<_, SocialPostRow>(
        "SELECT id, platform, content, hashtags, country, posted_at \
         FROM social_posts \
         WHERE country = $1 AND posted_at BETWEEN $2 AND $3 \
         ORDER BY posted_at, id",
    )
    .bind(country)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
