//! Postgres-backed [`TrendStore`] for the pipeline.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use trendclue_core::{
    KeywordAssignment, KeywordLeaderboardEntry, PlatformLeaderboardEntry, ProductRecord,
    ReviewRecord, Scope, SocialPost, Trend,
};
use trendclue_pipeline::{StoreError, TrendStore};

pub(crate) struct PgTrendStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgTrendStore<'a> {
    pub(crate) fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl TrendStore for PgTrendStore<'_> {
    async fn retail_span(
        &self,
        scope: &Scope,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, StoreError> {
        Ok(trendclue_db::retail_span(self.pool, scope).await?)
    }

    async fn retail_records(
        &self,
        scope: &Scope,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        let rows = trendclue_db::list_retail_records(self.pool, scope, start, end).await?;
        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }

    async fn reviews_for_products(
        &self,
        product_ids: &[String],
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        let rows = trendclue_db::list_reviews_for_products(self.pool, product_ids).await?;
        Ok(rows.into_iter().map(ReviewRecord::from).collect())
    }

    async fn social_posts(
        &self,
        country: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SocialPost>, StoreError> {
        let rows = trendclue_db::list_social_posts(self.pool, country, start, end).await?;
        Ok(rows.into_iter().map(SocialPost::from).collect())
    }

    async fn replace_keyword_assignments(
        &self,
        scope: &Scope,
        rows: &[KeywordAssignment],
    ) -> Result<usize, StoreError> {
        Ok(trendclue_db::replace_keyword_assignments(self.pool, scope, rows).await?)
    }

    async fn replace_trends(&self, scope: &Scope, rows: &[Trend]) -> Result<usize, StoreError> {
        Ok(trendclue_db::replace_trends(self.pool, scope, rows).await?)
    }

    async fn replace_platform_leaderboard(
        &self,
        scope: &Scope,
        rows: &[PlatformLeaderboardEntry],
    ) -> Result<usize, StoreError> {
        Ok(trendclue_db::replace_platform_leaderboard(self.pool, scope, rows).await?)
    }

    async fn replace_keyword_leaderboard(
        &self,
        scope: &Scope,
        rows: &[KeywordLeaderboardEntry],
    ) -> Result<usize, StoreError> {
        Ok(trendclue_db::replace_keyword_leaderboard(self.pool, scope, rows).await?)
    }
}
