//! Storage seam between the pipeline and its source/output collections.

use std::future::Future;

use chrono::{DateTime, Utc};
use trendclue_core::{
    KeywordAssignment, KeywordLeaderboardEntry, PlatformLeaderboardEntry, ProductRecord,
    ReviewRecord, Scope, SocialPost, Trend,
};

use crate::error::StoreError;

/// Reads the source collections and full-replaces the output collections.
///
/// Every `replace_*` call deletes the scope's existing rows and writes the
/// given rows atomically, returning the number written.
pub trait TrendStore {
    /// Earliest and latest retail observation for the scope, if any.
    fn retail_span(
        &self,
        scope: &Scope,
    ) -> impl Future<Output = Result<Option<(DateTime<Utc>, DateTime<Utc>)>, StoreError>> + Send;

    fn retail_records(
        &self,
        scope: &Scope,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<ProductRecord>, StoreError>> + Send;

    fn reviews_for_products(
        &self,
        product_ids: &[String],
    ) -> impl Future<Output = Result<Vec<ReviewRecord>, StoreError>> + Send;

    fn social_posts(
        &self,
        country: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<SocialPost>, StoreError>> + Send;

    fn replace_keyword_assignments(
        &self,
        scope: &Scope,
        rows: &[KeywordAssignment],
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn replace_trends(
        &self,
        scope: &Scope,
        rows: &[Trend],
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn replace_platform_leaderboard(
        &self,
        scope: &Scope,
        rows: &[PlatformLeaderboardEntry],
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn replace_keyword_leaderboard(
        &self,
        scope: &Scope,
        rows: &[KeywordLeaderboardEntry],
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;
}
