//! Offline unit tests for trendclue-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::path::PathBuf;

use chrono::Utc;
use rust_decimal::Decimal;
use trendclue_core::{AppConfig, Environment, ProductRecord, ReviewRecord, Sentiment, SocialPost};
use trendclue_db::{PoolConfig, RetailRecordRow, ReviewRow, SocialPostRow, TrendRow, TrendRunRow};
use uuid::Uuid;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        vocabulary_path: PathBuf::from("./config/vocabulary.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        completion_url: None,
        completion_api_key: None,
        completion_model: "gpt-4o-mini".to_string(),
        completion_timeout_secs: 20,
        default_weeks: 8,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`TrendRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn trend_run_row_has_expected_fields() {
    let row = TrendRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        country: "usa".to_string(),
        category: "Skincare".to_string(),
        weeks: 8_i32,
        trigger_source: "cli".to_string(),
        status: "queued".to_string(),
        started_at: None,
        completed_at: None,
        products_analyzed: 0_i32,
        trends_written: 0_i32,
        error_message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.status, "queued");
    assert_eq!(row.weeks, 8);
    assert!(row.started_at.is_none());
    assert!(row.error_message.is_none());
}

#[test]
fn trend_row_scores_are_decimals() {
    let row = TrendRow {
        id: 1,
        country: "usa".to_string(),
        category: "Skincare".to_string(),
        position: 0,
        combination_key: "retinol + serum + anti-aging".to_string(),
        ingredients: vec!["retinol".to_string()],
        formats: vec!["serum".to_string()],
        effects: vec!["anti-aging".to_string()],
        product_ids: vec!["A".to_string(), "B".to_string()],
        product_count: 2,
        avg_rank: Decimal::new(50, 1),
        total_sales: 20_000,
        synergy_score: Decimal::new(680, 3),
        social_signal: Decimal::new(1000, 1),
        retail_signal: Decimal::new(700, 1),
        review_signal: Decimal::new(650, 1),
        composite_score: Decimal::new(7993, 2),
        tier: "Actionable".to_string(),
        created_at: Utc::now(),
    };

    assert_eq!(row.composite_score.to_string(), "79.93");
    assert_eq!(row.synergy_score.to_string(), "0.680");
    assert_eq!(usize::try_from(row.product_count).unwrap(), row.product_ids.len());
}

#[test]
fn retail_row_converts_to_product_record() {
    let observed_at = Utc::now();
    let row = RetailRecordRow {
        id: 9,
        product_id: "A".to_string(),
        product_name: "Glow Serum".to_string(),
        description: "retinol serum".to_string(),
        brand: "Lumi".to_string(),
        sales_rank: Some(3),
        sales_volume: None,
        country: "usa".to_string(),
        category: "Skincare".to_string(),
        observed_at,
    };

    let record = ProductRecord::from(row);
    assert_eq!(record.product_id, "A");
    assert_eq!(record.sales_rank, Some(3));
    assert_eq!(record.sales_volume, None);
    assert_eq!(record.observed_at, observed_at);
}

#[test]
fn review_row_with_unknown_sentiment_label_is_unclassified() {
    let row = |label: Option<&str>| ReviewRow {
        id: 1,
        product_id: "A".to_string(),
        content: "nice".to_string(),
        rating: 5,
        sentiment: label.map(str::to_string),
        posted_at: Utc::now(),
    };

    assert_eq!(
        ReviewRecord::from(row(Some("Positive"))).sentiment,
        Some(Sentiment::Positive)
    );
    assert_eq!(ReviewRecord::from(row(Some("mixed"))).sentiment, None);
    assert_eq!(ReviewRecord::from(row(None)).sentiment, None);
}

#[test]
fn social_row_keeps_hashtags() {
    let row = SocialPostRow {
        id: 1,
        platform: "TikTok".to_string(),
        content: "my retinol routine".to_string(),
        hashtags: vec!["skincare".to_string(), "retinol".to_string()],
        country: "usa".to_string(),
        posted_at: Utc::now(),
    };

    let post = SocialPost::from(row);
    assert_eq!(post.platform, "TikTok");
    assert_eq!(post.hashtags, vec!["skincare", "retinol"]);
}
