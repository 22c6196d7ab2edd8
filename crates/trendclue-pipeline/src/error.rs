use std::time::Duration;

use thiserror::Error;
use trendclue_core::Scope;

/// Failure reported by a [`TrendStore`](crate::TrendStore) implementation.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Any failure of the text-completion capability. Every variant trips the
/// strategy breaker the same way.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion endpoint returned status {0}")]
    Status(u16),

    #[error("completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("completion response had no content")]
    EmptyResponse,

    #[error("unparseable completion response: {0}")]
    Unparseable(String),

    #[error("completion capability is not configured")]
    Disabled,
}

/// A single source record that cannot be used. The record is skipped; the
/// run continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("retail record has an empty product id")]
    MissingProductId,

    #[error("product {product_id} has no usable sales rank")]
    InvalidRank { product_id: String },

    #[error("review for product {product_id} has rating {rating} outside 1..=5")]
    InvalidRating { product_id: String, rating: i16 },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no source products for scope {0}")]
    DataAbsent(Scope),

    #[error("virtual week count must be at least 1")]
    InvalidWindow,

    #[error("source read failed: {0}")]
    Store(#[source] StoreError),

    #[error("failed to persist {collection}: {source}")]
    Persistence {
        collection: &'static str,
        #[source]
        source: StoreError,
    },
}
