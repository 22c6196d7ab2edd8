//! Trend-signal aggregation pipeline.
//!
//! Reads a scope's retail, review, and social records through a
//! [`TrendStore`], extracts typed keywords per product, groups products into
//! ingredient + format + effect combinations, scores each combination on
//! three channel signals, classifies it into a maturity tier, and builds the
//! per-platform and per-type keyword leaderboards.

pub mod breaker;
pub mod classifier;
pub mod combination;
pub mod completion;
pub mod effects;
pub mod error;
pub mod extractor;
pub mod leaderboard;
pub mod pipeline;
pub mod scoring;
pub mod sentiment;
pub mod signals;
pub mod store;
pub mod types;
pub mod window;

pub use breaker::BreakerState;
pub use completion::{Completion, CompletionClient, DisabledCompletion, Prompt};
pub use error::{CompletionError, PipelineError, RecordError, StoreError};
pub use pipeline::{persist_outputs, run_and_persist, run_trend_pipeline, PipelineContext};
pub use store::TrendStore;
pub use types::{PersistSummary, PipelineOutput, PipelineSettings};
pub use window::TimeWindow;
