//! Shared domain types and configuration for the trend pipeline.

pub mod app_config;
pub mod config;
pub mod records;
pub mod trends;
pub mod vocabulary;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, MAX_WEEKS};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{ProductRecord, ReviewRecord, Scope, Sentiment, SocialPost};
pub use trends::{
    KeywordAssignment, KeywordLeaderboardEntry, KeywordType, Platform, PlatformLeaderboardEntry,
    Signals, Trend, TrendTier,
};
pub use vocabulary::{load_vocabulary, Vocabulary};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read vocabulary file {path}: {source}")]
    VocabularyFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse vocabulary file: {0}")]
    VocabularyFileParse(#[from] serde_yaml::Error),

    #[error("vocabulary validation failed: {0}")]
    Validation(String),
}
