use std::time::Duration;

use trendclue_core::{
    KeywordAssignment, KeywordLeaderboardEntry, PlatformLeaderboardEntry, Scope, Trend,
};

use crate::breaker::BreakerState;
use crate::window::TimeWindow;

/// Tunables for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Upper bound on each learned-strategy call.
    pub completion_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            completion_timeout: Duration::from_secs(20),
        }
    }
}

/// Everything one run computes for a scope, before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub scope: Scope,
    pub window: TimeWindow,
    /// Distinct products analysed (latest observation per product id).
    pub product_count: usize,
    /// Retail and review records dropped as malformed.
    pub skipped_records: usize,
    pub assignments: Vec<KeywordAssignment>,
    pub trends: Vec<Trend>,
    pub platform_leaderboard: Vec<PlatformLeaderboardEntry>,
    pub keyword_leaderboard: Vec<KeywordLeaderboardEntry>,
    pub extraction_strategy: BreakerState,
    pub effect_strategy: BreakerState,
}

/// Rows written per output collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub assignments: usize,
    pub trends: usize,
    pub platform_entries: usize,
    pub keyword_entries: usize,
}
