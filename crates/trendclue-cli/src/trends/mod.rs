//! Trend pipeline command handlers for the CLI.
//!
//! `run` executes the pipeline for one scope under the scope's advisory lock
//! and tracks it in `trend_runs`; the remaining subcommands are read-only
//! queries over the persisted outputs.

mod query;
mod store;

use std::time::Duration;

use clap::Subcommand;
use trendclue_core::{AppConfig, Scope, Vocabulary, MAX_WEEKS};
use trendclue_pipeline::{
    run_and_persist, run_trend_pipeline, Completion, CompletionClient, CompletionError,
    DisabledCompletion, PersistSummary, PipelineContext, PipelineOutput, PipelineSettings, Prompt,
};

use self::store::PgTrendStore;

pub(crate) use query::{run_trends_leaderboard, run_trends_runs, run_trends_status};

/// Number of trends printed in the text summary of a run.
const SUMMARY_TRENDS: usize = 10;

/// Sub-commands available under `trends`.
#[derive(Debug, Subcommand)]
pub enum TrendsCommands {
    /// Run the trend pipeline for a country and category
    Run {
        /// Country code of the scope (e.g., usa)
        #[arg(long)]
        country: String,
        /// Product category of the scope (e.g., Skincare)
        #[arg(long)]
        category: String,
        /// Number of virtual weeks to split the window into (1 to 520)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WEEKS)))]
        weeks: Option<u32>,
        /// Compute and print results without writing outputs or a run row
        #[arg(long)]
        dry_run: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show persisted trends for a country
    Status {
        #[arg(long)]
        country: String,
        /// Narrow to one category
        #[arg(long)]
        category: Option<String>,
        /// Maximum number of trends to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    /// Show the platform and keyword leaderboards for a scope
    Leaderboard {
        #[arg(long)]
        country: String,
        #[arg(long)]
        category: String,
        /// Only show this platform's board (e.g., TikTok)
        #[arg(long)]
        platform: Option<String>,
    },
    /// Show recent pipeline runs
    Runs {
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RunOptions {
    pub weeks: u32,
    pub dry_run: bool,
    pub json: bool,
}

/// The completion capability chosen from configuration.
enum RunCompletion {
    Http(CompletionClient),
    Disabled(DisabledCompletion),
}

impl Completion for RunCompletion {
    async fn complete(&self, prompt: &Prompt<'_>) -> Result<String, CompletionError> {
        match self {
            RunCompletion::Http(client) => client.complete(prompt).await,
            RunCompletion::Disabled(disabled) => disabled.complete(prompt).await,
        }
    }
}

fn build_completion(config: &AppConfig) -> anyhow::Result<RunCompletion> {
    let Some(url) = config.completion_url.as_deref() else {
        tracing::info!("no completion endpoint configured; deterministic strategies only");
        return Ok(RunCompletion::Disabled(DisabledCompletion));
    };

    let client = CompletionClient::new(
        url,
        config.completion_api_key.as_deref(),
        &config.completion_model,
        Duration::from_secs(config.completion_timeout_secs),
    )?;
    Ok(RunCompletion::Http(client))
}

/// Run the pipeline for `scope` and persist its outputs.
///
/// Takes the scope's advisory lock first; a second concurrent run for the
/// same scope fails here without reading anything. When `dry_run` is set,
/// nothing is written, including the `trend_runs` row.
///
/// # Errors
///
/// Returns an error if the scope is locked, the completion client cannot be
/// built, the run row cannot be created, or the pipeline fails. Pipeline
/// failures mark the run as failed before returning.
pub(crate) async fn run_trends(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    vocabulary: &Vocabulary,
    scope: &Scope,
    options: RunOptions,
) -> anyhow::Result<()> {
    anyhow::ensure!(
        (1..=MAX_WEEKS).contains(&options.weeks),
        "--weeks must be between 1 and {MAX_WEEKS}"
    );

    let Some(lock) = trendclue_db::try_lock_scope(pool, scope).await? else {
        anyhow::bail!("another trend run is already in progress for {scope}");
    };

    let result = run_locked(pool, config, vocabulary, scope, options).await;

    if let Err(err) = lock.release().await {
        tracing::warn!(scope = %scope, error = %err, "failed to release scope lock");
    }
    result
}

async fn run_locked(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    vocabulary: &Vocabulary,
    scope: &Scope,
    options: RunOptions,
) -> anyhow::Result<()> {
    let completion = build_completion(config)?;
    let store = PgTrendStore::new(pool);
    let ctx = PipelineContext {
        store: &store,
        completion: &completion,
        vocabulary,
        settings: PipelineSettings {
            completion_timeout: Duration::from_secs(config.completion_timeout_secs),
        },
    };

    if options.dry_run {
        let output = run_trend_pipeline(&ctx, scope, options.weeks).await?;
        return print_run(&output, None, options.json);
    }

    let weeks = i32::try_from(options.weeks).unwrap_or(i32::MAX);
    let run = trendclue_db::create_trend_run(pool, scope, weeks, "cli").await?;
    trendclue_db::start_trend_run(pool, run.id).await?;
    tracing::info!(run_id = run.id, scope = %scope, weeks = options.weeks, "trend run started");

    let (output, summary) = match run_and_persist(&ctx, scope, options.weeks).await {
        Ok(done) => done,
        Err(err) => {
            fail_run_best_effort(pool, run.id, err.to_string()).await;
            return Err(err.into());
        }
    };

    let products = i32::try_from(output.product_count).unwrap_or(i32::MAX);
    let trends = i32::try_from(summary.trends).unwrap_or(i32::MAX);
    if let Err(err) = trendclue_db::complete_trend_run(pool, run.id, products, trends).await {
        fail_run_best_effort(pool, run.id, format!("{err:#}")).await;
        return Err(err.into());
    }
    tracing::info!(run_id = run.id, scope = %scope, trends, "trend run succeeded");

    print_run(&output, Some(&summary), options.json)
}

/// Attempt to mark a trend run as failed, logging any secondary error.
async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = trendclue_db::fail_trend_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark trend run as failed"
        );
    }
}

fn output_json(output: &PipelineOutput, summary: Option<&PersistSummary>) -> serde_json::Value {
    serde_json::json!({
        "scope": output.scope,
        "window": {
            "start": output.window.start,
            "end": output.window.end,
            "weeks": output.window.weeks,
            "boundaries": output.window.boundaries,
        },
        "product_count": output.product_count,
        "skipped_records": output.skipped_records,
        "strategies": {
            "extraction": output.extraction_strategy.as_str(),
            "effects": output.effect_strategy.as_str(),
        },
        "assignment_count": output.assignments.len(),
        "trends": output.trends,
        "platform_leaderboard": output.platform_leaderboard,
        "keyword_leaderboard": output.keyword_leaderboard,
        "persisted": summary.map(|s| serde_json::json!({
            "assignments": s.assignments,
            "trends": s.trends,
            "platform_entries": s.platform_entries,
            "keyword_entries": s.keyword_entries,
        })),
    })
}

fn print_run(
    output: &PipelineOutput,
    summary: Option<&PersistSummary>,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output_json(output, summary))?
        );
        return Ok(());
    }

    let mode = if summary.is_some() { "trend run" } else { "dry-run" };
    println!(
        "{mode} for {}: {} products ({} skipped records), {} assignments, {} trends",
        output.scope,
        output.product_count,
        output.skipped_records,
        output.assignments.len(),
        output.trends.len(),
    );
    println!(
        "window: {} .. {} ({} weeks); extraction={} effects={}",
        output.window.start.format("%Y-%m-%d"),
        output.window.end.format("%Y-%m-%d"),
        output.window.weeks,
        output.extraction_strategy,
        output.effect_strategy,
    );

    if !output.trends.is_empty() {
        println!();
        println!(
            "{:<45}{:<12}{:>10}{:>8}{:>8}{:>8}{:>10}",
            "COMBINATION", "TIER", "SCORE", "SOCIAL", "RETAIL", "REVIEW", "PRODUCTS"
        );
        for trend in output.trends.iter().take(SUMMARY_TRENDS) {
            println!(
                "{:<45}{:<12}{:>10.2}{:>8.1}{:>8.1}{:>8.1}{:>10}",
                trend.combination_key,
                trend.tier.as_str(),
                trend.composite_score,
                trend.signals.social,
                trend.signals.retail,
                trend.signals.review,
                trend.product_count,
            );
        }
    }

    if let Some(summary) = summary {
        println!();
        println!(
            "persisted: {} assignments, {} trends, {} platform entries, {} keyword entries",
            summary.assignments, summary.trends, summary.platform_entries, summary.keyword_entries
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
