//! Read-only trend query handlers.

use trendclue_core::{Platform, Scope};

/// Format an optional timestamp for display, returning `"\u{2014}"` when `None`.
fn fmt_time(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map_or_else(
        || "\u{2014}".to_string(),
        |t| t.format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Show persisted trends for a country, strongest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_trends_status(
    pool: &sqlx::PgPool,
    country: &str,
    category: Option<&str>,
    limit: u32,
) -> anyhow::Result<()> {
    let trends = trendclue_db::list_trends(pool, country, category, i64::from(limit)).await?;

    if trends.is_empty() {
        println!(
            "no trends found for country '{country}'{}; run `trends run` first",
            category
                .map(|c| format!(" and category '{c}'"))
                .unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "{:<14}{:<45}{:<12}{:>9}{:>8}{:>8}{:>8}{:>10}",
        "CATEGORY", "COMBINATION", "TIER", "SCORE", "SOCIAL", "RETAIL", "REVIEW", "PRODUCTS"
    );
    for trend in &trends {
        println!(
            "{:<14}{:<45}{:<12}{:>9}{:>8}{:>8}{:>8}{:>10}",
            trend.category,
            trend.combination_key,
            trend.tier,
            trend.composite_score.to_string(),
            trend.social_signal.to_string(),
            trend.retail_signal.to_string(),
            trend.review_signal.to_string(),
            trend.product_count
        );
    }

    Ok(())
}

/// Show the per-platform and per-type keyword leaderboards for a scope.
///
/// # Errors
///
/// Returns an error if `platform` is not a known channel or a query fails.
pub(crate) async fn run_trends_leaderboard(
    pool: &sqlx::PgPool,
    scope: &Scope,
    platform: Option<&str>,
) -> anyhow::Result<()> {
    let platform = platform
        .map(|p| Platform::parse(p).ok_or_else(|| anyhow::anyhow!("unknown platform '{p}'")))
        .transpose()?;

    let platform_rows =
        trendclue_db::list_platform_leaderboard(pool, scope, platform.map(Platform::as_str))
            .await?;

    if platform_rows.is_empty() {
        println!("no platform leaderboard for {scope}; run `trends run` first");
    } else {
        println!("# Platform leaderboard: {scope}");
        println!(
            "{:<12}{:>5}  {:<28}{:<12}{:>8}{:>10}{:>10}",
            "PLATFORM", "RANK", "KEYWORD", "TYPE", "VALUE", "GROWTH%", "MENTIONS"
        );
        for row in &platform_rows {
            println!(
                "{:<12}{:>5}  {:<28}{:<12}{:>8}{:>10}{:>10}",
                row.platform,
                row.rank,
                row.keyword,
                row.keyword_type,
                row.value.to_string(),
                row.growth_pct.to_string(),
                row.mention_count
            );
        }
    }

    // The keyword board is cross-platform; a platform filter only narrows
    // the section above.
    if platform.is_some() {
        return Ok(());
    }

    let keyword_rows = trendclue_db::list_keyword_leaderboard(pool, scope).await?;
    if keyword_rows.is_empty() {
        return Ok(());
    }

    println!();
    println!("# Keyword leaderboard: {scope}");
    println!(
        "{:<12}{:>5}  {:<28}{:>9}{:>8}{:>10}  TIER",
        "TYPE", "RANK", "KEYWORD", "SCORE", "USES", "PRODUCTS"
    );
    for row in &keyword_rows {
        println!(
            "{:<12}{:>5}  {:<28}{:>9}{:>8}{:>10}  {}",
            row.keyword_type,
            row.rank,
            row.keyword,
            row.score.to_string(),
            row.assignment_count,
            row.product_count,
            row.tier
        );
    }

    Ok(())
}

/// Show the most recent pipeline runs.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_trends_runs(pool: &sqlx::PgPool, limit: u32) -> anyhow::Result<()> {
    let runs = trendclue_db::list_trend_runs(pool, i64::from(limit)).await?;

    if runs.is_empty() {
        println!("no trend runs recorded yet");
        return Ok(());
    }

    println!(
        "{:<6}{:<24}{:<11}{:<18}{:<18}{:>9}{:>8}  ERROR",
        "ID", "SCOPE", "STATUS", "STARTED", "COMPLETED", "PRODUCTS", "TRENDS"
    );
    for run in &runs {
        println!(
            "{:<6}{:<24}{:<11}{:<18}{:<18}{:>9}{:>8}  {}",
            run.id,
            format!("{}/{}", run.country, run.category),
            run.status,
            fmt_time(run.started_at),
            fmt_time(run.completed_at),
            run.products_analyzed,
            run.trends_written,
            run.error_message.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
