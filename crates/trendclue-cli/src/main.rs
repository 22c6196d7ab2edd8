mod trends;


use std::path::Path;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trendclue_core::Vocabulary;

use crate::trends::TrendsCommands;

#[derive(Debug, Parser)]
#[command(name = "trendclue")]
#[command(about = "Trend-signal aggregation over retail, review, and social data")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run the trend pipeline and inspect its outputs
    Trends {
        #[command(subcommand)]
        command: TrendsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("trendclue: no command given; see `trendclue --help`");
        return Ok(());
    };

    let config = trendclue_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = trendclue_db::connect_pool_from_config(&config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                trendclue_db::health_check(&pool).await?;
                println!("database is reachable");
            }
            DbCommands::Migrate => {
                let applied = trendclue_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
        },
        Commands::Trends { command } => match command {
            TrendsCommands::Run {
                country,
                category,
                weeks,
                dry_run,
                json,
            } => {
                let vocabulary = load_vocabulary_or_bundled(&config.vocabulary_path)?;
                let options = trends::RunOptions {
                    weeks: weeks.unwrap_or(config.default_weeks),
                    dry_run,
                    json,
                };
                let scope = trendclue_core::Scope::new(country, category);
                trends::run_trends(&pool, &config, &vocabulary, &scope, options).await?;
            }
            TrendsCommands::Status {
                country,
                category,
                limit,
            } => {
                trends::run_trends_status(&pool, &country, category.as_deref(), limit).await?;
            }
            TrendsCommands::Leaderboard {
                country,
                category,
                platform,
            } => {
                let scope = trendclue_core::Scope::new(country, category);
                trends::run_trends_leaderboard(&pool, &scope, platform.as_deref()).await?;
            }
            TrendsCommands::Runs { limit } => {
                trends::run_trends_runs(&pool, limit).await?;
            }
        },
    }

    Ok(())
}

/// Load the vocabulary file, falling back to the compiled-in copy when the
/// file does not exist. A file that exists but fails validation is an error.
fn load_vocabulary_or_bundled(path: &Path) -> anyhow::Result<Vocabulary> {
    if path.exists() {
        let vocabulary = trendclue_core::load_vocabulary(path)?;
        tracing::info!(
            path = %path.display(),
            version = vocabulary.version,
            "vocabulary loaded"
        );
        return Ok(vocabulary);
    }

    tracing::warn!(
        path = %path.display(),
        "vocabulary file not found; using bundled vocabulary"
    );
    Ok(Vocabulary::bundled()?)
}
