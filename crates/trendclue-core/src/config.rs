use crate::app_config::{AppConfig, Environment, MAX_WEEKS};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("TRENDCLUE_ENV", "development"))?;

    let log_level = or_default("TRENDCLUE_LOG_LEVEL", "info");
    let vocabulary_path = PathBuf::from(or_default(
        "TRENDCLUE_VOCABULARY_PATH",
        "./config/vocabulary.yaml",
    ));

    let db_max_connections = parse_u32("TRENDCLUE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("TRENDCLUE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("TRENDCLUE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "TRENDCLUE_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        });
    }

    let completion_url = optional("TRENDCLUE_COMPLETION_URL");
    let completion_api_key = optional("TRENDCLUE_COMPLETION_API_KEY");
    let completion_model = or_default("TRENDCLUE_COMPLETION_MODEL", "gpt-4o-mini");
    let completion_timeout_secs = parse_u64("TRENDCLUE_COMPLETION_TIMEOUT_SECS", "20")?;

    let default_weeks = parse_u32("TRENDCLUE_DEFAULT_WEEKS", "8")?;
    if default_weeks == 0 || default_weeks > MAX_WEEKS {
        return Err(ConfigError::InvalidEnvVar {
            var: "TRENDCLUE_DEFAULT_WEEKS".to_string(),
            reason: format!("virtual week count must be between 1 and {MAX_WEEKS}"),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        vocabulary_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        completion_url,
        completion_api_key,
        completion_model,
        completion_timeout_secs,
        default_weeks,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TRENDCLUE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
