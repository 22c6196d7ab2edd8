use std::path::PathBuf;

/// Upper bound on the virtual-week count of one run (ten years).
pub const MAX_WEEKS: u32 = 520;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub vocabulary_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Base URL of an OpenAI-compatible completion endpoint. `None` runs the
    /// pipeline with the deterministic vocabulary strategies only.
    pub completion_url: Option<String>,
    pub completion_api_key: Option<String>,
    pub completion_model: String,
    pub completion_timeout_secs: u64,
    /// Virtual-week count used when a run does not pass `--weeks`.
    pub default_weeks: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("vocabulary_path", &self.vocabulary_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("completion_url", &self.completion_url)
            .field(
                "completion_api_key",
                &self.completion_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("completion_model", &self.completion_model)
            .field("completion_timeout_secs", &self.completion_timeout_secs)
            .field("default_weeks", &self.default_weeks)
            .finish()
    }
}
