//! Application configuration management.

use serde::Deserialize;

/// Environment variable prefix for configuration overrides,
/// e.g. `BANKROLL__DATABASE__URL`.
pub const ENV_PREFIX: &str = "BANKROLL";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger rules and limits.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger rules and limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Maximum number of approved, unpaid loans an account may hold.
    #[serde(default = "default_max_approved_loans")]
    pub max_approved_loans: u32,
    /// Number of records returned by the transaction history query.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// How many times a lost compare-and-swap is retried before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Currency label used in customer-facing messages.
    #[serde(default = "default_currency_label")]
    pub currency_label: String,
}

fn default_max_approved_loans() -> u32 {
    3
}

fn default_history_limit() -> usize {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_currency_label() -> String {
    "BDT".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_approved_loans: default_max_approved_loans(),
            history_limit: default_history_limit(),
            max_retries: default_max_retries(),
            currency_label: default_currency_label(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for local development.
    #[default]
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_filter() -> String {
    "bankroll=info,sqlx=warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default`, `config/{RUN_MODE}`, `BANKROLL__*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
