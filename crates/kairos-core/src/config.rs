use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub expansion: ExpansionConfig,
    pub freebusy: FreeBusyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Limits applied while expanding recurrence rules.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ExpansionConfig {
    /// Consecutive empty recurrence periods tolerated before a rule is
    /// reported as unable to match anything.
    pub max_lookahead: u32,
    /// Upper bound on instants materialized from an unbounded set.
    pub max_instances: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FreeBusyConfig {
    pub default_window_days: u32,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `config.toml` and environment variables into a `Settings`.
    /// Environment variables take precedence over file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails,
    /// or if the loaded values are out of range.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("expansion.max_lookahead", 1000)?
            .set_default("expansion.max_instances", 10_000)?
            .set_default("freebusy.default_window_days", 30)?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env vars
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        tracing::debug!(
            max_lookahead = settings.expansion.max_lookahead,
            max_instances = settings.expansion.max_instances,
            "Settings loaded"
        );
        Ok(settings)
    }

    /// ## Summary
    /// Rejects settings the expansion engine cannot honor.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` when a limit is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.expansion.max_lookahead == 0 {
            return Err(CoreError::ConfigError(
                "expansion.max_lookahead must be positive".to_string(),
            ));
        }
        if self.expansion.max_instances == 0 {
            return Err(CoreError::ConfigError(
                "expansion.max_instances must be positive".to_string(),
            ));
        }
        if self.freebusy.default_window_days == 0 {
            return Err(CoreError::ConfigError(
                "freebusy.default_window_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
