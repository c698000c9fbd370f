use super::arbitration::ArbitrationConfig;
use super::logging::LoggingConfig;
use crate::application::settings::EngineSettings;
use crate::domain::error::DomainError;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_ENV: &str = "TICKERWATCH_CONFIG";
pub const DB_ENV: &str = "TICKERWATCH_DB";
pub const PROVIDER_ENV: &str = "TICKERWATCH_ARBITRATION_PROVIDER";
pub const MODEL_ENV: &str = "TICKERWATCH_ARBITRATION_MODEL";

/// Complete runtime configuration. Engine knobs sit at the top level of the
/// TOML file; `[logging]` and `[arbitration]` are tables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub engine: EngineSettings,
    pub database_path: String,
    pub poll_interval_secs: u64,
    pub snapshot_refresh_secs: u64,
    pub logging: LoggingConfig,
    pub arbitration: ArbitrationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            database_path: "./tickerwatch.db".into(),
            poll_interval_secs: 30,
            snapshot_refresh_secs: 300,
            logging: LoggingConfig::default(),
            arbitration: ArbitrationConfig::default(),
        }
    }
}

impl Config {
    pub fn parse_toml(content: &str) -> Result<Self, DomainError> {
        let config: Self =
            toml::from_str(content).map_err(|e| DomainError::Config(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("Cannot read {}: {e}", path.display())))?;
        Self::parse_toml(&content)
    }

    /// Defaults, then the file from `path` or `TICKERWATCH_CONFIG`, then
    /// environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self, DomainError> {
        let env_path = std::env::var(CONFIG_ENV).ok();
        let mut config = match path.map(Path::to_path_buf).or_else(|| env_path.map(Into::into)) {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), DomainError> {
        if let Ok(db) = std::env::var(DB_ENV) {
            self.database_path = db;
        }
        if let Ok(provider) = std::env::var(PROVIDER_ENV) {
            self.arbitration.provider = provider.parse().map_err(DomainError::Config)?;
        }
        if let Ok(model) = std::env::var(MODEL_ENV) {
            self.arbitration.model = Some(model);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.engine.validate()?;
        if self.database_path.trim().is_empty() {
            return Err(DomainError::Config("database_path must not be empty".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(DomainError::Config("poll_interval_secs must be at least 1".into()));
        }
        if self.snapshot_refresh_secs == 0 {
            return Err(DomainError::Config("snapshot_refresh_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// Defaults pointed at an in-memory database.
    pub fn in_memory() -> Self {
        Self {
            database_path: ":memory:".into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::arbitration::ArbitrationProvider;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.engine.accept_threshold, 0.80);
        assert_eq!(config.database_path, "./tickerwatch.db");
        assert_eq!(config.arbitration.provider, ArbitrationProvider::None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_flattened_engine_keys_and_tables() {
        let config = Config::parse_toml(
            r#"
            accept_threshold = 0.85
            arbitration_batch_delay_ms = 0
            allowed_venues = ["NASDAQ"]
            database_path = "/tmp/tw.db"

            [logging]
            format = "json"

            [arbitration]
            provider = "anthropic"
            model = "claude-3-5-haiku-latest"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.accept_threshold, 0.85);
        assert_eq!(config.engine.low_confidence_floor, 0.60);
        assert_eq!(config.engine.arbitration_batch_delay_ms, 0);
        assert_eq!(config.engine.allowed_venues, vec!["NASDAQ".to_string()]);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.arbitration.provider, ArbitrationProvider::Anthropic);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::parse_toml("low_confidence_floor = 0.95").is_err());
        assert!(Config::parse_toml("poll_interval_secs = 0").is_err());
        assert!(Config::parse_toml("[arbitration]\nprovider = \"mystery\"").is_err());
    }
}
