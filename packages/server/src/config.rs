use common::config::ProgressConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JudgingConfig {
    /// Seconds between scans for submissions with more than one valid judging.
    #[serde(default = "default_consistency_scan_interval_secs")]
    pub consistency_scan_interval_secs: u64,
    /// Offset applied when rendering absolute timestamps.
    #[serde(default)]
    pub display_utc_offset_minutes: i32,
}

fn default_consistency_scan_interval_secs() -> u64 {
    300
}

impl Default for JudgingConfig {
    fn default() -> Self {
        Self {
            consistency_scan_interval_secs: default_consistency_scan_interval_secs(),
            display_utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// A `tracing` level name: trace, debug, info, warn or error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub judging: JudgingConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("COURSEBOARD_CONFIG").unwrap_or_else(|_| "config/config".to_string());
        Self::load_from(&config_path)
    }

    /// Load from `path` (extension optional, file may be absent), then apply
    /// environment overrides such as `COURSEBOARD__PROGRESS__TOTAL_PERIODS`.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "postgres://localhost/courseboard")?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("COURSEBOARD").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.progress
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        if self.judging.consistency_scan_interval_secs == 0 {
            return Err(ConfigError::Message(
                "judging.consistency_scan_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
