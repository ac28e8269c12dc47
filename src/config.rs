use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::store::database_path;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connection_timeout_secs: 30,
                busy_timeout_ms: 5000,
            },
            llm: LlmConfig {
                api_key: String::new(),
                model: "gemini-2.5-flash".to_string(),
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                max_attempts: 3,
                retry_delay_ms: 0,
                request_timeout_secs: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence.
    ///
    /// `GEMINI_API_KEY` and `DATABASE_URL` are read from the environment and
    /// win over every other source.
    pub fn load() -> Result<Self> {
        Self::load_with_overrides(
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("DATABASE_URL").ok(),
        )
    }

    /// Same as [`AppConfig::load`] with the two required values passed in.
    pub fn load_with_overrides(api_key: Option<String>, database_url: Option<String>) -> Result<Self> {
        let app_config = Self::assemble(api_key, database_url)?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Load configuration for `init-db`, which never talks to the LLM
    /// provider and so does not need `GEMINI_API_KEY`.
    pub fn load_for_init_db() -> Result<Self> {
        Self::load_for_init_db_with_override(std::env::var("DATABASE_URL").ok())
    }

    /// Same as [`AppConfig::load_for_init_db`] with the database URL passed in.
    pub fn load_for_init_db_with_override(database_url: Option<String>) -> Result<Self> {
        let app_config = Self::assemble(None, database_url)?;
        app_config.validate_storage()?;
        Ok(app_config)
    }

    fn assemble(api_key: Option<String>, database_url: Option<String>) -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default())?)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix, e.g. CALL_INSIGHT__SERVER__PORT
            .add_source(
                Environment::with_prefix("CALL_INSIGHT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_override_option("llm.api_key", api_key.filter(|k| !k.trim().is_empty()))?
            .set_override_option("database.url", database_url.filter(|u| !u.trim().is_empty()))?
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Required secrets
        if self.llm.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("GEMINI_API_KEY environment variable is not set."));
        }

        // Validate LLM config
        if self.llm.max_attempts == 0 {
            return Err(anyhow::anyhow!("max_attempts must be greater than 0"));
        }
        if self.llm.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("request_timeout_secs must be greater than 0"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(anyhow::anyhow!("llm model cannot be empty"));
        }

        self.validate_storage()
    }

    /// Validate the database and logging sections only.
    pub fn validate_storage(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(anyhow::anyhow!("DATABASE_URL environment variable is not set."));
        }
        database_path(&self.database.url)?;

        // Validate database config
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(anyhow::anyhow!("connection_timeout_secs must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        Ok(())
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.api_key = "test-key".to_string();
        config.database.url = "sqlite://data/calls.db".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.llm.max_attempts, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_defaults_alone_are_not_startable() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = configured();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }
}
