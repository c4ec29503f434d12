use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use steward_graph::RunnerConfig;
use steward_persist::StorageBackend;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub runner: RunnerSettings,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(skip)]
    pub openai_api_key: String,
    #[serde(skip)]
    pub mongodb_uri: Option<String>,
    #[serde(skip)]
    pub google_access_token: Option<String>,
    #[serde(skip)]
    pub serper_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a whole request, streaming included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    /// Model used to title threads
    pub title_model: String,
    /// Model used to pick relevant nodes when pruning
    pub judge_model: String,
    #[serde(default)]
    pub assistant_id: Option<String>,
    pub assistant_name: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSettings {
    pub event_timeout_secs: u64,
    pub tool_batch_timeout_secs: u64,
    pub max_tool_rounds: usize,
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. {dir}/default.toml
    /// 2. {dir}/{ENV}.toml (if ENV is set)
    /// 3. STEWARD_ environment variables, `__` between section and key
    ///    (e.g. `STEWARD_SERVER__PORT=9000`)
    ///
    /// `dir` is `STEWARD_CONFIG_DIR`, or `config`.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());
        let dir = std::env::var("STEWARD_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name(&format!("{}/default", dir)).required(false))
            .add_source(File::with_name(&format!("{}/{}", dir, env)).required(false))
            .add_source(
                Environment::with_prefix("STEWARD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.load_secrets()?;
        cfg.validate()?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing). Secrets are
    /// left empty.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    fn load_secrets(&mut self) -> Result<(), ConfigError> {
        self.openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string())
        })?;
        self.mongodb_uri = non_empty_env("MONGODB_URI");
        self.google_access_token = non_empty_env("GOOGLE_ACCESS_TOKEN");
        self.serper_api_key = non_empty_env("SERPER_API_KEY");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Mongodb && self.mongodb_uri.is_none() {
            return Err(ConfigError::Message(
                "MONGODB_URI environment variable is required for the mongodb backend".to_string(),
            ));
        }
        if self.runner.max_tool_rounds == 0 {
            return Err(ConfigError::Message(
                "runner.max_tool_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn runner_config(&self) -> RunnerConfig {
        let mut config = RunnerConfig::new()
            .with_model(self.llm.model.clone())
            .with_event_timeout(Duration::from_secs(self.runner.event_timeout_secs))
            .with_tool_batch_timeout(Duration::from_secs(self.runner.tool_batch_timeout_secs))
            .with_max_tool_rounds(self.runner.max_tool_rounds)
            .with_channel_capacity(self.runner.channel_capacity);
        if let Some(instructions) = &self.llm.instructions {
            config = config.with_instructions(instructions.clone());
        }
        config
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
