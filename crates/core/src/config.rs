//! Layered configuration: defaults, then `navigator.toml` (or
//! `config/navigator.toml`), then `NAVIGATOR_*` environment variables, then
//! validation. Every file section and key is optional.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
    /// Serve from the seeded in-memory store when the database cannot be opened.
    pub fallback_to_memory: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    #[serde(deserialize_with = "secret_from_text")]
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub temperature: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Disabled,
    #[serde(alias = "openai")]
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Explicit config file. When unset the working directory is searched.
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://navigator.db".to_string(),
            max_connections: 5,
            timeout_secs: 30,
            fallback_to_memory: true,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Disabled,
            api_key: None,
            base_url: None,
            model: "gpt-3.5-turbo".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            temperature: 0.3,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 5000,
            static_dir: None,
            graceful_shutdown_secs: 15,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected disabled|openai|ollama)"
            ))),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl LlmConfig {
    /// Base URL for the chat completions API, with the provider default filled in.
    pub fn effective_base_url(&self) -> String {
        let configured = self.base_url.as_deref().map(str::trim).filter(|url| !url.is_empty());
        let url = match (configured, self.provider) {
            (Some(url), _) => url.to_string(),
            (None, LlmProvider::Ollama) => "http://localhost:11434/v1".to_string(),
            (None, _) => "https://api.openai.com/v1".to_string(),
        };
        url.trim_end_matches('/').to_string()
    }

    pub fn is_enabled(&self) -> bool {
        self.provider != LlmProvider::Disabled
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = match resolve_config_path(options.config_path.as_deref()) {
            Some(path) => read_file(&path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        let database = &mut self.database;
        env_override(&mut database.url, &["NAVIGATOR_DATABASE_URL"])?;
        env_override(&mut database.max_connections, &["NAVIGATOR_DATABASE_MAX_CONNECTIONS"])?;
        env_override(&mut database.timeout_secs, &["NAVIGATOR_DATABASE_TIMEOUT_SECS"])?;
        env_override(&mut database.fallback_to_memory, &["NAVIGATOR_DATABASE_FALLBACK_TO_MEMORY"])?;

        let llm = &mut self.llm;
        env_override(&mut llm.provider, &["NAVIGATOR_LLM_PROVIDER"])?;
        // OPENAI_API_KEY is honoured so an existing shell setup keeps working.
        if let Some((_, key)) = first_env(&["NAVIGATOR_LLM_API_KEY", "OPENAI_API_KEY"]) {
            llm.api_key = Some(key.into());
        }
        if let Some((_, url)) = first_env(&["NAVIGATOR_LLM_BASE_URL"]) {
            llm.base_url = Some(url);
        }
        env_override(&mut llm.model, &["NAVIGATOR_LLM_MODEL"])?;
        env_override(&mut llm.timeout_secs, &["NAVIGATOR_LLM_TIMEOUT_SECS"])?;
        env_override(&mut llm.max_retries, &["NAVIGATOR_LLM_MAX_RETRIES"])?;
        env_override(&mut llm.temperature, &["NAVIGATOR_LLM_TEMPERATURE"])?;

        let server = &mut self.server;
        env_override(&mut server.bind_address, &["NAVIGATOR_SERVER_BIND_ADDRESS"])?;
        env_override(&mut server.port, &["NAVIGATOR_SERVER_PORT", "PORT"])?;
        if let Some((_, dir)) = first_env(&["NAVIGATOR_SERVER_STATIC_DIR"]) {
            server.static_dir = Some(PathBuf::from(dir));
        }
        env_override(
            &mut server.graceful_shutdown_secs,
            &["NAVIGATOR_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        )?;

        env_override(&mut self.logging.level, &["NAVIGATOR_LOG_LEVEL"])?;
        env_override(&mut self.logging.format, &["NAVIGATOR_LOG_FORMAT"])?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    ["navigator.toml", "config/navigator.toml"].into_iter().map(PathBuf::from).find(|p| p.exists())
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw).map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn secret_from_text<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

/// First of `keys` that is set to a non-blank value, with the key that supplied it.
fn first_env(keys: &[&str]) -> Option<(String, String)> {
    keys.iter().find_map(|key| {
        env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (key.to_string(), value))
    })
}

fn env_override<T: FromStr>(target: &mut T, keys: &[&str]) -> Result<(), ConfigError> {
    let Some((key, value)) = first_env(keys) else {
        return Ok(());
    };
    *target = value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride { key, value })?;
    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation(message.to_string())
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    if !(url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:") {
        return Err(invalid(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)",
        ));
    }
    if database.max_connections == 0 {
        return Err(invalid("database.max_connections must be greater than zero"));
    }
    if !(1..=300).contains(&database.timeout_secs) {
        return Err(invalid("database.timeout_secs must be in range 1..=300"));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if !(1..=300).contains(&llm.timeout_secs) {
        return Err(invalid("llm.timeout_secs must be in range 1..=300"));
    }
    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(invalid("llm.temperature must be in range 0.0..=2.0"));
    }

    let has_key = llm.api_key.as_ref().is_some_and(|key| !key.expose_secret().trim().is_empty());
    match llm.provider {
        LlmProvider::OpenAi if !has_key => {
            return Err(invalid(
                "llm.api_key is required for the openai provider (set NAVIGATOR_LLM_API_KEY or OPENAI_API_KEY)",
            ));
        }
        LlmProvider::Ollama if llm.model.trim().is_empty() => {
            return Err(invalid("llm.model is required for the ollama provider"));
        }
        _ => {}
    }

    let base_url_ok = llm
        .base_url
        .as_deref()
        .map_or(true, |url| url.starts_with("http://") || url.starts_with("https://"));
    if !base_url_ok {
        return Err(invalid("llm.base_url must start with http:// or https://"));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(invalid("server.port must be greater than zero"));
    }
    if server.graceful_shutdown_secs == 0 {
        return Err(invalid("server.graceful_shutdown_secs must be greater than zero"));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    match logging.level.trim().to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(invalid("logging.level must be one of trace|debug|info|warn|error")),
    }
}
