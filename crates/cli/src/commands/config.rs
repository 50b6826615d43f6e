use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use navigator_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let api_key = match &config.llm.api_key {
        Some(secret) => redact_token(secret.expose_secret()),
        None => "<unset>".to_string(),
    };
    let static_dir = config
        .server
        .static_dir
        .as_ref()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string());

    let fields: Vec<(&str, String, &str)> = vec![
        ("database.url", config.database.url.clone(), "NAVIGATOR_DATABASE_URL"),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            "NAVIGATOR_DATABASE_MAX_CONNECTIONS",
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            "NAVIGATOR_DATABASE_TIMEOUT_SECS",
        ),
        (
            "database.fallback_to_memory",
            config.database.fallback_to_memory.to_string(),
            "NAVIGATOR_DATABASE_FALLBACK_TO_MEMORY",
        ),
        ("llm.provider", config.llm.provider.as_str().to_string(), "NAVIGATOR_LLM_PROVIDER"),
        ("llm.model", config.llm.model.clone(), "NAVIGATOR_LLM_MODEL"),
        ("llm.base_url", config.llm.effective_base_url(), "NAVIGATOR_LLM_BASE_URL"),
        ("llm.api_key", api_key, "NAVIGATOR_LLM_API_KEY"),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string(), "NAVIGATOR_LLM_TIMEOUT_SECS"),
        ("llm.max_retries", config.llm.max_retries.to_string(), "NAVIGATOR_LLM_MAX_RETRIES"),
        ("llm.temperature", config.llm.temperature.to_string(), "NAVIGATOR_LLM_TEMPERATURE"),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            "NAVIGATOR_SERVER_BIND_ADDRESS",
        ),
        ("server.port", config.server.port.to_string(), "NAVIGATOR_SERVER_PORT"),
        ("server.static_dir", static_dir, "NAVIGATOR_SERVER_STATIC_DIR"),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            "NAVIGATOR_SERVER_GRACEFUL_SHUTDOWN_SECS",
        ),
        ("logging.level", config.logging.level.clone(), "NAVIGATOR_LOG_LEVEL"),
        ("logging.format", format!("{:?}", config.logging.format), "NAVIGATOR_LOG_FORMAT"),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_key) in fields {
        let source = field_source(
            key,
            Some(env_key),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    ["navigator.toml", "config/navigator.toml"].into_iter().map(PathBuf::from).find(|p| p.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
