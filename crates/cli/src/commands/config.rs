use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use shopbot_core::config::{AppConfig, LoadOptions, CREDENTIAL_ENV_VARS};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, doc.as_ref(), config_file_path.as_deref())
    };

    let chatbot = &config.chatbot;
    let api_key = redact_key(chatbot.api_key.as_ref().map(|key| key.expose_secret()));
    let templates_path = chatbot
        .templates_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<built-in>".to_string());

    let entries = [
        ("chatbot.endpoint", chatbot.endpoint.clone(), source("chatbot.endpoint", &["SHOPBOT_CHATBOT_ENDPOINT"])),
        ("chatbot.api_key", api_key, source("chatbot.api_key", &CREDENTIAL_ENV_VARS)),
        (
            "chatbot.timeout_secs",
            chatbot.timeout_secs.to_string(),
            source("chatbot.timeout_secs", &["SHOPBOT_CHATBOT_TIMEOUT_SECS"]),
        ),
        (
            "chatbot.history_window",
            chatbot.history_window.to_string(),
            source("chatbot.history_window", &["SHOPBOT_CHATBOT_HISTORY_WINDOW"]),
        ),
        (
            "chatbot.max_length",
            chatbot.max_length.to_string(),
            source("chatbot.max_length", &["SHOPBOT_CHATBOT_MAX_LENGTH"]),
        ),
        (
            "chatbot.temperature",
            chatbot.temperature.to_string(),
            source("chatbot.temperature", &["SHOPBOT_CHATBOT_TEMPERATURE"]),
        ),
        (
            "chatbot.payload_format",
            format!("{:?}", chatbot.payload_format),
            source("chatbot.payload_format", &["SHOPBOT_CHATBOT_PAYLOAD_FORMAT"]),
        ),
        (
            "chatbot.topic_gate",
            chatbot.topic_gate.to_string(),
            source("chatbot.topic_gate", &["SHOPBOT_CHATBOT_TOPIC_GATE"]),
        ),
        (
            "chatbot.topic_keywords",
            format!("{} keywords", chatbot.topic_keywords.len()),
            source("chatbot.topic_keywords", &["SHOPBOT_CHATBOT_TOPIC_KEYWORDS"]),
        ),
        (
            "chatbot.listing_limit",
            chatbot.listing_limit.to_string(),
            source("chatbot.listing_limit", &["SHOPBOT_CHATBOT_LISTING_LIMIT"]),
        ),
        (
            "chatbot.templates_path",
            templates_path,
            source("chatbot.templates_path", &["SHOPBOT_CHATBOT_TEMPLATES_PATH"]),
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            source("server.bind_address", &["SHOPBOT_SERVER_BIND_ADDRESS"]),
        ),
        ("server.port", config.server.port.to_string(), source("server.port", &["SHOPBOT_SERVER_PORT"])),
        (
            "logging.level",
            config.logging.level.clone(),
            source("logging.level", &["SHOPBOT_LOGGING_LEVEL", "SHOPBOT_LOG_LEVEL"]),
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            source("logging.format", &["SHOPBOT_LOGGING_FORMAT", "SHOPBOT_LOG_FORMAT"]),
        ),
        ("catalog", format!("{} products", config.catalog.len()), source("catalog", &[])),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(entries.into_iter().map(|(key, value, source)| render_line(key, &value, source)));
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("shopbot.toml"), PathBuf::from("config/shopbot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
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

fn redact_key(key: Option<&str>) -> String {
    match key.map(str::trim) {
        None => "<unset> (simulated replies)".to_string(),
        Some(key) if key.is_empty() => "<unset> (simulated replies)".to_string(),
        Some(key) if key.starts_with("hf_") => "hf_***".to_string(),
        Some(_) => "<redacted>".to_string(),
    }
}
