use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::Product;

/// Environment variables recognised for the inference credential, in lookup order.
pub const CREDENTIAL_ENV_VARS: [&str; 2] = ["HF_API_KEY", "HUGGINGFACE_API_KEY"];

pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/microsoft/DialoGPT-small";

pub const DEFAULT_TOPIC_KEYWORDS: &[&str] = &[
    "produkt", "prece", "preces", "preci", "kādi", "sortiment", "piedāvā", "cena", "cenu",
    "cenas", "maksā", "izmaks", "pirk", "pasūt", "piegād", "veikal", "grozs", "grozā", "atlaid",
    "apmaks", "palīdz", "atbalst", "paldies", "sveiki", "labdien",
];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub chatbot: ChatbotConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub catalog: Vec<Product>,
}

#[derive(Clone, Debug)]
pub struct ChatbotConfig {
    pub endpoint: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
    pub history_window: usize,
    pub max_length: u32,
    pub temperature: f64,
    pub payload_format: PayloadFormat,
    pub topic_gate: bool,
    pub topic_keywords: Vec<String>,
    pub listing_limit: usize,
    pub templates_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Shape of the `inputs` member in the outbound inference body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// `{"inputs": {"text": "<prompt>"}}`
    Nested,
    /// `{"inputs": "<prompt>"}`
    Plain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub chatbot_endpoint: Option<String>,
    pub chatbot_api_key: Option<String>,
    pub chatbot_timeout_secs: Option<u64>,
    pub chatbot_history_window: Option<usize>,
    pub chatbot_topic_gate: Option<bool>,
    pub chatbot_templates_path: Option<PathBuf>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 30,
            history_window: 3,
            max_length: 100,
            temperature: 0.7,
            payload_format: PayloadFormat::Nested,
            topic_gate: true,
            topic_keywords: DEFAULT_TOPIC_KEYWORDS.iter().map(|keyword| keyword.to_string()).collect(),
            listing_limit: 3,
            templates_path: None,
        }
    }
}

impl ChatbotConfig {
    /// True when a non-blank credential is configured and remote inference may be attempted.
    pub fn has_credential(&self) -> bool {
        self.api_key.as_ref().is_some_and(|key| !key.expose_secret().trim().is_empty())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chatbot: ChatbotConfig::default(),
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            catalog: Vec::new(),
        }
    }
}

fn secret_value(value: String) -> Option<SecretString> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.into())
    }
}

impl std::str::FromStr for PayloadFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nested" => Ok(Self::Nested),
            "plain" => Ok(Self::Plain),
            other => Err(ConfigError::Validation(format!(
                "unsupported payload format `{other}` (expected nested|plain)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("shopbot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(chatbot) = patch.chatbot {
            if let Some(endpoint) = chatbot.endpoint {
                self.chatbot.endpoint = endpoint;
            }
            if let Some(api_key_value) = chatbot.api_key {
                self.chatbot.api_key = secret_value(api_key_value);
            }
            if let Some(timeout_secs) = chatbot.timeout_secs {
                self.chatbot.timeout_secs = timeout_secs;
            }
            if let Some(history_window) = chatbot.history_window {
                self.chatbot.history_window = history_window;
            }
            if let Some(max_length) = chatbot.max_length {
                self.chatbot.max_length = max_length;
            }
            if let Some(temperature) = chatbot.temperature {
                self.chatbot.temperature = temperature;
            }
            if let Some(payload_format) = chatbot.payload_format {
                self.chatbot.payload_format = payload_format;
            }
            if let Some(topic_gate) = chatbot.topic_gate {
                self.chatbot.topic_gate = topic_gate;
            }
            if let Some(topic_keywords) = chatbot.topic_keywords {
                self.chatbot.topic_keywords = topic_keywords;
            }
            if let Some(listing_limit) = chatbot.listing_limit {
                self.chatbot.listing_limit = listing_limit;
            }
            if let Some(templates_path) = chatbot.templates_path {
                self.chatbot.templates_path = Some(templates_path);
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(catalog) = patch.catalog {
            self.catalog = catalog;
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SHOPBOT_CHATBOT_ENDPOINT") {
            self.chatbot.endpoint = value;
        }
        if let Some(value) = CREDENTIAL_ENV_VARS.iter().find_map(|key| read_env(key)) {
            self.chatbot.api_key = secret_value(value);
        }
        if let Some(value) = read_env("SHOPBOT_CHATBOT_TIMEOUT_SECS") {
            self.chatbot.timeout_secs = parse_u64("SHOPBOT_CHATBOT_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SHOPBOT_CHATBOT_HISTORY_WINDOW") {
            self.chatbot.history_window = parse_usize("SHOPBOT_CHATBOT_HISTORY_WINDOW", &value)?;
        }
        if let Some(value) = read_env("SHOPBOT_CHATBOT_MAX_LENGTH") {
            self.chatbot.max_length = parse_u32("SHOPBOT_CHATBOT_MAX_LENGTH", &value)?;
        }
        if let Some(value) = read_env("SHOPBOT_CHATBOT_TEMPERATURE") {
            self.chatbot.temperature = parse_f64("SHOPBOT_CHATBOT_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("SHOPBOT_CHATBOT_PAYLOAD_FORMAT") {
            self.chatbot.payload_format = value.parse()?;
        }
        if let Some(value) = read_env("SHOPBOT_CHATBOT_TOPIC_GATE") {
            self.chatbot.topic_gate = parse_bool("SHOPBOT_CHATBOT_TOPIC_GATE", &value)?;
        }
        if let Some(value) = read_env("SHOPBOT_CHATBOT_TOPIC_KEYWORDS") {
            self.chatbot.topic_keywords = value
                .split(',')
                .map(str::trim)
                .filter(|keyword| !keyword.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = read_env("SHOPBOT_CHATBOT_LISTING_LIMIT") {
            self.chatbot.listing_limit = parse_usize("SHOPBOT_CHATBOT_LISTING_LIMIT", &value)?;
        }
        if let Some(value) = read_env("SHOPBOT_CHATBOT_TEMPLATES_PATH") {
            self.chatbot.templates_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("SHOPBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SHOPBOT_SERVER_PORT") {
            self.server.port = parse_u16("SHOPBOT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SHOPBOT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("SHOPBOT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("SHOPBOT_LOGGING_LEVEL").or_else(|| read_env("SHOPBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SHOPBOT_LOGGING_FORMAT").or_else(|| read_env("SHOPBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(endpoint) = overrides.chatbot_endpoint {
            self.chatbot.endpoint = endpoint;
        }
        if let Some(api_key) = overrides.chatbot_api_key {
            self.chatbot.api_key = secret_value(api_key);
        }
        if let Some(timeout_secs) = overrides.chatbot_timeout_secs {
            self.chatbot.timeout_secs = timeout_secs;
        }
        if let Some(history_window) = overrides.chatbot_history_window {
            self.chatbot.history_window = history_window;
        }
        if let Some(topic_gate) = overrides.chatbot_topic_gate {
            self.chatbot.topic_gate = topic_gate;
        }
        if let Some(templates_path) = overrides.chatbot_templates_path {
            self.chatbot.templates_path = Some(templates_path);
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_chatbot(&self.chatbot)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        validate_catalog(&self.catalog)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("shopbot.toml"), PathBuf::from("config/shopbot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_chatbot(chatbot: &ChatbotConfig) -> Result<(), ConfigError> {
    let endpoint = chatbot.endpoint.trim();
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(ConfigError::Validation(
            "chatbot.endpoint must start with http:// or https://".to_string(),
        ));
    }

    if chatbot.timeout_secs == 0 || chatbot.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "chatbot.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if chatbot.history_window == 0 || chatbot.history_window > 50 {
        return Err(ConfigError::Validation(
            "chatbot.history_window must be in range 1..=50".to_string(),
        ));
    }

    if chatbot.max_length == 0 {
        return Err(ConfigError::Validation(
            "chatbot.max_length must be greater than zero".to_string(),
        ));
    }

    if !chatbot.temperature.is_finite() || !(0.0..=2.0).contains(&chatbot.temperature) {
        return Err(ConfigError::Validation(
            "chatbot.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if chatbot.topic_gate && chatbot.topic_keywords.iter().all(|keyword| keyword.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "chatbot.topic_keywords must not be empty while chatbot.topic_gate is enabled"
                .to_string(),
        ));
    }

    if chatbot.listing_limit == 0 {
        return Err(ConfigError::Validation(
            "chatbot.listing_limit must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_catalog(catalog: &[Product]) -> Result<(), ConfigError> {
    for product in catalog {
        product
            .validate()
            .map_err(|error| ConfigError::Validation(format!("catalog: {error}")))?;
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| invalid_override(key, value))
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    chatbot: Option<ChatbotPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
    catalog: Option<Vec<Product>>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatbotPatch {
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    history_window: Option<usize>,
    max_length: Option<u32>,
    temperature: Option<f64>,
    payload_format: Option<PayloadFormat>,
    topic_gate: Option<bool>,
    topic_keywords: Option<Vec<String>>,
    listing_limit: Option<usize>,
    templates_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
