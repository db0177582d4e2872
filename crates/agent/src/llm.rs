use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use shopbot_core::config::{ChatbotConfig, PayloadFormat};
use thiserror::Error;
use tracing::{info, warn};

/// Response fields that may carry generated text, in preference order.
const TEXT_FIELDS: [&str; 2] = ["generated_text", "text"];

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference model is still loading")]
    ModelLoading,
    #[error("inference endpoint returned status {status}")]
    Status { status: u16 },
    #[error("inference request timed out")]
    Timeout,
    #[error("inference request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("inference response was malformed: {0}")]
    MalformedPayload(String),
    #[error("inference response carried no generated text")]
    MissingText,
    #[error("could not build inference http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, InferenceError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GenerationParameters {
    pub max_length: u32,
    pub temperature: f64,
}

#[derive(Debug, Serialize)]
struct InferencePayload<'a> {
    inputs: InferenceInputs<'a>,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum InferenceInputs<'a> {
    Nested { text: &'a str },
    Plain(&'a str),
}

/// Client for a hosted text-generation endpoint speaking the Hugging Face
/// inference wire format.
#[derive(Clone)]
pub struct HostedInferenceClient {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    parameters: GenerationParameters,
    payload_format: PayloadFormat,
}

impl HostedInferenceClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
        parameters: GenerationParameters,
        payload_format: PayloadFormat,
    ) -> Result<Self, InferenceError> {
        let client = Client::builder().timeout(timeout).build().map_err(InferenceError::ClientBuild)?;
        Ok(Self { client, endpoint: endpoint.into(), api_key, parameters, payload_format })
    }

    /// `None` when no credential is configured.
    pub fn from_config(config: &ChatbotConfig) -> Result<Option<Self>, InferenceError> {
        let Some(api_key) = config.api_key.clone().filter(|_| config.has_credential()) else {
            return Ok(None);
        };

        Self::new(
            config.endpoint.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
            GenerationParameters { max_length: config.max_length, temperature: config.temperature },
            config.payload_format,
        )
        .map(Some)
    }

    fn payload<'a>(&self, prompt: &'a str) -> InferencePayload<'a> {
        let inputs = match self.payload_format {
            PayloadFormat::Nested => InferenceInputs::Nested { text: prompt },
            PayloadFormat::Plain => InferenceInputs::Plain(prompt),
        };
        InferencePayload { inputs, parameters: self.parameters }
    }
}

impl std::fmt::Debug for HostedInferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedInferenceClient")
            .field("endpoint", &self.endpoint)
            .field("parameters", &self.parameters)
            .field("payload_format", &self.payload_format)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmClient for HostedInferenceClient {
    async fn complete(&self, prompt: &str) -> Result<String, InferenceError> {
        info!(
            event_name = "chatbot.inference.request_attempted",
            endpoint = %self.endpoint,
            prompt_chars = prompt.chars().count(),
            "sending inference request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.payload(prompt))
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        info!(
            event_name = "chatbot.inference.status_received",
            status = status.as_u16(),
            "inference endpoint responded"
        );

        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(InferenceError::ModelLoading);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                event_name = "chatbot.inference.error_status",
                status = status.as_u16(),
                body = %truncate(&body, 200),
                "inference endpoint returned an error status"
            );
            return Err(InferenceError::Status { status: status.as_u16() });
        }

        let payload: Value = response.json().await.map_err(|error| {
            if error.is_timeout() {
                InferenceError::Timeout
            } else {
                InferenceError::MalformedPayload(error.to_string())
            }
        })?;

        extract_generated_text(&payload).ok_or(InferenceError::MissingText)
    }
}

/// Accepts `[{"generated_text": ..}]`, `{"generated_text": ..}` and the same shapes with
/// a `text` field. Returns trimmed text, or `None` when nothing usable is present.
pub fn extract_generated_text(payload: &Value) -> Option<String> {
    let candidate = match payload {
        Value::Array(items) => items.first()?,
        Value::Object(_) => payload,
        _ => return None,
    };

    TEXT_FIELDS
        .iter()
        .filter_map(|field| candidate.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

fn classify_transport_error(error: reqwest::Error) -> InferenceError {
    if error.is_timeout() {
        InferenceError::Timeout
    } else {
        InferenceError::Transport(error)
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
