use std::sync::Arc;

use async_trait::async_trait;
use shopbot_core::config::ChatbotConfig;
use shopbot_core::domain::conversation::Message;
use shopbot_core::domain::product::Product;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fallback::SimulatedResponder;
use crate::guardrails::{GuardrailDecision, TopicGate};
use crate::llm::{HostedInferenceClient, InferenceError, LlmClient};
use crate::prompt::PromptBuilder;
use crate::templates::{ReplyTemplates, TemplateError};

/// One incoming chat message together with what the shop knows about it.
#[derive(Clone, Copy, Debug)]
pub struct ChatTurn<'a> {
    pub message: &'a str,
    pub history: &'a [Message],
    pub catalog: &'a [Product],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Reply(String),
    Decline,
}

/// A step in the resolution chain. Declining hands the turn to the next stage.
#[async_trait]
pub trait ResolutionStage: Send + Sync {
    fn name(&self) -> &'static str;
    async fn attempt(&self, turn: &ChatTurn<'_>) -> StageOutcome;
}

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error(transparent)]
    Templates(#[from] TemplateError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Rejects off-topic messages with the fixed refusal before anything else runs.
pub struct TopicGateStage {
    gate: TopicGate,
    refusal: String,
}

impl TopicGateStage {
    pub fn new(gate: TopicGate, refusal: impl Into<String>) -> Self {
        Self { gate, refusal: refusal.into() }
    }
}

#[async_trait]
impl ResolutionStage for TopicGateStage {
    fn name(&self) -> &'static str {
        "topic_gate"
    }

    async fn attempt(&self, turn: &ChatTurn<'_>) -> StageOutcome {
        match self.gate.evaluate(turn.message) {
            GuardrailDecision::Allow => StageOutcome::Decline,
            GuardrailDecision::Deny { reason_code } => {
                info!(
                    event_name = "chatbot.resolve.topic_rejected",
                    reason_code, "message rejected by topic gate"
                );
                StageOutcome::Reply(self.refusal.clone())
            }
        }
    }
}

/// Asks the hosted model. A warming-up model yields the loading notice plus a
/// simulated answer; every other failure declines.
pub struct RemoteInferenceStage {
    client: Arc<dyn LlmClient>,
    prompts: PromptBuilder,
    simulator: Arc<SimulatedResponder>,
    loading_notice: String,
}

impl RemoteInferenceStage {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompts: PromptBuilder,
        simulator: Arc<SimulatedResponder>,
        loading_notice: impl Into<String>,
    ) -> Self {
        Self { client, prompts, simulator, loading_notice: loading_notice.into() }
    }
}

#[async_trait]
impl ResolutionStage for RemoteInferenceStage {
    fn name(&self) -> &'static str {
        "remote_inference"
    }

    async fn attempt(&self, turn: &ChatTurn<'_>) -> StageOutcome {
        let prompt = self.prompts.build(turn.message, turn.history, turn.catalog);

        match self.client.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => StageOutcome::Reply(text.trim().to_string()),
            Ok(_) => {
                warn!(
                    event_name = "chatbot.fallback.engaged",
                    reason = "empty_generation",
                    "remote model returned empty text"
                );
                StageOutcome::Decline
            }
            Err(InferenceError::ModelLoading) => {
                warn!(
                    event_name = "chatbot.fallback.engaged",
                    reason = "model_loading",
                    tier = "loading_notice",
                    "remote model is warming up"
                );
                let simulated = self.simulator.respond(turn.message, turn.catalog);
                StageOutcome::Reply(format!("{}\n\n{}", self.loading_notice, simulated))
            }
            Err(error) => {
                warn!(
                    event_name = "chatbot.fallback.engaged",
                    reason = %error,
                    "remote inference failed"
                );
                StageOutcome::Decline
            }
        }
    }
}

/// Turns a chat message into reply text. Total: every input produces non-empty text.
pub struct ResponseResolver {
    stages: Vec<Box<dyn ResolutionStage>>,
    simulator: Arc<SimulatedResponder>,
}

impl ResponseResolver {
    pub fn new(stages: Vec<Box<dyn ResolutionStage>>, simulator: Arc<SimulatedResponder>) -> Self {
        Self { stages, simulator }
    }

    pub fn builder(templates: ReplyTemplates) -> ResponseResolverBuilder {
        ResponseResolverBuilder::new(templates)
    }

    /// Builds the standard chain from configuration: topic gate (when enabled), remote
    /// inference (when a credential is configured), then simulated replies.
    pub fn from_config(config: &ChatbotConfig) -> Result<Self, ResolverError> {
        let templates = ReplyTemplates::load_or_default(config.templates_path.as_deref())?;
        let client = HostedInferenceClient::from_config(config)?;

        let mut builder = Self::builder(templates)
            .topic_gate(TopicGate::from_config(config))
            .history_window(config.history_window)
            .listing_limit(config.listing_limit);

        match client {
            Some(client) => builder = builder.llm_client(Arc::new(client)),
            None => info!(
                event_name = "chatbot.resolver.simulated_mode",
                "no inference credential configured; replies are simulated"
            ),
        }

        Ok(builder.build())
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn is_remote_enabled(&self) -> bool {
        self.stages.iter().any(|stage| stage.name() == "remote_inference")
    }

    pub async fn resolve(&self, message: &str, history: &[Message], catalog: &[Product]) -> String {
        let turn = ChatTurn { message, history, catalog };

        for stage in &self.stages {
            match stage.attempt(&turn).await {
                StageOutcome::Reply(text) if !text.trim().is_empty() => {
                    debug!(
                        event_name = "chatbot.resolve.replied",
                        stage = stage.name(),
                        "stage produced reply"
                    );
                    return text;
                }
                StageOutcome::Reply(_) | StageOutcome::Decline => {}
            }
        }

        let category = self.simulator.classify(message);
        info!(
            event_name = "chatbot.fallback.engaged",
            tier = "simulated",
            category = category.as_str(),
            "answering with simulated reply"
        );
        self.simulator.respond(message, catalog)
    }
}

pub struct ResponseResolverBuilder {
    templates: ReplyTemplates,
    topic_gate: Option<TopicGate>,
    llm_client: Option<Arc<dyn LlmClient>>,
    history_window: usize,
    listing_limit: usize,
}

impl ResponseResolverBuilder {
    pub fn new(templates: ReplyTemplates) -> Self {
        let defaults = ChatbotConfig::default();
        Self {
            templates,
            topic_gate: None,
            llm_client: None,
            history_window: defaults.history_window,
            listing_limit: defaults.listing_limit,
        }
    }

    pub fn topic_gate(mut self, gate: TopicGate) -> Self {
        self.topic_gate = Some(gate);
        self
    }

    pub fn llm_client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.llm_client = Some(client);
        self
    }

    pub fn history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    pub fn listing_limit(mut self, listing_limit: usize) -> Self {
        self.listing_limit = listing_limit;
        self
    }

    pub fn build(self) -> ResponseResolver {
        let gate = self.topic_gate.unwrap_or_else(|| TopicGate::new(false, Vec::<String>::new()));
        let simulator = Arc::new(SimulatedResponder::new(
            self.templates.clone(),
            gate.clone(),
            self.listing_limit,
        ));

        let mut stages: Vec<Box<dyn ResolutionStage>> = Vec::new();
        if gate.is_enabled() {
            stages.push(Box::new(TopicGateStage::new(gate, self.templates.topic_refusal.clone())));
        }
        if let Some(client) = self.llm_client {
            stages.push(Box::new(RemoteInferenceStage::new(
                client,
                PromptBuilder::new(self.templates.clone(), self.history_window),
                Arc::clone(&simulator),
                self.templates.model_loading.clone(),
            )));
        }

        ResponseResolver::new(stages, simulator)
    }
}
