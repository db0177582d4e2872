use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shopbot_agent::ResponseResolver;
use shopbot_core::catalog::CatalogSource;
use shopbot_core::domain::conversation::{Message, Role};
use shopbot_core::errors::ApplicationError;
use tracing::{info, warn};

const MAX_MESSAGE_CHARS: usize = 2_000;

#[derive(Clone)]
pub struct ChatbotState {
    resolver: Arc<ResponseResolver>,
    catalog: Arc<dyn CatalogSource>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatbotRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<Message>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatbotReply {
    pub reply: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatbotError {
    pub error: String,
}

type ChatbotResult = Result<Json<ChatbotReply>, (StatusCode, Json<ChatbotError>)>;

pub fn router(resolver: Arc<ResponseResolver>, catalog: Arc<dyn CatalogSource>) -> Router {
    Router::new()
        .route("/shop/chatbot", post(chatbot))
        .with_state(ChatbotState { resolver, catalog })
}

pub async fn chatbot(
    State(state): State<ChatbotState>,
    payload: Result<Json<ChatbotRequest>, JsonRejection>,
) -> ChatbotResult {
    let correlation_id = format!("chat-{}", Utc::now().timestamp_millis());

    let Json(request) = payload.map_err(|rejection| {
        reject(ApplicationError::InvalidRequest(rejection.body_text()), &correlation_id)
    })?;

    let actual = request.message.chars().count();
    if actual > MAX_MESSAGE_CHARS {
        return Err(reject(
            ApplicationError::MessageTooLong { actual, max: MAX_MESSAGE_CHARS },
            &correlation_id,
        ));
    }

    let history = prior_history(&request.message, &request.history);
    let catalog = state.catalog.products();
    info!(
        event_name = "chatbot.request.received",
        correlation_id = %correlation_id,
        history_len = history.len(),
        catalog_size = catalog.len(),
        "chatbot request received"
    );

    let reply = state.resolver.resolve(&request.message, history, &catalog).await;
    Ok(Json(ChatbotReply { reply }))
}

/// The storefront script appends the outgoing message to the history before posting,
/// so a trailing user entry identical to `message` is the current turn, not history.
fn prior_history<'a>(message: &str, history: &'a [Message]) -> &'a [Message] {
    match history.split_last() {
        Some((last, earlier)) if last.role == Role::User && last.content == message => earlier,
        _ => history,
    }
}

fn reject(error: ApplicationError, correlation_id: &str) -> (StatusCode, Json<ChatbotError>) {
    let interface = error.into_interface(correlation_id);
    warn!(
        event_name = "chatbot.request.rejected",
        correlation_id = %correlation_id,
        error = %interface,
        "chatbot request rejected"
    );

    let status =
        StatusCode::from_u16(interface.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ChatbotError { error: interface.user_message() }))
}
