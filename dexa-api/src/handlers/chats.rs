use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use dexa_core::completion::{ChatTurn, CompletionRequest};
use dexa_core::domain::{Chat, ChatId, DatasetId, Message, MessageRole};
use dexa_core::profile::DatasetProfile;
use dexa_core::prompt::{chat_prompt, CHAT_SYSTEM_PROMPT};
use std::time::Instant;
use uuid::Uuid;
use validator::Validate;

use super::{owned_chat, owned_dataset};
use crate::{
    dto::*,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    middleware::AuthUser,
    observability::metrics::DexaMetrics,
    AppState,
};

pub const ASSISTANT_ERROR_REPLY: &str = "Sorry, there was an error getting a response from the AI assistant.";
pub const ASSISTANT_EMPTY_REPLY: &str = "No response from AI assistant.";

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(dataset_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Chat>)> {
    // The body is optional; an empty one means an untitled chat.
    let payload: CreateChatRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateChatRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON data: {}", e)))?
    };
    payload.validate()?;

    let dataset = owned_dataset(&state, DatasetId(dataset_id), &user).await?;
    let title = payload.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

    let chat = state
        .chats
        .create_chat(&Chat::new(dataset.id, user.user_id, title))
        .await?;

    tracing::info!(chat_id = %chat.id, dataset_id = %dataset.id, "Chat created");
    Ok((StatusCode::CREATED, Json(chat)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(dataset_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Chat>>> {
    let dataset = owned_dataset(&state, DatasetId(dataset_id), &user).await?;
    let chats = state.chats.list_chats(&dataset.id, &user.user_id).await?;
    Ok(Json(chats))
}

pub async fn rename(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<RenameChatRequest>,
) -> ApiResult<Json<Chat>> {
    let chat = owned_chat(&state, ChatId(id), &user).await?;

    let title = payload.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    let chat = state.chats.rename_chat(&chat.id, title).await?;
    Ok(Json(chat))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let chat = owned_chat(&state, ChatId(id), &user).await?;
    state.chats.delete_chat(&chat.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Message>>> {
    let chat = owned_chat(&state, ChatId(id), &user).await?;
    let messages = state.chats.list_messages(&chat.id).await?;
    Ok(Json(messages))
}

/// Stores the user's message, asks the model with recent history and the
/// dataset profile, then stores the reply. A failed completion still
/// produces an assistant message carrying a placeholder.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<SendMessageResponse>)> {
    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::Validation("content must not be blank".to_string()));
    }

    let chat = owned_chat(&state, ChatId(id), &user).await?;
    let dataset = owned_dataset(&state, chat.dataset_id, &user).await?;

    let history = state.chats.list_messages(&chat.id).await?;

    let user_message = state
        .chats
        .append_message(Message::new(chat.id, user.user_id, MessageRole::User, content.clone()))
        .await?;
    DexaMetrics::message_stored(MessageRole::User.as_str());

    let window = state.settings.chat.history_window;
    let recent = &history[history.len().saturating_sub(window)..];

    let profile = DatasetProfile::from_dataset(&dataset).render();
    let mut turns = Vec::with_capacity(recent.len() + 2);
    turns.push(ChatTurn::system(CHAT_SYSTEM_PROMPT));
    turns.extend(recent.iter().map(ChatTurn::from));
    turns.push(ChatTurn::user(chat_prompt(&content, &profile)));

    let request = CompletionRequest::new(turns)
        .with_temperature(state.settings.llm.temperature)
        .with_max_tokens(state.settings.llm.max_tokens);

    let started = Instant::now();
    let reply = match state.llm.complete(request).await {
        Ok(completion) => {
            DexaMetrics::llm_request("success", started.elapsed());
            if completion.text.trim().is_empty() {
                ASSISTANT_EMPTY_REPLY.to_string()
            } else {
                completion.text
            }
        }
        Err(err) => {
            DexaMetrics::llm_request("error", started.elapsed());
            tracing::error!(chat_id = %chat.id, error = %err, "Chat completion failed");
            ASSISTANT_ERROR_REPLY.to_string()
        }
    };

    let assistant_message = state
        .chats
        .append_message(Message::new(chat.id, user.user_id, MessageRole::Assistant, reply))
        .await?;
    DexaMetrics::message_stored(MessageRole::Assistant.as_str());

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            user_message,
            assistant_message,
        }),
    ))
}
