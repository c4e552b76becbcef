use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    models::{ApiResponse, Message},
};

use super::{require_identity, wallet_address, AppState};

#[derive(Debug, Deserialize)]
pub struct PostEmojiRequest {
    pub emoji: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostTextRequest {
    pub text: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub emoji: String,
}

#[derive(Debug, Serialize)]
pub struct PostTextResponse {
    pub posted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

/// GET /api/v1/chat/messages
pub async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<Message>>>> {
    require_identity(&headers, &state).await?;
    let messages = state.lobby.lock().await.messages().to_vec();
    Ok(Json(ApiResponse::success(messages)))
}

/// POST /api/v1/chat/emoji
pub async fn post_emoji(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PostEmojiRequest>,
) -> Result<Json<ApiResponse<Message>>> {
    let address = wallet_address(&headers)?;
    let message = state
        .lobby
        .lock()
        .await
        .post_emoji(&address, &req.emoji, req.reply_to.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(message)))
}

/// POST /api/v1/chat/text
///
/// Locked identities get `posted: false`, not an error.
pub async fn post_text(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PostTextRequest>,
) -> Result<Json<ApiResponse<PostTextResponse>>> {
    let address = wallet_address(&headers)?;
    let message = state
        .lobby
        .lock()
        .await
        .post_text(&address, &req.text, req.reply_to.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(PostTextResponse {
        posted: message.is_some(),
        message,
    })))
}

/// POST /api/v1/chat/messages/{id}/reactions
pub async fn toggle_reaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(message_id): Path<String>,
    Json(req): Json<ReactionRequest>,
) -> Result<Json<ApiResponse<Message>>> {
    let address = wallet_address(&headers)?;
    let message = state
        .lobby
        .lock()
        .await
        .toggle_reaction(&address, &message_id, &req.emoji)
        .await?;
    Ok(Json(ApiResponse::success(message)))
}
