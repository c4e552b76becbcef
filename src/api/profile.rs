use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    models::{ApiResponse, IdentityResponse},
};

use super::{require_identity, wallet_address, AppState};

#[derive(Debug, Deserialize)]
pub struct SetNicknameRequest {
    #[serde(default)]
    pub nickname: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetNicknameResponse {
    pub identity: IdentityResponse,
    pub accepted: bool,
    pub message: String,
}

/// GET /api/v1/identity/me
pub async fn get_identity(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<IdentityResponse>>> {
    let identity = require_identity(&headers, &state).await?;
    Ok(Json(ApiResponse::success(IdentityResponse::new(&identity))))
}

/// POST /api/v1/identity/nickname
///
/// Answers the nickname prompt opened by the unlocking win.
pub async fn set_nickname(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SetNicknameRequest>,
) -> Result<Json<ApiResponse<SetNicknameResponse>>> {
    let address = wallet_address(&headers)?;
    let answer = req.nickname.as_deref().map(str::trim);
    let outcome = state
        .lobby
        .lock()
        .await
        .submit_nickname(&address, answer)
        .await?;

    let message = if outcome.accepted {
        format!("Welcome to the Secret Chat, {}!", outcome.nickname)
    } else {
        format!("Invalid nickname. Using default {}.", outcome.nickname)
    };

    Ok(Json(ApiResponse::success(SetNicknameResponse {
        identity: IdentityResponse::new(&outcome.identity),
        accepted: outcome.accepted,
        message,
    })))
}
