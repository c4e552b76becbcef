use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    models::{ApiResponse, IdentityResponse, Message, WalletKind},
    services::identity_manager::wallet_handshake,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectWalletRequest {
    pub wallet_type: WalletKind,
}

#[derive(Debug, Serialize)]
pub struct ConnectWalletResponse {
    pub identity: IdentityResponse,
    pub messages: Vec<Message>,
}

/// POST /api/v1/wallet/connect
///
/// Every call yields a brand-new fabricated address, so each connect is a
/// new "account" unless the caller keeps reusing the returned address.
pub async fn connect_wallet(
    State(state): State<AppState>,
    Json(req): Json<ConnectWalletRequest>,
) -> Result<Json<ApiResponse<ConnectWalletResponse>>> {
    // The simulated delay runs outside the lobby lock.
    let address = wallet_handshake(req.wallet_type, state.config.connect_delay()).await;

    let lobby = state.lobby.lock().await;
    let identity = lobby.connect(&address).await?;

    Ok(Json(ApiResponse::success(ConnectWalletResponse {
        identity: IdentityResponse::new(&identity),
        messages: lobby.messages().to_vec(),
    })))
}
