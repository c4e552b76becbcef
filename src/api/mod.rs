// src/api/mod.rs

pub mod chat;
pub mod game;
pub mod health;
pub mod profile;
pub mod wallet;

use axum::http::HeaderMap;

use crate::{
    config::Config,
    constants::WALLET_HEADER,
    db::Database,
    error::{AppError, Result},
    models::Identity,
    services::{NotificationService, SharedLobby},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub lobby: SharedLobby,
    pub notifications: NotificationService,
    pub config: Config,
}

/// Reads the caller's wallet address from the `x-wallet-address` header.
pub fn wallet_address(headers: &HeaderMap) -> Result<String> {
    let raw = headers
        .get(WALLET_HEADER)
        .ok_or_else(|| AppError::AuthError("Missing x-wallet-address header".to_string()))?;
    let address = raw
        .to_str()
        .map_err(|_| AppError::AuthError("Invalid x-wallet-address header".to_string()))?
        .trim()
        .to_ascii_lowercase();
    if address.is_empty() {
        return Err(AppError::AuthError("Empty wallet address".to_string()));
    }
    Ok(address)
}

/// Resolves the caller to a connected identity. There is no proof of
/// ownership; knowing the address is enough.
pub async fn require_identity(headers: &HeaderMap, state: &AppState) -> Result<Identity> {
    let address = wallet_address(headers)?;
    state.lobby.lock().await.identity(&address).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn wallet_address_is_normalized() {
        let mut headers = HeaderMap::new();
        headers.insert(WALLET_HEADER, HeaderValue::from_static(" 0xABC "));
        assert_eq!(wallet_address(&headers).unwrap(), "0xabc");
    }

    #[test]
    fn missing_wallet_header_is_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            wallet_address(&headers),
            Err(AppError::AuthError(_))
        ));
    }
}
