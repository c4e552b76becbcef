// All service modules
pub mod game_coordinator;
pub mod identity_manager;
pub mod lobby;
pub mod match_engine;
pub mod message_store;
pub mod notification_service;

// Re-export for convenience
pub use game_coordinator::Match;
pub use lobby::{Lobby, SharedLobby};
pub use notification_service::NotificationService;

use crate::config::Config;

/// Start all background services
pub async fn start_background_services(lobby: SharedLobby, config: Config) {
    tracing::info!("Starting background services...");

    let interval = config.expiry_sweep_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let expired = lobby.lock().await.sweep_expired();
            if expired > 0 {
                tracing::info!("Expired {} game request(s)", expired);
            }
        }
    });
}
