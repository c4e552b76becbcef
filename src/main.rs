use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod db;
mod error;
mod models;
mod services;
mod websocket;

use config::Config;
use constants::API_VERSION;
use db::Database;
use services::{Lobby, NotificationService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zion_messenger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Zion Messenger");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);

    // Initialize local storage
    let db = Database::new(&config).await?;

    tracing::info!("Running database migrations...");
    db.run_migrations().await?;

    let notifications = NotificationService::new();
    let lobby = Lobby::new(db.clone(), &config, notifications.clone())
        .await?
        .shared();

    let app_state = api::AppState {
        db: db.clone(),
        lobby: lobby.clone(),
        notifications,
        config: config.clone(),
    };

    let app = build_router(app_state);

    // Start background services
    tokio::spawn(services::start_background_services(lobby, config.clone()));

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Wallet & identity
        .route("/api/v1/wallet/connect", post(api::wallet::connect_wallet))
        .route("/api/v1/identity/me", get(api::profile::get_identity))
        .route("/api/v1/identity/nickname", post(api::profile::set_nickname))
        // Public chat
        .route("/api/v1/chat/messages", get(api::chat::list_messages))
        .route("/api/v1/chat/emoji", post(api::chat::post_emoji))
        .route("/api/v1/chat/text", post(api::chat::post_text))
        .route(
            "/api/v1/chat/messages/{id}/reactions",
            post(api::chat::toggle_reaction),
        )
        // Tic-tac-toe
        .route(
            "/api/v1/game/requests",
            get(api::game::list_requests).post(api::game::create_request),
        )
        .route(
            "/api/v1/game/requests/{id}/accept",
            post(api::game::accept_request),
        )
        .route("/api/v1/game/match", get(api::game::get_match))
        .route("/api/v1/game/match/place", post(api::game::place_mark))
        .route("/api/v1/game/match/close", post(api::game::close_match))
        // WebSocket endpoints
        .route("/ws/events", get(websocket::notifications::handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
