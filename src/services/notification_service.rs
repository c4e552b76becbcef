use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::constants::NOTIFICATION_CHANNEL_CAPACITY;

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub notif_type: String,
    /// `None` reaches every connected client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_for(&self, address: &str) -> bool {
        self.recipient.as_deref().map_or(true, |recipient| recipient == address)
    }
}

/// Fan-out of prompts, alerts and chat updates to connected clients.
#[derive(Clone)]
pub struct NotificationService {
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationService {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn send_notification(
        &self,
        user_address: &str,
        notif_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) {
        let notification = Notification {
            notif_type: notif_type.to_string(),
            recipient: Some(user_address.to_string()),
            title: title.into(),
            message: message.into(),
            data,
            created_at: Utc::now(),
        };
        tracing::debug!(
            "Notification to {}: {} - {}",
            user_address,
            notification.title,
            notification.message
        );
        self.publish(notification);
    }

    pub fn broadcast(
        &self,
        notif_type: NotificationType,
        title: impl Into<String>,
        data: Option<serde_json::Value>,
    ) {
        self.publish(Notification {
            notif_type: notif_type.to_string(),
            recipient: None,
            title: title.into(),
            message: String::new(),
            data,
            created_at: Utc::now(),
        });
    }

    fn publish(&self, notification: Notification) {
        // No subscribers is fine; nobody is looking.
        let _ = self.sender.send(notification);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    NicknamePrompt,
    Welcome,
    InvalidNickname,
    GameWon,
    GameLost,
    GameDraw,
    DuplicateRequest,
    RequestOpened,
    RequestExpired,
    MatchStarted,
    MatchUpdated,
    MatchClosed,
    ChatMessage,
    ChatReaction,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NicknamePrompt => "identity.nickname_prompt",
            Self::Welcome => "identity.welcome",
            Self::InvalidNickname => "identity.invalid_nickname",
            Self::GameWon => "game.won",
            Self::GameLost => "game.lost",
            Self::GameDraw => "game.draw",
            Self::DuplicateRequest => "game.duplicate_request",
            Self::RequestOpened => "game.request_opened",
            Self::RequestExpired => "game.request_expired",
            Self::MatchStarted => "game.match_started",
            Self::MatchUpdated => "game.match_updated",
            Self::MatchClosed => "game.match_closed",
            Self::ChatMessage => "chat.message",
            Self::ChatReaction => "chat.reaction",
        };
        f.write_str(label)
    }
}
