use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::{
    config::Config,
    constants::{NICKNAME_MAX_LEN, UNLOCK_WINS},
    db::Database,
    error::{AppError, Result},
    models::{GameRequest, GameRequestView, Identity, Mark, Message},
    services::{
        game_coordinator::{GameCoordinator, Match},
        identity_manager::{IdentityManager, NicknameOutcome, WinRecord},
        match_engine::MatchStatus,
        message_store::MessageStore,
        notification_service::{NotificationService, NotificationType},
    },
};

pub type SharedLobby = Arc<Mutex<Lobby>>;

/// Result of a move: the updated match (`None` when the move was ignored)
/// and, on a decisive finish, the credited win.
#[derive(Debug, Clone)]
pub struct MoveResult {
    pub game: Option<Match>,
    pub credited: Option<WinRecord>,
}

impl MoveResult {
    pub fn is_terminal(&self) -> bool {
        self.game
            .as_ref()
            .is_some_and(|game| game.status().is_terminal())
    }
}

/// Owns every piece of chat and game state. Identity gates the message
/// store and the coordinator; finished matches credit identities.
pub struct Lobby {
    identities: IdentityManager,
    messages: MessageStore,
    games: GameCoordinator,
    notifications: NotificationService,
}

impl Lobby {
    pub async fn new(
        db: Database,
        config: &Config,
        notifications: NotificationService,
    ) -> Result<Self> {
        Ok(Self {
            identities: IdentityManager::new(db.clone()),
            messages: MessageStore::load(db).await?,
            games: GameCoordinator::new(config.request_expiry_ms()),
            notifications,
        })
    }

    pub fn shared(self) -> SharedLobby {
        Arc::new(Mutex::new(self))
    }

    // ==================== IDENTITY ====================

    pub async fn connect(&self, address: &str) -> Result<Identity> {
        let identity = self.identities.resolve_or_create(address).await?;
        tracing::info!("{} connected as {}", address, identity.display_name());
        Ok(identity)
    }

    pub async fn identity(&self, address: &str) -> Result<Identity> {
        self.identities.require(address).await
    }

    pub async fn submit_nickname(
        &mut self,
        address: &str,
        answer: Option<&str>,
    ) -> Result<NicknameOutcome> {
        let outcome = self.identities.submit_nickname(address, answer).await?;
        if outcome.accepted {
            self.notifications.send_notification(
                address,
                NotificationType::Welcome,
                format!("Welcome to the Secret Chat, {}!", outcome.nickname),
                "You can now send text messages and your nickname is visible!",
                None,
            );
        } else {
            self.notifications.send_notification(
                address,
                NotificationType::InvalidNickname,
                "Invalid nickname",
                format!("Using default nickname {}.", outcome.nickname),
                None,
            );
        }
        Ok(outcome)
    }

    // ==================== CHAT ====================

    pub fn messages(&self) -> &[Message] {
        self.messages.messages()
    }

    pub async fn post_emoji(
        &mut self,
        address: &str,
        emoji: &str,
        reply_to: Option<&str>,
    ) -> Result<Message> {
        let author = self.identities.require(address).await?;
        let message = self
            .messages
            .post_emoji(&author, emoji, reply_to, now_ms())
            .await?;
        self.announce_message(&message);
        Ok(message)
    }

    pub async fn post_text(
        &mut self,
        address: &str,
        text: &str,
        reply_to: Option<&str>,
    ) -> Result<Option<Message>> {
        let author = self.identities.require(address).await?;
        let message = self
            .messages
            .post_text(&author, text, reply_to, now_ms())
            .await?;
        if let Some(message) = &message {
            self.announce_message(message);
        }
        Ok(message)
    }

    pub async fn toggle_reaction(
        &mut self,
        address: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<Message> {
        let actor = self.identities.require(address).await?.display_name();
        let message = self
            .messages
            .toggle_reaction(message_id, emoji, &actor)
            .await?;
        self.notifications.broadcast(
            NotificationType::ChatReaction,
            "Reactions updated",
            Some(json!(message)),
        );
        Ok(message)
    }

    fn announce_message(&self, message: &Message) {
        self.notifications.broadcast(
            NotificationType::ChatMessage,
            format!("New message from {}", message.sender),
            Some(json!(message)),
        );
    }

    // ==================== GAME ====================

    pub async fn request_match(&mut self, address: &str) -> Result<GameRequest> {
        let identity = self.identities.require(address).await?;
        match self.games.request_match(&identity, now_ms()) {
            Ok(request) => {
                self.notifications.broadcast(
                    NotificationType::RequestOpened,
                    format!("{} wants to play Tic-Tac-Toe!", request.challenger),
                    Some(json!(request)),
                );
                Ok(request)
            }
            Err(AppError::DuplicateRequest) => {
                self.notifications.send_notification(
                    address,
                    NotificationType::DuplicateRequest,
                    "Request pending",
                    AppError::DuplicateRequest.to_string(),
                    None,
                );
                Err(AppError::DuplicateRequest)
            }
            Err(other) => Err(other),
        }
    }

    pub async fn open_requests(&self, address: &str) -> Result<Vec<GameRequestView>> {
        self.identities.require(address).await?;
        Ok(self.games.open_requests(address, now_ms()))
    }

    pub async fn has_pending_request(&self, address: &str) -> Result<bool> {
        self.identities.require(address).await?;
        Ok(self.games.has_pending_request(address, now_ms()))
    }

    pub async fn accept_request(&mut self, address: &str, request_id: &str) -> Result<Match> {
        let acceptor = self.identities.require(address).await?;
        let game = self.games.accept_request(request_id, &acceptor, now_ms())?;

        for participant in game.participants() {
            self.notifications.send_notification(
                participant,
                NotificationType::MatchStarted,
                "Tic-Tac-Zion",
                format!("{} vs {}", game.challenger, game.opponent),
                Some(json!(game)),
            );
        }
        Ok(game)
    }

    pub async fn active_match(&self, address: &str) -> Result<Option<Match>> {
        self.identities.require(address).await?;
        Ok(self.games.active_match(address).cloned())
    }

    pub async fn place_mark(&mut self, address: &str, cell: usize) -> Result<MoveResult> {
        self.identities.require(address).await?;
        let Some(game) = self.games.place_mark(address, cell)? else {
            return Ok(MoveResult {
                game: None,
                credited: None,
            });
        };

        for participant in game.participants() {
            self.notifications.send_notification(
                participant,
                NotificationType::MatchUpdated,
                "Board updated",
                "",
                Some(json!(game)),
            );
        }

        let credited = match game.status() {
            MatchStatus::InProgress => None,
            MatchStatus::Draw => {
                for participant in game.participants() {
                    self.notifications.send_notification(
                        participant,
                        NotificationType::GameDraw,
                        "Draw!",
                        "Try again!",
                        None,
                    );
                }
                None
            }
            MatchStatus::Won(mark) => Some(self.credit_winner(&game, mark).await?),
        };

        Ok(MoveResult {
            game: Some(game),
            credited,
        })
    }

    async fn credit_winner(&mut self, game: &Match, mark: Mark) -> Result<WinRecord> {
        let winner = game.address_of(mark).to_string();
        let loser = game.address_of(mark.other()).to_string();
        let record = self.identities.record_win(&winner).await?;

        if record.unlocked_now && record.identity.nickname_pending() {
            self.notifications.send_notification(
                &winner,
                NotificationType::NicknamePrompt,
                "Congratulations! You unlocked the Secret Chat!",
                format!(
                    "Choose your nickname (max {NICKNAME_MAX_LEN} characters, letters and numbers only)"
                ),
                Some(json!({ "max_len": NICKNAME_MAX_LEN })),
            );
        } else if record.identity.wins < UNLOCK_WINS {
            self.notifications.send_notification(
                &winner,
                NotificationType::GameWon,
                "You won!",
                "Keep playing to unlock Secret Chat!",
                Some(json!({ "wins": record.identity.wins })),
            );
        } else {
            self.notifications.send_notification(
                &winner,
                NotificationType::GameWon,
                "You won!",
                "",
                Some(json!({ "wins": record.identity.wins })),
            );
        }

        self.notifications.send_notification(
            &loser,
            NotificationType::GameLost,
            "You lost this round.",
            "Try again!",
            None,
        );
        Ok(record)
    }

    pub fn close_match(&mut self, match_id: &str) -> Option<Match> {
        let game = self.games.close_match(match_id)?;
        for participant in game.participants() {
            self.notifications.send_notification(
                participant,
                NotificationType::MatchClosed,
                "Match closed",
                "",
                Some(json!({ "match_id": game.id })),
            );
        }
        Some(game)
    }

    pub async fn close_active_match(&mut self, address: &str) -> Result<Option<Match>> {
        self.identities.require(address).await?;
        let Some(match_id) = self.games.active_match(address).map(|game| game.id.clone()) else {
            return Ok(None);
        };
        Ok(self.close_match(&match_id))
    }

    /// Drops expired requests and tells their owners.
    pub fn sweep_expired(&mut self) -> usize {
        let expired = self.games.sweep_expired(now_ms());
        for request in &expired {
            self.notifications.send_notification(
                &request.challenger_address,
                NotificationType::RequestExpired,
                "Game request expired",
                "Nobody accepted in time.",
                Some(json!({ "request_id": request.id })),
            );
        }
        expired.len()
    }
}

/// Closes `match_id` after `delay`. Pending timers are never cancelled;
/// closing an already closed match is a no-op.
pub fn schedule_match_close(lobby: SharedLobby, match_id: String, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if lobby.lock().await.close_match(&match_id).is_some() {
            tracing::debug!("Auto-closed finished match {}", match_id);
        }
    });
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
