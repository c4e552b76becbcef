use std::time::Duration;

use crate::{
    constants::{
        KEY_ANON_COUNT, KEY_ANON_PREFIX, KEY_NICKNAME_PREFIX, KEY_WINS_PREFIX, NICKNAME_MAX_LEN,
        UNLOCK_WINS, WALLET_ADDRESS_BYTES,
    },
    db::Database,
    error::{AppError, Result},
    models::{Identity, WalletKind},
};

/// Outcome of crediting a win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinRecord {
    pub identity: Identity,
    /// True only on the win that first reaches the unlock threshold.
    pub unlocked_now: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicknameOutcome {
    pub identity: Identity,
    pub nickname: String,
    /// False when the submitted nickname was invalid and the default
    /// `User<n>` was substituted.
    pub accepted: bool,
}

/// Simulated wallet handshake: waits `delay`, then hands back a freshly
/// fabricated address. Nothing about the wallet is remembered.
pub async fn wallet_handshake(kind: WalletKind, delay: Duration) -> String {
    tracing::debug!("Connecting {} wallet", kind);
    tokio::time::sleep(delay).await;
    fabricate_address()
}

/// Maps wallet addresses to persisted pseudonymous identities.
///
/// Everything is read back from the store on each call, including whether
/// the nickname prompt is still waiting for an answer.
pub struct IdentityManager {
    db: Database,
}

impl IdentityManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn resolve(&self, address: &str) -> Result<Option<Identity>> {
        let Some(anon_number) = self.db.get_number::<u64>(&anon_key(address)).await? else {
            return Ok(None);
        };
        let wins = self.db.get_number::<u32>(&wins_key(address)).await?.unwrap_or(0);
        let nickname = self
            .db
            .get_item(&nickname_key(address))
            .await?
            .filter(|value| !value.is_empty());

        Ok(Some(Identity {
            wallet_address: address.to_string(),
            anon_number,
            wins,
            nickname,
        }))
    }

    pub async fn require(&self, address: &str) -> Result<Identity> {
        self.resolve(address)
            .await?
            .ok_or_else(|| AppError::AuthError(format!("Wallet {address} is not connected")))
    }

    /// Returns the persisted identity, assigning the next sequence number
    /// on first sight of `address`.
    pub async fn resolve_or_create(&self, address: &str) -> Result<Identity> {
        if let Some(identity) = self.resolve(address).await? {
            return Ok(identity);
        }

        let anon_number = self.db.get_number::<u64>(KEY_ANON_COUNT).await?.unwrap_or(0);
        self.db
            .set_item(&anon_key(address), &anon_number.to_string())
            .await?;
        self.db
            .set_item(KEY_ANON_COUNT, &(anon_number + 1).to_string())
            .await?;
        tracing::debug!("Assigned anon{} to {}", anon_number, address);

        self.require(address).await
    }

    /// Credits one win. Reaching the unlock threshold for the first time
    /// opens the nickname prompt.
    pub async fn record_win(&self, address: &str) -> Result<WinRecord> {
        let mut identity = self.require(address).await?;
        let was_unlocked = identity.has_access();

        identity.wins += 1;
        self.db
            .set_item(&wins_key(address), &identity.wins.to_string())
            .await?;

        let unlocked_now = !was_unlocked && identity.has_access();
        tracing::info!(
            "{} now has {} win(s){}",
            identity.display_name(),
            identity.wins,
            if unlocked_now { ", secret chat unlocked" } else { "" }
        );

        Ok(WinRecord {
            identity,
            unlocked_now,
        })
    }

    /// Answers an open nickname prompt. Missing or blank answers take the
    /// default silently; invalid ones take the default and are reported.
    pub async fn submit_nickname(
        &self,
        address: &str,
        answer: Option<&str>,
    ) -> Result<NicknameOutcome> {
        let identity = self.require(address).await?;
        if identity.nickname.is_some() {
            return Err(AppError::BadRequest("Nickname is already set".to_string()));
        }
        if !identity.nickname_pending() {
            return Err(AppError::BadRequest(format!(
                "Nickname unlocks after {UNLOCK_WINS} wins"
            )));
        }

        let (nickname, accepted) = match answer.filter(|value| !value.is_empty()) {
            None => (identity.default_nickname(), true),
            Some(raw) if is_valid_nickname(raw) => (raw.to_string(), true),
            Some(raw) => {
                tracing::debug!("Rejected nickname {:?} for {}", raw, address);
                (identity.default_nickname(), false)
            }
        };

        self.db.set_item(&nickname_key(address), &nickname).await?;

        Ok(NicknameOutcome {
            identity: Identity {
                nickname: Some(nickname.clone()),
                ..identity
            },
            nickname,
            accepted,
        })
    }
}

/// At most eight ASCII letters or digits.
pub fn is_valid_nickname(value: &str) -> bool {
    !value.is_empty()
        && value.chars().count() <= NICKNAME_MAX_LEN
        && value.chars().all(|c| c.is_ascii_alphanumeric())
}

fn fabricate_address() -> String {
    format!(
        "0x{}",
        hex::encode(rand::random::<[u8; WALLET_ADDRESS_BYTES]>())
    )
}

fn anon_key(address: &str) -> String {
    format!("{KEY_ANON_PREFIX}{address}")
}

fn wins_key(address: &str) -> String {
    format!("{KEY_WINS_PREFIX}{address}")
}

fn nickname_key(address: &str) -> String {
    format!("{KEY_NICKNAME_PREFIX}{address}")
}
