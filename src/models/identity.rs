use serde::{Deserialize, Serialize};

use crate::constants::{ANON_NAME_PREFIX, DEFAULT_NICKNAME_PREFIX, UNLOCK_WINS};

// ==================== IDENTITY ====================
/// Pseudonymous identity bound to a (fabricated) wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub wallet_address: String,
    pub anon_number: u64,
    pub wins: u32,
    pub nickname: Option<String>,
}

impl Identity {
    pub fn has_access(&self) -> bool {
        self.wins >= UNLOCK_WINS
    }

    pub fn anon_name(&self) -> String {
        format!("{}{}", ANON_NAME_PREFIX, self.anon_number)
    }

    /// Nickname once unlocked and chosen, `anon<n>` otherwise.
    pub fn display_name(&self) -> String {
        match self.nickname.as_deref() {
            Some(nickname) if self.has_access() => nickname.to_string(),
            _ => self.anon_name(),
        }
    }

    /// Unlocked but no nickname stored yet.
    pub fn nickname_pending(&self) -> bool {
        self.has_access() && self.nickname.is_none()
    }

    pub fn default_nickname(&self) -> String {
        format!("{}{}", DEFAULT_NICKNAME_PREFIX, self.anon_number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    ArgentX,
    Braavos,
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletKind::ArgentX => write!(f, "ArgentX"),
            WalletKind::Braavos => write!(f, "Braavos"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub address: String,
    pub anon_number: u64,
    pub wins: u32,
    pub wins_to_unlock: u32,
    pub has_access: bool,
    pub nickname: Option<String>,
    pub display_name: String,
    pub nickname_prompt_open: bool,
}

impl IdentityResponse {
    pub fn new(identity: &Identity) -> Self {
        Self {
            address: identity.wallet_address.clone(),
            anon_number: identity.anon_number,
            wins: identity.wins,
            wins_to_unlock: UNLOCK_WINS.saturating_sub(identity.wins),
            has_access: identity.has_access(),
            nickname: identity.nickname.clone(),
            display_name: identity.display_name(),
            nickname_prompt_open: identity.nickname_pending(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(wins: u32, nickname: Option<&str>) -> Identity {
        Identity {
            wallet_address: "0xabc".to_string(),
            anon_number: 7,
            wins,
            nickname: nickname.map(str::to_string),
        }
    }

    #[test]
    fn locked_identity_shows_anon_name_even_with_nickname() {
        assert_eq!(identity(2, Some("neo")).display_name(), "anon7");
        assert_eq!(identity(0, None).display_name(), "anon7");
    }

    #[test]
    fn unlocked_identity_shows_nickname() {
        assert_eq!(identity(3, Some("neo")).display_name(), "neo");
        assert_eq!(identity(5, None).display_name(), "anon7");
    }

    #[test]
    fn default_nickname_uses_sequence_number() {
        assert_eq!(identity(3, None).default_nickname(), "User7");
    }

    #[test]
    fn wallet_kind_parses_lowercase() {
        let kind: WalletKind = serde_json::from_str("\"argentx\"").unwrap();
        assert_eq!(kind, WalletKind::ArgentX);
        let kind: WalletKind = serde_json::from_str("\"braavos\"").unwrap();
        assert_eq!(kind, WalletKind::Braavos);
    }

    #[test]
    fn response_reports_remaining_wins() {
        let response = IdentityResponse::new(&identity(1, None));
        assert_eq!(response.wins_to_unlock, 2);
        assert!(!response.has_access);
        let response = IdentityResponse::new(&identity(4, Some("neo")));
        assert_eq!(response.wins_to_unlock, 0);
        assert_eq!(response.display_name, "neo");
        assert!(!response.nickname_prompt_open);
        assert!(IdentityResponse::new(&identity(3, None)).nickname_prompt_open);
    }
}
