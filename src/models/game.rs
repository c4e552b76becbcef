use serde::{Deserialize, Serialize};

// ==================== GAME ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn other(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// An open challenge waiting for an opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRequest {
    pub id: String,
    pub challenger: String,
    pub created_at: i64,
    #[serde(skip)]
    pub challenger_address: String,
}

impl GameRequest {
    /// Milliseconds left before expiry, never negative.
    pub fn remaining_ms(&self, now_ms: i64, expiry_ms: i64) -> i64 {
        (expiry_ms - (now_ms - self.created_at)).max(0)
    }

    pub fn is_expired(&self, now_ms: i64, expiry_ms: i64) -> bool {
        self.remaining_ms(now_ms, expiry_ms) == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameRequestView {
    pub id: String,
    pub challenger: String,
    pub created_at: i64,
    pub expires_in_secs: i64,
    pub is_own: bool,
}

impl GameRequestView {
    pub fn new(request: &GameRequest, viewer_address: &str, now_ms: i64, expiry_ms: i64) -> Self {
        Self {
            id: request.id.clone(),
            challenger: request.challenger.clone(),
            created_at: request.created_at,
            expires_in_secs: request.remaining_ms(now_ms, expiry_ms) / 1000,
            is_own: request.challenger_address == viewer_address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPIRY_MS: i64 = 300_000;

    fn request(created_at: i64) -> GameRequest {
        GameRequest {
            id: "1".to_string(),
            challenger: "anon0".to_string(),
            created_at,
            challenger_address: "0xabc".to_string(),
        }
    }

    #[test]
    fn remaining_time_counts_down_and_clamps() {
        let req = request(1_000);
        assert_eq!(req.remaining_ms(1_000, EXPIRY_MS), 300_000);
        assert_eq!(req.remaining_ms(61_000, EXPIRY_MS), 240_000);
        assert_eq!(req.remaining_ms(301_000, EXPIRY_MS), 0);
        assert_eq!(req.remaining_ms(900_000, EXPIRY_MS), 0);
        assert!(req.is_expired(301_000, EXPIRY_MS));
        assert!(!req.is_expired(300_999, EXPIRY_MS));
    }

    #[test]
    fn view_marks_own_request_and_hides_address() {
        let req = request(0);
        let own = GameRequestView::new(&req, "0xabc", 1_500, EXPIRY_MS);
        assert!(own.is_own);
        assert_eq!(own.expires_in_secs, 298);
        assert!(!GameRequestView::new(&req, "0xdef", 0, EXPIRY_MS).is_own);

        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("challenger_address").is_none());
    }

    #[test]
    fn mark_other_alternates() {
        assert_eq!(Mark::X.other(), Mark::O);
        assert_eq!(Mark::O.other(), Mark::X);
    }
}
