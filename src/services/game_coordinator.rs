use serde::Serialize;
use std::collections::HashMap;

use crate::{
    error::{AppError, Result},
    models::{GameRequest, GameRequestView, Identity, Mark},
    services::match_engine::{Board, MatchStatus, Placement, BOARD_CELLS},
};

/// A tic-tac-toe match between a challenger (always X) and the identity
/// that accepted the challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub id: String,
    pub challenger: String,
    pub opponent: String,
    pub challenger_is_x: bool,
    pub board: Board,
    pub started_at: i64,
    #[serde(skip)]
    pub challenger_address: String,
    #[serde(skip)]
    pub opponent_address: String,
}

impl Match {
    pub fn status(&self) -> MatchStatus {
        self.board.status()
    }

    pub fn mark_of(&self, address: &str) -> Option<Mark> {
        let challenger_mark = if self.challenger_is_x { Mark::X } else { Mark::O };
        if address == self.challenger_address {
            Some(challenger_mark)
        } else if address == self.opponent_address {
            Some(challenger_mark.other())
        } else {
            None
        }
    }

    pub fn address_of(&self, mark: Mark) -> &str {
        if self.mark_of(&self.challenger_address) == Some(mark) {
            &self.challenger_address
        } else {
            &self.opponent_address
        }
    }

    pub fn participants(&self) -> [&str; 2] {
        [&self.challenger_address, &self.opponent_address]
    }
}

/// Open challenges and running matches. At most one outstanding request
/// and one active match per identity.
pub struct GameCoordinator {
    expiry_ms: i64,
    requests: Vec<GameRequest>,
    matches: HashMap<String, Match>,
    active: HashMap<String, String>,
    last_id: i64,
}

impl GameCoordinator {
    pub fn new(expiry_ms: i64) -> Self {
        Self {
            expiry_ms,
            requests: Vec::new(),
            matches: HashMap::new(),
            active: HashMap::new(),
            last_id: 0,
        }
    }

    pub fn has_pending_request(&self, address: &str, now_ms: i64) -> bool {
        self.requests.iter().any(|request| {
            request.challenger_address == address && !request.is_expired(now_ms, self.expiry_ms)
        })
    }

    pub fn request_match(&mut self, identity: &Identity, now_ms: i64) -> Result<GameRequest> {
        if self.has_pending_request(&identity.wallet_address, now_ms) {
            return Err(AppError::DuplicateRequest);
        }

        let request = GameRequest {
            id: self.next_id(now_ms),
            challenger: identity.display_name(),
            created_at: now_ms,
            challenger_address: identity.wallet_address.clone(),
        };
        self.requests.push(request.clone());
        tracing::info!("{} opened game request {}", request.challenger, request.id);
        Ok(request)
    }

    /// Live requests in creation order, as seen by `viewer_address`.
    /// Challengers already playing are left out until their match closes.
    pub fn open_requests(&self, viewer_address: &str, now_ms: i64) -> Vec<GameRequestView> {
        self.requests
            .iter()
            .filter(|request| !request.is_expired(now_ms, self.expiry_ms))
            .filter(|request| !self.active.contains_key(&request.challenger_address))
            .map(|request| GameRequestView::new(request, viewer_address, now_ms, self.expiry_ms))
            .collect()
    }

    /// Removes every expired request and returns them.
    pub fn sweep_expired(&mut self, now_ms: i64) -> Vec<GameRequest> {
        let expiry_ms = self.expiry_ms;
        let (expired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.requests)
            .into_iter()
            .partition(|request| request.is_expired(now_ms, expiry_ms));
        self.requests = live;
        for request in &expired {
            tracing::debug!("Game request {} from {} expired", request.id, request.challenger);
        }
        expired
    }

    pub fn accept_request(
        &mut self,
        request_id: &str,
        acceptor: &Identity,
        now_ms: i64,
    ) -> Result<Match> {
        let position = self
            .requests
            .iter()
            .position(|request| request.id == request_id && !request.is_expired(now_ms, self.expiry_ms))
            .ok_or_else(|| AppError::NotFound(format!("Game request {request_id} not found")))?;

        let request = &self.requests[position];
        if request.challenger_address == acceptor.wallet_address {
            return Err(AppError::SelfAccept);
        }
        if self.active.contains_key(&acceptor.wallet_address) {
            return Err(AppError::MatchInProgress(
                "Finish your current match first".to_string(),
            ));
        }
        if self.active.contains_key(&request.challenger_address) {
            return Err(AppError::MatchInProgress(format!(
                "{} is already playing",
                request.challenger
            )));
        }

        let request = self.requests.remove(position);
        // The acceptor's own challenge can no longer be taken up.
        let withdrawn = self.requests.len();
        self.requests
            .retain(|open| open.challenger_address != acceptor.wallet_address);
        if self.requests.len() < withdrawn {
            tracing::debug!("Withdrew open request from {}", acceptor.display_name());
        }

        let game = Match {
            id: self.next_id(now_ms),
            challenger: request.challenger,
            opponent: acceptor.display_name(),
            challenger_is_x: true,
            board: Board::new(),
            started_at: now_ms,
            challenger_address: request.challenger_address,
            opponent_address: acceptor.wallet_address.clone(),
        };

        for address in game.participants() {
            self.active.insert(address.to_string(), game.id.clone());
        }
        self.matches.insert(game.id.clone(), game.clone());
        tracing::info!(
            "Match {} started: {} vs {}",
            game.id,
            game.challenger,
            game.opponent
        );
        Ok(game)
    }

    pub fn active_match(&self, address: &str) -> Option<&Match> {
        self.active
            .get(address)
            .and_then(|match_id| self.matches.get(match_id))
    }

    /// Places the caller's mark. Off-turn moves, occupied cells and
    /// finished matches are ignored (`None`).
    pub fn place_mark(&mut self, address: &str, cell: usize) -> Result<Option<Match>> {
        if cell >= BOARD_CELLS {
            return Err(AppError::BadRequest(format!(
                "cell must be between 0 and {}",
                BOARD_CELLS - 1
            )));
        }
        let game = self
            .active
            .get(address)
            .and_then(|match_id| self.matches.get_mut(match_id))
            .ok_or_else(|| AppError::NotFound("No active match".to_string()))?;

        if game.mark_of(address) != Some(game.board.next_turn()) {
            return Ok(None);
        }

        match game.board.place_mark(cell) {
            Placement::Ignored => Ok(None),
            Placement::Placed { mark, status } => {
                tracing::debug!("Match {}: {} -> cell {} ({:?})", game.id, mark, cell, status);
                Ok(Some(game.clone()))
            }
        }
    }

    pub fn close_match(&mut self, match_id: &str) -> Option<Match> {
        let game = self.matches.remove(match_id)?;
        for address in game.participants() {
            if self.active.get(address).map(String::as_str) == Some(match_id) {
                self.active.remove(address);
            }
        }
        tracing::debug!("Match {} closed", match_id);
        Some(game)
    }

    fn next_id(&mut self, now_ms: i64) -> String {
        self.last_id = now_ms.max(self.last_id + 1);
        self.last_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPIRY_MS: i64 = 300_000;

    fn identity(anon_number: u64) -> Identity {
        Identity {
            wallet_address: format!("0x{anon_number:02}"),
            anon_number,
            wins: 0,
            nickname: None,
        }
    }

    fn started(coordinator: &mut GameCoordinator) -> Match {
        let request = coordinator.request_match(&identity(0), 0).unwrap();
        coordinator.accept_request(&request.id, &identity(1), 10).unwrap()
    }

    #[test]
    fn duplicate_request_keeps_single_entry() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        let me = identity(0);
        coordinator.request_match(&me, 0).unwrap();
        let again = coordinator.request_match(&me, 5);
        assert!(matches!(again, Err(AppError::DuplicateRequest)));
        assert_eq!(coordinator.open_requests(&me.wallet_address, 5).len(), 1);
    }

    #[test]
    fn expired_request_is_swept_and_frees_requester() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        let me = identity(0);
        coordinator.request_match(&me, 0).unwrap();
        assert!(coordinator.has_pending_request(&me.wallet_address, 299_999));
        assert!(coordinator.sweep_expired(299_999).is_empty());

        let expired = coordinator.sweep_expired(300_000);
        assert_eq!(expired.len(), 1);
        assert!(!coordinator.has_pending_request(&me.wallet_address, 300_000));
        assert!(coordinator.request_match(&me, 300_001).is_ok());
    }

    #[test]
    fn expired_request_cannot_be_accepted_before_sweep() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        let request = coordinator.request_match(&identity(0), 0).unwrap();
        let result = coordinator.accept_request(&request.id, &identity(1), EXPIRY_MS);
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(coordinator.open_requests("0x01", EXPIRY_MS).is_empty());
    }

    #[test]
    fn self_accept_is_rejected() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        let me = identity(0);
        let request = coordinator.request_match(&me, 0).unwrap();
        let result = coordinator.accept_request(&request.id, &me, 1);
        assert!(matches!(result, Err(AppError::SelfAccept)));
        assert_eq!(coordinator.open_requests(&me.wallet_address, 1).len(), 1);
    }

    #[test]
    fn accept_creates_match_with_challenger_as_x() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        let game = started(&mut coordinator);

        assert!(game.challenger_is_x);
        assert_eq!(game.challenger, "anon0");
        assert_eq!(game.opponent, "anon1");
        assert_eq!(game.mark_of("0x00"), Some(Mark::X));
        assert_eq!(game.mark_of("0x01"), Some(Mark::O));
        assert_eq!(game.address_of(Mark::O), "0x01");
        assert!(coordinator.open_requests("0x00", 10).is_empty());
        assert!(!coordinator.has_pending_request("0x00", 10));
        assert_eq!(coordinator.active_match("0x00").unwrap().id, game.id);
        assert_eq!(coordinator.active_match("0x01").unwrap().id, game.id);
    }

    #[test]
    fn one_active_match_per_identity() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        started(&mut coordinator);
        let request = coordinator.request_match(&identity(2), 20).unwrap();
        let result = coordinator.accept_request(&request.id, &identity(1), 21);
        assert!(matches!(result, Err(AppError::MatchInProgress(_))));

        let result = coordinator.request_match(&identity(0), 22).and_then(|request| {
            coordinator.accept_request(&request.id, &identity(3), 23)
        });
        assert!(matches!(result, Err(AppError::MatchInProgress(_))));
    }

    #[test]
    fn accepting_withdraws_acceptor_request() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        let theirs = coordinator.request_match(&identity(0), 0).unwrap();
        coordinator.request_match(&identity(1), 1).unwrap();
        assert_eq!(coordinator.open_requests("0x02", 2).len(), 2);

        coordinator.accept_request(&theirs.id, &identity(1), 3).unwrap();
        assert!(coordinator.open_requests("0x02", 4).is_empty());
        assert!(!coordinator.has_pending_request("0x01", 4));
    }

    #[test]
    fn requests_from_playing_challengers_are_hidden() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        let game = started(&mut coordinator);
        coordinator.request_match(&identity(0), 20).unwrap();
        assert!(coordinator.open_requests("0x02", 21).is_empty());

        coordinator.close_match(&game.id);
        let listed = coordinator.open_requests("0x02", 22);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].challenger, "anon0");
    }

    #[test]
    fn moves_follow_turn_order() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        started(&mut coordinator);

        // O may not open.
        assert_eq!(coordinator.place_mark("0x01", 4).unwrap(), None);
        assert!(coordinator.place_mark("0x00", 0).unwrap().is_some());
        assert_eq!(coordinator.place_mark("0x00", 1).unwrap(), None);
        assert_eq!(coordinator.place_mark("0x01", 0).unwrap(), None);
        let game = coordinator.place_mark("0x01", 4).unwrap().unwrap();
        assert_eq!(game.board.cells()[0], Some(Mark::X));
        assert_eq!(game.board.cells()[4], Some(Mark::O));
    }

    #[test]
    fn challenger_completes_top_row() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        started(&mut coordinator);
        let moves = [("0x00", 0), ("0x01", 4), ("0x00", 1), ("0x01", 5), ("0x00", 2)];
        let mut last = None;
        for (address, cell) in moves {
            last = coordinator.place_mark(address, cell).unwrap();
        }
        let game = last.unwrap();
        assert_eq!(game.status(), MatchStatus::Won(Mark::X));
        assert_eq!(game.address_of(Mark::X), "0x00");
    }

    #[test]
    fn place_mark_validates_cell_and_match() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        assert!(matches!(
            coordinator.place_mark("0x00", 0),
            Err(AppError::NotFound(_))
        ));
        started(&mut coordinator);
        assert!(matches!(
            coordinator.place_mark("0x00", 9),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn close_match_clears_active_pointers() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        let game = started(&mut coordinator);
        assert!(coordinator.close_match(&game.id).is_some());
        assert!(coordinator.active_match("0x00").is_none());
        assert!(coordinator.active_match("0x01").is_none());
        assert!(coordinator.close_match(&game.id).is_none());
    }

    #[test]
    fn match_serialization_hides_addresses() {
        let mut coordinator = GameCoordinator::new(EXPIRY_MS);
        let json = serde_json::to_value(started(&mut coordinator)).unwrap();
        assert!(json.get("challenger_address").is_none());
        assert_eq!(json["board"]["next_turn"], "X");
    }
}
