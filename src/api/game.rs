use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    models::{ApiResponse, GameRequest, GameRequestView, Mark},
    services::{lobby::schedule_match_close, match_engine::MatchStatus, Match},
};

use super::{wallet_address, AppState};

#[derive(Debug, Deserialize)]
pub struct PlaceMarkRequest {
    pub cell: usize,
}

#[derive(Debug, Serialize)]
pub struct RequestListResponse {
    pub requests: Vec<GameRequestView>,
    pub has_pending_request: bool,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    #[serde(rename = "match")]
    pub game: Match,
    pub your_mark: Option<Mark>,
    pub your_turn: bool,
}

impl MatchResponse {
    fn new(game: Match, address: &str) -> Self {
        let your_mark = game.mark_of(address);
        let your_turn = game.status() == MatchStatus::InProgress
            && your_mark == Some(game.board.next_turn());
        Self {
            game,
            your_mark,
            your_turn,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlaceMarkResponse {
    pub placed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "match")]
    pub game: Option<MatchResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wins: Option<u32>,
}

/// GET /api/v1/game/requests
pub async fn list_requests(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<RequestListResponse>>> {
    let address = wallet_address(&headers)?;
    let lobby = state.lobby.lock().await;
    let requests = lobby.open_requests(&address).await?;
    let has_pending_request = lobby.has_pending_request(&address).await?;
    Ok(Json(ApiResponse::success(RequestListResponse {
        requests,
        has_pending_request,
    })))
}

/// POST /api/v1/game/requests
pub async fn create_request(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<GameRequest>>> {
    let address = wallet_address(&headers)?;
    let request = state.lobby.lock().await.request_match(&address).await?;
    Ok(Json(ApiResponse::success(request)))
}

/// POST /api/v1/game/requests/{id}/accept
pub async fn accept_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
) -> Result<Json<ApiResponse<MatchResponse>>> {
    let address = wallet_address(&headers)?;
    let game = state
        .lobby
        .lock()
        .await
        .accept_request(&address, &request_id)
        .await?;
    Ok(Json(ApiResponse::success(MatchResponse::new(game, &address))))
}

/// GET /api/v1/game/match
pub async fn get_match(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Option<MatchResponse>>>> {
    let address = wallet_address(&headers)?;
    let game = state.lobby.lock().await.active_match(&address).await?;
    Ok(Json(ApiResponse::success(
        game.map(|game| MatchResponse::new(game, &address)),
    )))
}

/// POST /api/v1/game/match/place
///
/// A finished match closes itself after the configured delay.
pub async fn place_mark(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PlaceMarkRequest>,
) -> Result<Json<ApiResponse<PlaceMarkResponse>>> {
    let address = wallet_address(&headers)?;
    let result = state.lobby.lock().await.place_mark(&address, req.cell).await?;

    if result.is_terminal() {
        if let Some(game) = result.game.as_ref() {
            schedule_match_close(
                state.lobby.clone(),
                game.id.clone(),
                state.config.match_close_delay(),
            );
        }
    }

    let wins = result
        .credited
        .as_ref()
        .filter(|record| record.identity.wallet_address == address)
        .map(|record| record.identity.wins);

    Ok(Json(ApiResponse::success(PlaceMarkResponse {
        placed: result.game.is_some(),
        game: result.game.map(|game| MatchResponse::new(game, &address)),
        wins,
    })))
}

/// POST /api/v1/game/match/close
pub async fn close_match(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<bool>>> {
    let address = wallet_address(&headers)?;
    let closed = state
        .lobby
        .lock()
        .await
        .close_active_match(&address)
        .await?;
    Ok(Json(ApiResponse::success(closed.is_some())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Identity, services::game_coordinator::GameCoordinator};

    fn identity(anon_number: u64) -> Identity {
        Identity {
            wallet_address: format!("0x{anon_number}"),
            anon_number,
            wins: 0,
            nickname: None,
        }
    }

    fn started() -> (GameCoordinator, Match) {
        let mut coordinator = GameCoordinator::new(300_000);
        let request = coordinator.request_match(&identity(0), 0).unwrap();
        let game = coordinator.accept_request(&request.id, &identity(1), 1).unwrap();
        (coordinator, game)
    }

    #[test]
    fn challenger_moves_first() {
        let (_, game) = started();
        let challenger = MatchResponse::new(game.clone(), "0x0");
        assert_eq!(challenger.your_mark, Some(Mark::X));
        assert!(challenger.your_turn);

        let opponent = MatchResponse::new(game, "0x1");
        assert_eq!(opponent.your_mark, Some(Mark::O));
        assert!(!opponent.your_turn);
    }

    #[test]
    fn response_uses_match_key() {
        let (mut coordinator, _) = started();
        let game = coordinator.place_mark("0x0", 4).unwrap().unwrap();
        let json = serde_json::to_value(MatchResponse::new(game, "0x1")).unwrap();
        assert_eq!(json["match"]["challenger"], "anon0");
        assert_eq!(json["your_turn"], true);
    }
}
