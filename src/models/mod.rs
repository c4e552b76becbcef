// src/models/mod.rs
pub mod chat;
pub mod game;
pub mod identity;

use serde::Serialize;

pub use chat::{Message, Payload};
pub use game::{GameRequest, GameRequestView, Mark};
pub use identity::{Identity, IdentityResponse, WalletKind};

// ==================== API RESPONSE ====================
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success_sets_flag() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, "ok");
    }
}
