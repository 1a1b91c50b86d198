//! v1 API endpoints

pub mod chat;
pub mod flows;

use axum::{
    Router,
    routing::{get, post},
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/flows", get(flows::list_flows))
        .route(
            "/flows/{flow}",
            get(flows::get_flow).post(flows::invoke_flow),
        )
        .route("/chat/turns", post(chat::send_turn))
}
