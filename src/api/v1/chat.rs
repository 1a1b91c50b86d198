//! Stateless chat endpoint
//!
//! The client holds the transcript and sends it with every turn; the server
//! rebuilds a session, runs one turn and returns the grown transcript.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::{Json, flow_error_status};
use crate::domain::{ConversationSession, ConversationTurn};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    pub query: String,
    #[serde(default)]
    pub product_details: Option<String>,
    #[serde(default)]
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatTurnData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub turns: Vec<ConversationTurn>,
}

/// Transcript is present on both success and failure
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurnResponse {
    pub success: bool,
    pub data: ChatTurnData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// POST /v1/chat/turns
pub async fn send_turn(
    State(state): State<AppState>,
    Json(request): Json<ChatTurnRequest>,
) -> Response {
    let mut session = ConversationSession::from_turns(request.turns);

    let result = state
        .chat_service
        .send(&mut session, &request.query, request.product_details.as_deref())
        .await;

    let turns = session.into_turns();

    match result {
        Ok(output) => Json(ChatTurnResponse {
            success: true,
            data: ChatTurnData {
                response: Some(output.response),
                turns,
            },
            error: None,
            code: None,
        })
        .into_response(),
        Err(e) => {
            let status = flow_error_status(&e);
            let body = ChatTurnResponse {
                success: false,
                data: ChatTurnData {
                    response: None,
                    turns,
                },
                error: Some(e.user_message()),
                code: Some(e.code().to_string()),
            };

            (status, Json(body)).into_response()
        }
    }
}
