//! Flow catalog and invocation endpoints

use axum::extract::{Path, State};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::{ApiEnvelope, ApiError, Json};
use crate::domain::FlowSummary;

/// GET /v1/flows
pub async fn list_flows(State(state): State<AppState>) -> ApiEnvelope<Vec<FlowSummary>> {
    ApiEnvelope::ok(state.flow_service.list())
}

/// GET /v1/flows/{flow}
pub async fn get_flow(
    State(state): State<AppState>,
    Path(flow): Path<String>,
) -> Result<ApiEnvelope<FlowSummary>, ApiError> {
    let definition = state.flow_service.get(&flow)?;

    Ok(ApiEnvelope::ok(definition.summary()))
}

/// POST /v1/flows/{flow}
///
/// The body is the raw flow input.
pub async fn invoke_flow(
    State(state): State<AppState>,
    Path(flow): Path<String>,
    Json(input): Json<Value>,
) -> Result<ApiEnvelope<Value>, ApiError> {
    debug!(flow = %flow, "Invoking flow over HTTP");

    let output = state
        .flow_service
        .invoke(&flow, input)
        .await
        .inspect_err(|e| {
            warn!(flow = %flow, code = e.code(), error = %e, "Flow invocation failed");
        })?;

    Ok(ApiEnvelope::ok(output))
}
