use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use conduit_core::{CallRequest, CallResult};
use conduit_runtime::HealthReport;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::middleware::OrganizationId;
use crate::state::AppState;

/// Response body for a dispatch that ran.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteResponse {
    #[serde(flatten)]
    result: CallResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    audit_warning: Option<String>,
}

/// `POST /api/execute/{instanceId}`
///
/// Dispatched calls answer 200 whatever the upstream status; the upstream
/// status travels in the body. Rejections use their own status.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Extension(OrganizationId(organization_id)): Extension<OrganizationId>,
    Path(instance_id): Path<Uuid>,
    Json(request): Json<CallRequest>,
) -> Response {
    match state
        .dispatcher
        .execute(organization_id, instance_id, &request)
        .await
    {
        Ok(dispatched) => Json(ExecuteResponse {
            result: dispatched.result,
            audit_warning: dispatched.audit_warning,
        })
        .into_response(),
        Err(rejected) => {
            let status = StatusCode::from_u16(rejected.error.status_code())
                .unwrap_or(StatusCode::BAD_REQUEST);
            let mut body = json!({ "error": rejected.error.to_string() });
            if let Some(warning) = rejected.audit_warning {
                body["auditWarning"] = json!(warning);
            }
            (status, Json(body)).into_response()
        }
    }
}

/// `GET /api/execute/health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(state.dispatcher.health())
}
