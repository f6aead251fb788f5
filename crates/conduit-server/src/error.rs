//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use conduit_metrics::MetricsError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The routing layer did not supply a usable organization id.
    #[error("missing or invalid x-organization-id header")]
    MissingOrganization,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::MissingOrganization => StatusCode::UNAUTHORIZED,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Metrics(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::StoreError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServerError::MissingOrganization.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServerError::InvalidRequest("days".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        let store = MetricsError::from(StoreError::Unavailable("down".into()));
        assert_eq!(
            ServerError::from(store).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
