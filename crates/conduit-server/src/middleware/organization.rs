use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use uuid::Uuid;

use crate::error::ServerError;

/// Header carrying the caller's organization, set by the trusted routing
/// layer in front of this service.
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Verified calling organization, inserted as a request extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrganizationId(pub Uuid);

/// Reject requests without a well-formed organization header.
///
/// Tenant-scoped handlers read the id from the extension only; nothing
/// downstream trusts an organization id taken from the body or path.
pub async fn require_organization(mut req: Request, next: Next) -> Result<Response, ServerError> {
    let organization_id = extract_organization(req.headers()).ok_or_else(|| {
        tracing::warn!(path = %req.uri().path(), "Request without organization id");
        ServerError::MissingOrganization
    })?;

    req.extensions_mut().insert(OrganizationId(organization_id));
    Ok(next.run(req).await)
}

fn extract_organization(headers: &HeaderMap) -> Option<Uuid> {
    let raw = headers.get(ORGANIZATION_HEADER)?.to_str().ok()?.trim();
    Uuid::parse_str(raw).ok()
}
