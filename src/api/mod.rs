//! API handlers for Radiopool REST endpoints

pub mod auth;
pub mod devices;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod stats;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::{error::AppError, models::admin::Principal, services};

/// Operations reachable without a session. This explicit allow-list is the
/// only exemption mechanism; everything else behind the gate requires a
/// verified admin session.
pub const PUBLIC_OPERATIONS: &[&str] = &[
    "/health",
    "/ready",
    "/auth/login",
    "/auth/oidc/login",
    "/auth/oidc/callback",
];

/// Whether an operation path is on the public allow-list
pub fn is_public(path: &str) -> bool {
    PUBLIC_OPERATIONS.contains(&path)
}

/// Session gate applied to the whole API router.
///
/// Consults the allow-list, authorizes everything else against the session
/// store, and forwards the verified principal as a request extension.
pub async fn session_gate(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let principal = services::session::authorize(&session).await?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Extractor for the authenticated admin placed by the session gate
pub struct CurrentAdmin(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentAdmin)
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::is_public;

    #[test]
    fn login_and_provider_endpoints_are_public() {
        assert!(is_public("/auth/login"));
        assert!(is_public("/auth/oidc/login"));
        assert!(is_public("/auth/oidc/callback"));
        assert!(is_public("/health"));
    }

    #[test]
    fn everything_else_is_gated() {
        assert!(!is_public("/devices"));
        assert!(!is_public("/auth/logout"));
        assert!(!is_public("/auth/session"));
        assert!(!is_public("/stats/dashboard"));
        assert!(!is_public("/auth/login/"));
    }
}
